use std::{fmt::Debug, future::Future};

use crate::{
    factories::{Dependency, DynFactory, ResolvedDependencies},
    lifecycle::{Hooks, Lifecycle},
    token::InjectionToken,
    types::{DynError, Injectable, Instance, TypeInfo},
};

/// Registration of one value in the container
pub struct Provider {
    pub(crate) token: InjectionToken,
    pub(crate) provides: TypeInfo,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) source: ProviderSource,
    pub(crate) hooks: Option<Hooks>,
}

pub(crate) enum ProviderSource {
    Value(Instance),
    Factory(Box<dyn DynFactory>),
}

impl Provider {
    /// Provides an already constructed value
    pub fn value<T: Injectable>(token: InjectionToken, value: T) -> Self {
        Provider {
            token,
            provides: TypeInfo::of::<T>(),
            dependencies: Vec::new(),
            source: ProviderSource::Value(Instance::new(value)),
            hooks: None,
        }
    }

    /// Provides the value returned by an async factory
    ///
    /// The factory receives the values of `inject` in the declared order.
    pub fn factory<T, F, Fut, E>(token: InjectionToken, inject: Vec<Dependency>, factory: F) -> Self
    where
        T: Injectable,
        F: FnOnce(ResolvedDependencies) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<DynError>,
    {
        Provider {
            token,
            provides: TypeInfo::of::<T>(),
            dependencies: inject,
            source: ProviderSource::Factory(Box::new(factory)),
            hooks: None,
        }
    }

    /// Same as [`Provider::factory`], the container additionally runs the [`Lifecycle`] hooks of the value
    pub fn managed<T, F, Fut, E>(token: InjectionToken, inject: Vec<Dependency>, factory: F) -> Self
    where
        T: Lifecycle,
        F: FnOnce(ResolvedDependencies) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<DynError>,
    {
        Provider {
            hooks: Some(Hooks::of::<T>()),
            ..Provider::factory(token, inject, factory)
        }
    }

    pub fn token(&self) -> InjectionToken {
        self.token
    }

    /// The `inject` list of the provider, empty for values
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Name of the provided type
    pub fn provides(&self) -> &'static str {
        self.provides.type_name
    }

    pub fn is_managed(&self) -> bool {
        self.hooks.is_some()
    }
}

impl Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.source {
            ProviderSource::Value(_) => "value",
            ProviderSource::Factory(_) => "factory",
        };
        f.debug_struct("Provider")
            .field("token", &self.token)
            .field("provides", &self.provides.type_name)
            .field("kind", &kind)
            .field("dependencies", &self.dependencies)
            .field("managed", &self.is_managed())
            .finish()
    }
}
