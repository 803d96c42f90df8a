use std::{any::type_name, future::Future, sync::Arc};

use futures::{future::BoxFuture, FutureExt};

use crate::{
    errors::{InjectError, RequireError},
    token::InjectionToken,
    types::{DynError, Injectable, Instance},
};

/// A dependency a factory declares in its `inject` list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub token: InjectionToken,
    /// Optional dependencies resolve to `None` when nothing is registered for them
    pub optional: bool,
}
impl Dependency {
    pub fn required(token: InjectionToken) -> Self {
        Dependency {
            token,
            optional: false,
        }
    }

    pub fn optional(token: InjectionToken) -> Self {
        Dependency {
            token,
            optional: true,
        }
    }
}
impl From<InjectionToken> for Dependency {
    fn from(token: InjectionToken) -> Self {
        Dependency::required(token)
    }
}

/// Values resolved for a factory, in the order of its `inject` list
pub struct ResolvedDependencies {
    entries: Vec<(Dependency, Option<Instance>)>,
}
impl ResolvedDependencies {
    pub(crate) fn new(entries: Vec<(Dependency, Option<Instance>)>) -> Self {
        ResolvedDependencies { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the dependency at `index`
    ///
    /// Fails if the value is absent or is not a `T`
    pub fn get<T: Injectable>(&self, index: usize) -> Result<Arc<T>, InjectError> {
        match self.entry(index)? {
            (dependency, Some(instance)) => downcast(dependency.token, instance),
            (dependency, None) => Err(RequireError::TokenMissing(dependency.token).into()),
        }
    }

    /// Returns the dependency at `index`, `None` if an optional dependency was not registered
    pub fn get_optional<T: Injectable>(&self, index: usize) -> Result<Option<Arc<T>>, InjectError> {
        match self.entry(index)? {
            (dependency, Some(instance)) => downcast(dependency.token, instance).map(Some),
            (_, None) => Ok(None),
        }
    }

    fn entry(&self, index: usize) -> Result<&(Dependency, Option<Instance>), InjectError> {
        self.entries.get(index).ok_or(InjectError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }
}

fn downcast<T: Injectable>(token: InjectionToken, instance: &Instance) -> Result<Arc<T>, InjectError> {
    instance.downcast::<T>().map_err(|actual_type| {
        RequireError::DowncastFailed {
            token,
            required_type: type_name::<T>(),
            actual_type,
        }
        .into()
    })
}

/// Wrapper Trait for factories, providing instances of Any
pub(crate) trait DynFactory: Send {
    /// Constructs the instance from the already resolved dependencies
    fn construct(
        self: Box<Self>,
        dependencies: ResolvedDependencies,
    ) -> BoxFuture<'static, Result<Instance, DynError>>;
}
// Impl DynFactory for any async factory function
impl<F, Fut, T, E> DynFactory for F
where
    F: FnOnce(ResolvedDependencies) -> Fut + Send,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Injectable,
    E: Into<DynError>,
{
    fn construct(
        self: Box<Self>,
        dependencies: ResolvedDependencies,
    ) -> BoxFuture<'static, Result<Instance, DynError>> {
        let construction_fut = (*self)(dependencies);

        async move {
            construction_fut
                .await
                .map(Instance::new)
                .map_err(Into::<DynError>::into)
        }
        .boxed()
    }
}
