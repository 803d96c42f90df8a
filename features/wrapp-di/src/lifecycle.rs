use std::{any::type_name, future::Future};

use futures::{future::BoxFuture, FutureExt};

use crate::{
    errors::RequireError,
    token::InjectionToken,
    types::{DynError, Injectable, Instance},
};

/// Hooks the container runs on managed instances
///
/// `on_init` runs once every provider is constructed, in construction order.
/// `on_destroy` runs on [`crate::DiContainer::shutdown`], in reverse order.
pub trait Lifecycle: Injectable {
    fn on_init(&self) -> impl Future<Output = Result<(), DynError>> + Send {
        async { Ok(()) }
    }

    fn on_destroy(&self) -> impl Future<Output = Result<(), DynError>> + Send {
        async { Ok(()) }
    }
}

type HookFn = fn(InjectionToken, Instance) -> BoxFuture<'static, Result<(), DynError>>;

/// Type erased hooks of a managed provider
#[derive(Clone, Copy)]
pub(crate) struct Hooks {
    pub on_init: HookFn,
    pub on_destroy: HookFn,
}
impl Hooks {
    pub(crate) fn of<T: Lifecycle>() -> Self {
        Hooks {
            on_init: run_init::<T>,
            on_destroy: run_destroy::<T>,
        }
    }
}

fn run_init<T: Lifecycle>(
    token: InjectionToken,
    instance: Instance,
) -> BoxFuture<'static, Result<(), DynError>> {
    async move {
        let managed = downcast_managed::<T>(token, &instance)?;
        managed.on_init().await
    }
    .boxed()
}

fn run_destroy<T: Lifecycle>(
    token: InjectionToken,
    instance: Instance,
) -> BoxFuture<'static, Result<(), DynError>> {
    async move {
        let managed = downcast_managed::<T>(token, &instance)?;
        managed.on_destroy().await
    }
    .boxed()
}

fn downcast_managed<T: Lifecycle>(
    token: InjectionToken,
    instance: &Instance,
) -> Result<std::sync::Arc<T>, DynError> {
    instance.downcast::<T>().map_err(|actual_type| {
        RequireError::DowncastFailed {
            token,
            required_type: type_name::<T>(),
            actual_type,
        }
        .into()
    })
}

/// A managed instance together with its hooks
#[derive(Clone)]
pub(crate) struct ManagedInstance {
    pub token: InjectionToken,
    pub hooks: Hooks,
    pub instance: Instance,
}
impl ManagedInstance {
    pub(crate) async fn init(&self) -> Result<(), DynError> {
        (self.hooks.on_init)(self.token, self.instance.clone()).await
    }

    pub(crate) async fn destroy(&self) -> Result<(), DynError> {
        (self.hooks.on_destroy)(self.token, self.instance.clone()).await
    }
}
