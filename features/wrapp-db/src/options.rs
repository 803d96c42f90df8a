use std::{
    fmt::Debug,
    future::Future,
    sync::{Arc, LazyLock},
};

use futures::{future::BoxFuture, FutureExt};
use wrapp_di::{Dependency, DynError, InjectionToken, ModuleDescriptor, ResolvedDependencies};

use crate::client::Disconnect;

/// Token of the [ClientOptions] provider
///
/// A symbol, so it can never collide with a token registered by the application.
pub static CLIENT_OPTIONS: LazyLock<InjectionToken> =
    LazyLock::new(|| InjectionToken::symbol("CLIENT_OPTIONS"));

type ClientFactory<C> = Box<dyn Fn() -> Result<Arc<C>, DynError> + Send + Sync>;

/// How the lifecycle service obtains its client
pub struct ClientOptions<C> {
    client_factory: ClientFactory<C>,
}

impl<C: Disconnect> ClientOptions<C> {
    pub fn new<F>(client_factory: F) -> Self
    where
        F: Fn() -> Arc<C> + Send + Sync + 'static,
    {
        ClientOptions {
            client_factory: Box::new(move || Ok::<_, DynError>(client_factory())),
        }
    }

    /// Options whose factory may fail, the error is handed to the caller of `initialize`
    pub fn try_new<F, E>(client_factory: F) -> Self
    where
        F: Fn() -> Result<Arc<C>, E> + Send + Sync + 'static,
        E: Into<DynError>,
    {
        ClientOptions {
            client_factory: Box::new(move || client_factory().map_err(Into::<DynError>::into)),
        }
    }

    pub fn create_client(&self) -> Result<Arc<C>, DynError> {
        (self.client_factory)()
    }
}

impl<C> Debug for ClientOptions<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("client", &std::any::type_name::<C>())
            .finish_non_exhaustive()
    }
}

type OptionsFactory<C> = Box<
    dyn FnOnce(ResolvedDependencies) -> BoxFuture<'static, Result<ClientOptions<C>, DynError>>
        + Send,
>;

/// Options resolved by the container when the module is registered
pub struct AsyncClientOptions<C> {
    pub(crate) use_factory: OptionsFactory<C>,
    pub(crate) inject: Option<Vec<Dependency>>,
    pub(crate) imports: Option<Vec<ModuleDescriptor>>,
}

impl<C: Disconnect> AsyncClientOptions<C> {
    /// `use_factory` receives the values of [AsyncClientOptions::inject] in the declared order
    pub fn from_factory<F, Fut, E>(use_factory: F) -> Self
    where
        F: FnOnce(ResolvedDependencies) -> Fut + Send + 'static,
        Fut: Future<Output = Result<ClientOptions<C>, E>> + Send + 'static,
        E: Into<DynError>,
    {
        AsyncClientOptions {
            use_factory: Box::new(move |dependencies| {
                let options = use_factory(dependencies);
                async move { options.await.map_err(Into::<DynError>::into) }.boxed()
            }),
            inject: None,
            imports: None,
        }
    }

    pub fn from_sync_factory<F, E>(use_factory: F) -> Self
    where
        F: FnOnce(ResolvedDependencies) -> Result<ClientOptions<C>, E> + Send + 'static,
        E: Into<DynError> + Send + 'static,
    {
        Self::from_factory(move |dependencies| futures::future::ready(use_factory(dependencies)))
    }

    pub fn inject(mut self, inject: impl IntoIterator<Item = impl Into<Dependency>>) -> Self {
        self.inject = Some(inject.into_iter().map(Into::into).collect());
        self
    }

    /// Modules to register alongside, e.g. the ones providing the injected values
    pub fn imports(mut self, imports: impl IntoIterator<Item = ModuleDescriptor>) -> Self {
        self.imports = Some(imports.into_iter().collect());
        self
    }
}
