use std::marker::PhantomData;

use wrapp_di::{Dependency, InjectError, InjectionToken, ModuleDescriptor, Provider};

use crate::{
    client::ClientLike,
    options::{AsyncClientOptions, ClientOptions, CLIENT_OPTIONS},
    service::ClientService,
};

/// Registers a [ClientService] for client type `C` in the container
pub struct ClientModule<C>(PhantomData<fn() -> C>);

impl<C: ClientLike> ClientModule<C> {
    pub const NAME: &'static str = "ClientModule";

    /// Token under which the [ClientService] is exported
    pub fn service_token() -> InjectionToken {
        InjectionToken::of::<ClientService<C>>()
    }

    /// Builds a global module providing the resolved [ClientOptions] and the
    /// [ClientService] built from them. Only the service is exported.
    pub fn register_async(options: AsyncClientOptions<C>) -> ModuleDescriptor {
        let AsyncClientOptions {
            use_factory,
            inject,
            imports,
        } = options;

        let options_provider =
            Provider::factory(*CLIENT_OPTIONS, inject.unwrap_or_default(), use_factory);
        let service_provider = Provider::managed(
            Self::service_token(),
            vec![Dependency::required(*CLIENT_OPTIONS)],
            |dependencies| async move {
                let options = dependencies.get::<ClientOptions<C>>(0)?;
                Ok::<_, InjectError>(ClientService::new(options))
            },
        );

        ModuleDescriptor::new(Self::NAME)
            .global()
            .with_imports(imports.unwrap_or_default())
            .with_providers([options_provider, service_provider])
            .with_exports([Self::service_token()])
    }
}
