use std::{
    any::type_name,
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use wrapp_di::{DynError, Lifecycle};

use crate::{client::Disconnect, error::ClientError, options::ClientOptions};

/// Message of the error returned when the client is accessed before `initialize`
pub const NOT_INITIALIZED: &str = "Database client is not initialized";

/// Holds at most one client between `initialize` and `disconnect`
///
/// Consumers should call [ClientService::client] whenever they need the client
/// instead of keeping it, it is replaced after a disconnect and re-initialisation.
pub struct ClientService<C> {
    options: Arc<ClientOptions<C>>,
    client: Mutex<Option<Arc<C>>>,
}

impl<C: Disconnect> ClientService<C> {
    pub fn new(options: Arc<ClientOptions<C>>) -> Self {
        ClientService {
            options,
            client: Mutex::new(None),
        }
    }

    /// Creates the client unless one exists already
    ///
    /// A failing factory leaves the service uninitialised. The check and the
    /// store are separate steps: callers racing on an uninitialised service
    /// from several threads may each run the factory, the last store wins.
    pub async fn initialize(&self) -> Result<(), DynError> {
        if self.is_initialized() {
            tracing::trace!("Client {} is already initialized", type_name::<C>());
            return Ok(());
        }

        let client = self.options.create_client()?;
        *self.slot() = Some(client);

        tracing::debug!("Client {} initialized", type_name::<C>());
        Ok(())
    }

    /// The live client
    ///
    /// Fails with [NOT_INITIALIZED] before `initialize` and after `disconnect`.
    pub fn client(&self) -> Result<Arc<C>, ClientError> {
        self.current()
            .ok_or_else(|| ClientError::new(NOT_INITIALIZED))
    }


    /// Disconnects and drops the client, a no-op if there is none
    ///
    /// If the client fails to disconnect the error is returned as is and the
    /// client is kept, so the disconnect can be retried.
    pub async fn disconnect(&self) -> Result<(), C::Error> {
        let Some(client) = self.current() else {
            tracing::trace!("Client {} is not initialized, nothing to disconnect", type_name::<C>());
            return Ok(());
        };

        client.disconnect().await?;
        *self.slot() = None;

        tracing::debug!("Client {} disconnected", type_name::<C>());
        Ok(())
    }

    /// End of life hook, same outcome as [ClientService::disconnect]
    pub async fn teardown(&self) -> Result<(), C::Error> {
        self.disconnect().await
    }

}

impl<C> ClientService<C> {
    pub fn is_initialized(&self) -> bool {
        self.slot().is_some()
    }

    fn current(&self) -> Option<Arc<C>> {
        self.slot().clone()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<C>>> {
        self.client.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Disconnect> Lifecycle for ClientService<C> {
    async fn on_init(&self) -> Result<(), DynError> {
        self.initialize().await
    }

    async fn on_destroy(&self) -> Result<(), DynError> {
        Ok(self.teardown().await?)
    }
}

impl<C> Debug for ClientService<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientService")
            .field("client", &type_name::<C>())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
