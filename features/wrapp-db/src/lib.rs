//! Lifecycle management for an injected database client.
//!
//! The crate does not talk to a database itself. The application brings a client
//! implementing [`ClientLike`] and a factory for it, this crate:
//! 1. registers the factory's options and a [`ClientService`] in a [`wrapp_di`] container
//! 2. creates the client when the container runs its init hooks
//! 3. disconnects it when the container shuts down
//!
//! ```ignore
//! let container = DiBuilder::new()
//!     .add_value(DATABASE_URL, "postgres://localhost/app".to_string())
//!     .import(ClientModule::<PgClient>::register_async(
//!         AsyncClientOptions::from_factory(|deps| async move {
//!             let url = deps.get::<String>(0)?;
//!             Ok::<_, InjectError>(ClientOptions::new(move || Arc::new(PgClient::lazy(&url))))
//!         })
//!         .inject([DATABASE_URL]),
//!     ))
//!     .build()
//!     .await?;
//!
//! let service = container.require_type::<ClientService<PgClient>>()?;
//! service.client()?.query_raw(RawQuery::new("SELECT 1")).await?;
//!
//! container.shutdown().await?;
//! ```

pub mod client;
pub mod error;
pub mod module;
pub mod options;
pub mod service;

pub use client::{
    ClientEvent, ClientEventKind, ClientLike, Disconnect, EventListener, Extended, IsolationLevel,
    Middleware, MiddlewareParams, QueryValue, RawQuery, TransactionOptions,
};
pub use error::ClientError;
pub use module::ClientModule;
pub use options::{AsyncClientOptions, ClientOptions, CLIENT_OPTIONS};
pub use service::{ClientService, NOT_INITIALIZED};
