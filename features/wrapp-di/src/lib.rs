//! Token keyed dependency injection for async Rust.
//!
//! Providers are registered on a [`DiBuilder`], either directly or grouped into
//! [`ModuleDescriptor`]s. Building the container:
//! 1. validates the dependency graph (duplicates, missing and circular dependencies)
//! 2. runs all factories concurrently, each one receiving the values of its `inject` list
//! 3. runs the [`Lifecycle::on_init`] hook of every managed provider
//!
//! [`DiContainer::shutdown`] runs the [`Lifecycle::on_destroy`] hooks in reverse order.
//!
//! ```no_run
//! use wrapp_di::{DiBuilder, InjectionToken, Provider};
//!
//! const GREETING: InjectionToken = InjectionToken::named("GREETING");
//!
//! # futures::executor::block_on(async {
//! let container = DiBuilder::new()
//!     .add_value(InjectionToken::named("NAME"), "wrapp".to_string())
//!     .add_provider(Provider::factory(
//!         GREETING,
//!         vec![InjectionToken::named("NAME").into()],
//!         |deps| async move { Ok::<_, wrapp_di::InjectError>(format!("hello {}", deps.get::<String>(0)?)) },
//!     ))
//!     .build()
//!     .await
//!     .unwrap();
//!
//! assert_eq!(*container.require::<String>(&GREETING).unwrap(), "hello wrapp");
//! container.shutdown().await.unwrap();
//! # });
//! ```

pub mod builder;
pub mod container;
pub mod dependency_graph;
pub mod errors;
pub mod factories;
mod initiator;
pub mod lifecycle;
pub mod module;
pub mod provider;
pub mod token;
pub mod types;

pub use builder::DiBuilder;
pub use container::DiContainer;
pub use dependency_graph::{DependencyGraph, DependencyGraphError, DependencyGraphErrors};
pub use errors::{InitError, InjectError, RequireError, ShutdownError};
pub use factories::{Dependency, ResolvedDependencies};
pub use lifecycle::Lifecycle;
pub use module::ModuleDescriptor;
pub use provider::Provider;
pub use token::InjectionToken;
pub use types::{DynError, Injectable, Instance, TypeInfo};
