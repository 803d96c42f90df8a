use std::{collections::HashSet, time::Duration};

use crate::{
    container::DiContainer,
    dependency_graph::DependencyGraphError,
    errors::InitError,
    initiator::DiInitiator,
    module::ModuleDescriptor,
    provider::Provider,
    token::InjectionToken,
    types::Injectable,
};

/// Collects providers and modules, then initiates them into a [DiContainer]
pub struct DiBuilder {
    /// Registered providers, in registration order
    pub(crate) providers: Vec<Provider>,
    /// Issues found while registering modules
    pub(crate) issues: Vec<DependencyGraphError>,
}
impl Default for DiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DiBuilder {
    pub fn new() -> Self {
        DiBuilder {
            providers: Vec::new(),
            issues: Vec::new(),
        }
    }
}
impl DiBuilder {
    pub fn add_value<T: Injectable>(self, token: InjectionToken, value: T) -> Self {
        self.add_provider(Provider::value(token, value))
    }

    pub fn add_provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Registers a module, its imports are registered first
    pub fn import(mut self, module: ModuleDescriptor) -> Self {
        self.register_module(module);
        self
    }

    /// Returns the tokens the module makes visible to its importer
    fn register_module(&mut self, module: ModuleDescriptor) -> Vec<InjectionToken> {
        let ModuleDescriptor {
            name,
            global,
            imports,
            providers,
            exports,
        } = module;

        let mut visible: HashSet<InjectionToken> =
            providers.iter().map(Provider::token).collect();
        for import in imports {
            visible.extend(self.register_module(import));
        }

        for token in &exports {
            if !visible.contains(token) {
                self.issues.push(DependencyGraphError::UnknownExport {
                    module: name,
                    token: *token,
                });
            }
        }

        tracing::debug!(
            "Registered {}module '{name}' with {} providers and {} exports",
            if global { "global " } else { "" },
            providers.len(),
            exports.len()
        );
        self.providers.extend(providers);

        exports
    }

    pub async fn build(self) -> Result<DiContainer, InitError> {
        DiInitiator::new().initiate(self, None).await
    }

    pub async fn build_timeout(self, timeout: Duration) -> Result<DiContainer, InitError> {
        DiInitiator::new().initiate(self, Some(timeout)).await
    }
}
