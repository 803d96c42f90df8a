use std::{
    any::type_name,
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    dependency_graph::DependencyGraph,
    errors::{RequireError, ShutdownError},
    lifecycle::ManagedInstance,
    token::InjectionToken,
    types::{Injectable, Instance},
};

/// Container holding all initiated instances
#[derive(Clone)]
pub struct DiContainer(pub Arc<DiContainerInner>);
pub struct DiContainerInner {
    instances: HashMap<InjectionToken, Instance>,
    graph: DependencyGraph,
    /// Managed instances in init order, emptied by shutdown
    managed: Mutex<Vec<ManagedInstance>>,
}
impl Debug for DiContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("DiContainer");
        for (token, instance) in &self.0.instances {
            map.field(token.description(), &instance.info.type_name);
        }
        map.finish()
    }
}

impl DiContainer {
    pub(crate) fn new(
        instances: HashMap<InjectionToken, Instance>,
        graph: DependencyGraph,
        managed: Vec<ManagedInstance>,
    ) -> Self {
        Self(Arc::new(DiContainerInner {
            instances,
            graph,
            managed: Mutex::new(managed),
        }))
    }

    /// Attempts to get the value registered for the token
    pub fn require<T: Injectable>(&self, token: &InjectionToken) -> Result<Arc<T>, RequireError> {
        let instance = self
            .0
            .instances
            .get(token)
            .ok_or(RequireError::TokenMissing(*token))?;

        instance
            .downcast()
            .map_err(|actual_type| RequireError::DowncastFailed {
                token: *token,
                required_type: type_name::<T>(),
                actual_type,
            })
    }

    /// Attempts to get the value registered under the type token of `T`
    pub fn require_type<T: Injectable>(&self) -> Result<Arc<T>, RequireError> {
        self.require(&InjectionToken::of::<T>())
    }

    pub fn contains(&self, token: &InjectionToken) -> bool {
        self.0.instances.contains_key(token)
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.0.graph
    }

    /// Runs the destroy hooks of all managed instances in reverse init order
    ///
    /// Every hook is run even if an earlier one fails. Calling shutdown again is a no-op.
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        let managed = self.take_managed();
        tracing::debug!("Shutting down container, {} managed instances", managed.len());

        let mut failures = Vec::new();
        for instance in managed.iter().rev() {
            tracing::debug!("Running destroy hook of '{}'", instance.token);
            if let Err(error) = instance.destroy().await {
                tracing::error!("Destroy hook of '{}' failed: {error}", instance.token);
                failures.push((instance.token, error));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShutdownError { failures })
        }
    }

    fn take_managed(&self) -> Vec<ManagedInstance> {
        let mut managed = self
            .0
            .managed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *managed)
    }
}
