use std::sync::Arc;

use futures_channel::{mpsc, oneshot};
use thiserror::Error;

use crate::{dependency_graph::DependencyGraphErrors, token::InjectionToken, types::DynError};

#[derive(Error, Debug)]
pub enum InjectError {
    /// Could not require the token
    #[error(transparent)]
    RequireError(#[from] RequireError),
    /// Injection Handle channel was closed
    #[error("Handle was closed, did you try using it after Initialization?")]
    HandleClosed,
    /// A factory asked for a dependency it did not declare
    #[error("Dependency #{index} was requested, but only {len} were declared")]
    IndexOutOfRange { index: usize, len: usize },
}
impl From<mpsc::SendError> for InjectError {
    fn from(_: mpsc::SendError) -> Self {
        Self::HandleClosed
    }
}
impl From<oneshot::Canceled> for InjectError {
    fn from(_: oneshot::Canceled) -> Self {
        Self::HandleClosed
    }
}

/// Errors when trying to require a certain token
#[derive(thiserror::Error, Debug, Clone)]
pub enum RequireError {
    /// Nothing is registered for the token
    #[error("No provider is registered for '{0}'")]
    TokenMissing(InjectionToken),
    /// Di container failed to initiate
    #[error(transparent)]
    InitError(#[from] InitError),

    #[error("Failed to downcast '{token}', required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        token: InjectionToken,
        required_type: &'static str,
        actual_type: &'static str,
    },
}

/// Errors while Initiating the container
#[derive(thiserror::Error, Debug, Clone)]
pub enum InitError {
    /// There are issues with the dependency graph
    #[error(transparent)]
    DependencyGraphError(#[from] DependencyGraphErrors),

    /// A Factory failed to build
    #[error("Factory for '{token}' failed - error: {error}")]
    FactoryFailed {
        token: InjectionToken,
        error: Arc<DynError>,
    },
    /// A managed instance failed its init hook
    #[error("Init hook of '{token}' failed - error: {error}")]
    HookFailed {
        token: InjectionToken,
        error: Arc<DynError>,
    },
    /// Initiation timed out
    #[error("Initiation timed out")]
    Timeout,
}

/// One or more destroy hooks failed during shutdown
#[derive(Error, Debug)]
pub struct ShutdownError {
    pub failures: Vec<(InjectionToken, DynError)>,
}
impl std::fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("One or more destroy hooks failed:".to_string());
        for (token, error) in &self.failures {
            display.push(format!("- '{token}': {error}"));
        }
        f.write_str(&display.join("\n"))
    }
}
