use std::{
    any::Any,
    backtrace::{Backtrace, BacktraceStatus},
    error::Error,
    fmt::Debug,
    iter::successors,
    sync::Arc,
};

use wrapp_di::DynError;

/// Error raised by the client module itself
///
/// Failures of the injected client are never wrapped into this type,
/// so a downcast to [ClientError] tells usage errors apart from driver errors.
#[derive(thiserror::Error, Clone)]
#[error("{message}")]
pub struct ClientError {
    message: String,
    original: Option<Arc<dyn Any + Send + Sync>>,
    trace: Arc<Backtrace>,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        ClientError {
            message: message.into(),
            original: None,
            trace: Arc::new(Backtrace::force_capture()),
        }
    }

    /// Wraps a cause of any type
    ///
    /// If the cause is or carries a [ClientError] with a captured trace, that trace is
    /// shared instead of capturing a new one, so it still points at the original failure.
    /// Boxed errors and `Arc`s of either are looked through, as is their source chain.
    pub fn with_original_error<E>(message: impl Into<String>, original: E) -> Self
    where
        E: Any + Send + Sync,
    {
        let trace =
            cause_trace(&original).unwrap_or_else(|| Arc::new(Backtrace::force_capture()));

        ClientError {
            message: message.into(),
            original: Some(Arc::new(original)),
            trace,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The cause given on construction, `None` if there was none
    pub fn original_error(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.original.as_deref()
    }

    /// The cause, if it is a `T`
    pub fn original_error_as<T: Any>(&self) -> Option<&T> {
        self.original.as_deref()?.downcast_ref::<T>()
    }

    pub fn trace(&self) -> &Backtrace {
        &self.trace
    }

    /// True if both errors carry the very same trace
    pub fn shares_trace_with(&self, other: &ClientError) -> bool {
        Arc::ptr_eq(&self.trace, &other.trace)
    }
}

/// The captured trace of a [ClientError] found in `cause`
fn cause_trace(cause: &dyn Any) -> Option<Arc<Backtrace>> {
    let error: &(dyn Error + 'static) = if let Some(error) = cause.downcast_ref::<ClientError>() {
        error
    } else if let Some(error) = cause.downcast_ref::<Arc<ClientError>>() {
        &**error
    } else if let Some(error) = cause.downcast_ref::<DynError>() {
        &**error
    } else if let Some(error) = cause.downcast_ref::<Arc<DynError>>() {
        &***error
    } else {
        return None;
    };

    successors(Some(error), |&error| error.source())
        .find_map(|error| error.downcast_ref::<ClientError>())
        .filter(|client_error| client_error.trace.status() == BacktraceStatus::Captured)
        .map(|client_error| client_error.trace.clone())
}

impl Debug for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientError")
            .field("message", &self.message)
            .field("has_original", &self.original.is_some())
            .field("trace", &self.trace.status())
            .finish()
    }
}
