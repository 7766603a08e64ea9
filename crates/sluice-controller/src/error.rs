//! Controller error types

use crate::clients::RpcError;
use crate::directory::ResolveError;
use crate::metadata::MetadataError;
use thiserror::Error;

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Errors surfaced by event handlers
///
/// The event pipeline re-enqueues an event exactly when its handler returned
/// an error for which [`ControllerError::is_retryable`] holds. Everything
/// else is terminal for that event.
#[derive(Debug, Error)]
pub enum ControllerError {
    // ==================== Host Resolution ====================
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    // ==================== RPC ====================
    #[error(transparent)]
    Rpc(#[from] RpcError),

    // ==================== Metadata ====================
    #[error("metadata read failed: {0}")]
    MetadataRead(#[source] MetadataError),

    #[error("metadata update failed: {0}")]
    MetadataUpdate(#[source] MetadataError),

    // ==================== Sealing ====================
    #[error("seal rate limited")]
    SealRateLimited,

    #[error("no healthy store for extent {0}")]
    NoHealthyStore(String),

    #[error("seal failed on every store for extent {0}")]
    SealFailed(String),

    // ==================== Pipeline ====================
    #[error("event queue full")]
    QueueFull,

    #[error("event pipeline shutting down")]
    ShuttingDown,
}

impl ControllerError {
    /// Check if the pipeline should re-enqueue the failed event
    pub fn is_retryable(&self) -> bool {
        match self {
            ControllerError::Resolve(_) => true,
            ControllerError::Rpc(e) => e.is_retryable(),
            ControllerError::MetadataRead(_) => true,
            ControllerError::MetadataUpdate(e) => !matches!(e, MetadataError::IllegalState),
            ControllerError::SealRateLimited => true,
            ControllerError::NoHealthyStore(_) => true,
            ControllerError::SealFailed(_) => true,
            ControllerError::QueueFull => false,
            ControllerError::ShuttingDown => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ControllerError::SealRateLimited.is_retryable());
        assert!(ControllerError::NoHealthyStore("e1".into()).is_retryable());
        assert!(ControllerError::SealFailed("e1".into()).is_retryable());
        assert!(ControllerError::Rpc(RpcError::Timeout).is_retryable());
        assert!(
            ControllerError::MetadataRead(MetadataError::Unavailable("down".into()))
                .is_retryable()
        );
        assert!(
            ControllerError::MetadataUpdate(MetadataError::Internal("oops".into()))
                .is_retryable()
        );
    }

    #[test]
    fn test_terminal_errors() {
        assert!(!ControllerError::QueueFull.is_retryable());
        assert!(!ControllerError::ShuttingDown.is_retryable());
        assert!(!ControllerError::Rpc(RpcError::Remote("bad request".into())).is_retryable());
        assert!(!ControllerError::MetadataUpdate(MetadataError::IllegalState).is_retryable());
    }
}
