use crate::store::StoreError;
use avatar_types::SessionMode;
use thiserror::Error;

/// Failure reported by the avatar SDK or the display surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct SdkError(pub String);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("avatar SDK error: {0}")]
    Sdk(#[from] SdkError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("background image error: {0}")]
    Image(String),

    #[error("session controller needs a tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("{action} is not available in {mode:?} mode")]
    Unsupported {
        action: &'static str,
        mode: SessionMode,
    },
}
