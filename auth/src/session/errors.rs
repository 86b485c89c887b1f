use thiserror::Error;

/// Error for session store operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("Session store is unavailable: {0}")]
    Unavailable(String),

    #[error("Session store operation failed: {0}")]
    OperationFailed(String),
}
