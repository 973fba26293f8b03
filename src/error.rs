//! Error types for permgate

/// The main error type for permgate operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum PermError {
    /// A referenced member, project, or role template does not exist
    #[error("not found: {0}")]
    NotFound(String),
    /// An enforcement failure or an attempt to mutate an owner's grants
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Malformed role name, unknown permission kind, duplicate membership
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Persistence failure; never folded into a permission denial
    #[error("storage error: {0}")]
    Store(String),
}

/// Result type alias for permgate operations
pub type Result<T> = std::result::Result<T, PermError>;

/// Convert a backing-store error to PermError::Store
pub fn err<E: std::error::Error>(e: E) -> PermError {
    PermError::Store(e.to_string())
}
