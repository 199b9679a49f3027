//! Error types for the two-way SQL core.

/// Core error type for configuration and dialect selection.
#[derive(Debug, thiserror::Error)]
pub enum TwoWaySqlError {
    /// Unknown dialect name.
    #[error("unknown dialect: {0} (expected standard, postgres, mysql or oracle)")]
    UnknownDialect(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for core operations.
pub type TwoWaySqlResult<T> = Result<T, TwoWaySqlError>;
