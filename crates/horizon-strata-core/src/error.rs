//! Error types for Horizon Strata core.

use thiserror::Error;

/// Signal-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// The connection id is unknown or was already disconnected.
    #[error("unknown or disconnected signal connection")]
    InvalidConnection,
}

/// A specialized Result type for core operations.
pub type Result<T> = std::result::Result<T, SignalError>;
