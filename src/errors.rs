use thiserror::Error;

/// Error type that captures engine validation and storage failures.
///
/// Validation errors are raised before any mutation takes place, so a
/// failed operation never leaves partial state behind.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no participants supplied")]
    EmptyParticipantSet,
    #[error("invalid split configuration: {0}")]
    InvalidSplitConfig(String),
    #[error("invalid charge: {0}")]
    InvalidChargeSpec(String),
    #[error("invalid expense: {0}")]
    InvalidExpense(String),
    #[error("invalid payment transition: {0}")]
    InvalidPaymentTransition(String),
    #[error("concurrent materialization: {0}")]
    ConcurrentMaterialization(String),
    #[error("\"{0}\" not found")]
    KeyNotFound(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
