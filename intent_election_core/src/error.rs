/// Errors raised by the election pipeline.
///
/// The pipeline is pure computation: any of these indicates a data-contract
/// violation upstream and is returned to the caller as-is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ElectionError {
    #[error("degenerate input: {reason}")]
    DegenerateInput { reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("intent {label} not found in context {context}")]
    NotFound { context: String, label: String },

    #[error("invalid config field {field}: {message}")]
    InvalidConfig { field: String, message: String },
}
