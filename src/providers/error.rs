use thiserror::Error;

/// Raw failure reported by a hardware/runtime capability, before any
/// classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("access not allowed: {0}")]
    NotAllowed(String),

    #[error("blocked by security policy: {0}")]
    Security(String),

    #[error("requested device not found")]
    NotFound,

    #[error("constraint could not be satisfied: {constraint}")]
    Overconstrained { constraint: String },

    #[error("device could not be read (in use elsewhere?)")]
    NotReadable,

    #[error("capability unsupported in this runtime")]
    Unsupported,

    #[error("{0}")]
    Other(String),
}
