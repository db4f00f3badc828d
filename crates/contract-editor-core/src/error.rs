use thiserror::Error;

/// Errors raised by the edit surface and configuration loading.
///
/// Rendering and price/completion math never fail.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("No field with index {0} on the current surface")]
    UnknownField(usize),

    #[error("Field {0} is not being edited")]
    NotEditing(usize),

    #[error("Field {0} has an uncommitted edit; blur it before changing the document")]
    CommitPending(usize),

    #[error("Invalid editor configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
