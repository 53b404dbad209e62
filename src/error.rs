use thiserror::Error;

/// Rejected learner request. Reported back to the learner, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChoiceError {
    #[error("Invalid choice")]
    InvalidChoice,
    #[error("Invalid choice index")]
    InvalidChoiceIndex,
    #[error("Target node {0} not found")]
    TargetNotFound(String),
    #[error("Undo not allowed")]
    UndoNotAllowed,
    #[error("Reset not allowed")]
    ResetNotAllowed,
}

/// Rejected authoring submission. Persisted state is left as it was.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Too many nodes (max {max}).")]
    TooManyNodes { max: usize, count: usize },
    #[error("Background image alt text is required unless the image is marked decorative.")]
    MissingAltText,
    #[error("Malformed submission: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Validation errors")]
    Invalid(Vec<String>),
}

impl SubmitError {
    /// Every problem the author needs to fix, one message each.
    pub fn field_errors(&self) -> Vec<String> {
        match self {
            SubmitError::Invalid(errors) => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// Transport-level failure of a handler call.
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("unknown handler: {0}")]
    UnknownHandler(String),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}
