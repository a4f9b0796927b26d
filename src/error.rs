use thiserror::Error;

/// Error taxonomy for the conversion pipeline.
///
/// Formatting is total and never fails; everything else is either a
/// problem with the input shape/configuration (`Validation`) or a remote
/// submission failure (`Submission`).
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Submission(String),
}

impl ImportError {
    pub fn validation(message: impl Into<String>) -> Self {
        ImportError::Validation(message.into())
    }

    pub fn submission(message: impl Into<String>) -> Self {
        ImportError::Submission(message.into())
    }
}
