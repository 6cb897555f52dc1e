use carepoint_assessment::AssessmentError;
use carepoint_types::TextError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Assessment(#[from] AssessmentError),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("authentication required")]
    Unauthenticated,
    #[error("invalid status transition: {0}")]
    InvalidTransition(String),
    #[error("record store lock poisoned")]
    StorePoisoned,

    #[error("failed to read seed file: {0}")]
    SeedFileRead(std::io::Error),
    #[error("seed file schema mismatch at {path}: {message}")]
    SeedFileSchema { path: String, message: String },
}

impl From<TextError> for RecordError {
    fn from(err: TextError) -> Self {
        RecordError::InvalidInput(err.to_string())
    }
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;
