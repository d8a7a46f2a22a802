use crate::dates::DateError;
use thiserror::Error;

/// Recoverable roster failures. The UI turns every one of these into a notice.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error(transparent)]
    Date(#[from] DateError),

    #[error("no teaching schedule saved for grade {grade}")]
    MissingTemplate { grade: String },

    #[error("{0}")]
    Validation(String),

    #[error("student #{0} is no longer in the roster")]
    UnknownStudent(u32),

    #[error("report generation is not configured (set GEMINI_API_KEY)")]
    ReportsDisabled,
}

pub type Result<T> = std::result::Result<T, RosterError>;
