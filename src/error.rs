use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by client operations. None of them are retried internally.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("not authenticated yet")]
    NotAuthenticated,

    #[error("no course selected, run set_course first")]
    NoCourseSelected,

    #[error("invalid course id: {0}")]
    InvalidCourse(i64),

    #[error("invalid assignment id: {0}")]
    InvalidAssignment(i64),

    #[error("assignment {0} has no cutoff date")]
    NoCutoffDate(i64),

    #[error("submissions for assignment {id} are not cut off until {cutoff}")]
    NotCutOff { id: i64, cutoff: DateTime<Utc> },

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("remote service error ({code}): {message}")]
    Remote { code: String, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used when reporting a failed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Authentication,
    InvalidReference,
    Eligibility,
    Transport,
    Storage,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Configuration(_) | ClientError::NoCourseSelected => ErrorKind::Configuration,
            ClientError::NotAuthenticated | ClientError::Authentication(_) => {
                ErrorKind::Authentication
            }
            ClientError::InvalidCourse(_) | ClientError::InvalidAssignment(_) => {
                ErrorKind::InvalidReference
            }
            ClientError::NoCutoffDate(_) | ClientError::NotCutOff { .. } => ErrorKind::Eligibility,
            ClientError::Remote { .. } | ClientError::Transport(_) => ErrorKind::Transport,
            ClientError::Io(_) | ClientError::Json(_) => ErrorKind::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
