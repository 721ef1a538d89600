use thiserror::Error;

/// Why a candidate change object was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Candidate is not a JSON object")]
    NotAnObject,

    #[error("Missing field `{0}`")]
    MissingField(&'static str),

    #[error("Invalid line number: {0}")]
    InvalidLine(String),

    #[error("Unknown change type: {0}")]
    UnknownType(String),

    #[error("Field `content` must be a string")]
    ContentNotString,
}
