use thiserror::Error;

/// Failure of a call to the word-data service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The request could not complete: connection error, timeout, server error
    /// or a body that could not be understood.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service answered, but a precondition was not met
    /// (e.g. no word has reached the stage this mode needs).
    #[error("{0}")]
    Logical(String),
}

impl ServiceError {
    pub fn is_logical(&self) -> bool {
        matches!(self, ServiceError::Logical(_))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Transport(err.to_string())
    }
}

/// Client-side rejection of an answer before grading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please enter an answer")]
    EmptyAnswer,

    #[error("please fill in every blank")]
    IncompleteBlanks { missing: Vec<usize> },

    #[error("expected {expected} blanks, got {got}")]
    BlankCountMismatch { expected: usize, got: usize },

    #[error("answer does not match this exercise")]
    ShapeMismatch,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be greater than zero")]
    ZeroDuration { var: &'static str },
}
