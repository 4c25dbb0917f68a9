use crate::claim::ClaimStatus;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TransitionError {
    #[error("claim is in terminal state {from} and accepts no further transitions")]
    TerminalState { from: ClaimStatus },
    #[error("transition {from} -> {to} is not allowed")]
    NotAllowed { from: ClaimStatus, to: ClaimStatus },
    #[error("a non-empty note is required to enter {to}")]
    NoteRequired { to: ClaimStatus },
    #[error("transition requires an acting user id")]
    MissingActor,
}

#[derive(thiserror::Error, Debug)]
pub enum ClaimError {
    #[error("claim not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("codec failure: {0}")]
    Codec(String),
    #[error("storage failure: {0}")]
    Storage(#[from] sled::Error),
}

impl ClaimError {
    /// True when retrying the same call could succeed (transient storage
    /// failures). Business-rule rejections are never retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClaimError::Storage(_))
    }
}
