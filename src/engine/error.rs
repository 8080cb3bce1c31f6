use thiserror::Error;

use crate::{
    domain::ids::{GroupId, UserId},
    source::SourceError,
    storage::error::RepoError,
};

/// Broad class of a failure, enough for a caller to pick a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    NotFound,
    Upstream,
    Persistence,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("group {0} not found")]
    GroupNotFound(GroupId),

    #[error("track source failed: {0}")]
    Upstream(#[from] SourceError),

    #[error("repository failed: {0}")]
    Persistence(RepoError),

    #[error("no free group id after {attempts} attempts")]
    IdSpaceExhausted { attempts: usize },
}

impl From<RepoError> for CoreError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::UserNotFound(id) => CoreError::UserNotFound(id),
            RepoError::GroupNotFound(id) => CoreError::GroupNotFound(id),
            other => CoreError::Persistence(other),
        }
    }
}

impl CoreError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CoreError::Validation(_) => FailureKind::Validation,
            CoreError::UserNotFound(_) | CoreError::GroupNotFound(_) => FailureKind::NotFound,
            CoreError::Upstream(_) => FailureKind::Upstream,
            CoreError::Persistence(_) | CoreError::IdSpaceExhausted { .. } => {
                FailureKind::Persistence
            }
        }
    }
}

/// Opaque failure handed to the outer layer.
///
/// The detailed cause is logged by the facade and kept as the error source.
#[derive(Debug, Error)]
#[error("request could not be completed")]
pub struct Failure {
    kind: FailureKind,
    #[source]
    cause: CoreError,
}

impl Failure {
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn cause(&self) -> &CoreError {
        &self.cause
    }
}

impl From<CoreError> for Failure {
    fn from(cause: CoreError) -> Self {
        Self {
            kind: cause.kind(),
            cause,
        }
    }
}
