use thiserror::Error;

use crate::domain::ids::{GroupId, UserId};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// the row already exists; used for id collisions on insert
    #[error("{0} already exists")]
    Conflict(String),

    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("group {0} not found")]
    GroupNotFound(GroupId),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
