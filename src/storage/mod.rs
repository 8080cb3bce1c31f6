//! Persistence of users and groups

use std::collections::HashSet;

use crate::domain::{
    group::Group,
    ids::{GroupId, UserId},
    track::Track,
    user::User,
};

pub mod db;
pub mod error;
pub(crate) mod schema;
pub mod sqlite;

use error::RepoError;

/// CRUD operations the engine runs against persisted state.
///
/// Implementations are shared between request threads and must keep every
/// mutating call all-or-nothing.
pub trait Repository: Send + Sync {
    fn get_user(&self, id: &UserId) -> Result<Option<User>, RepoError>;

    /// fails with [`RepoError::Conflict`] when the id is taken
    fn create_user(&self, user: &User) -> Result<(), RepoError>;

    /// replaces the whole saved-track set of an existing user
    fn set_user_saved_tracks(&self, id: &UserId, tracks: &HashSet<Track>)
    -> Result<(), RepoError>;

    fn get_group(&self, id: &GroupId) -> Result<Option<Group>, RepoError>;

    /// insert-if-absent; fails with [`RepoError::Conflict`] when the id is taken
    fn create_group(&self, group: &Group) -> Result<(), RepoError>;

    /// adding an existing member is a no-op
    fn register_user_with_group(&self, user: &UserId, group: &GroupId) -> Result<(), RepoError>;
}
