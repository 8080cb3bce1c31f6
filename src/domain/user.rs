use std::collections::HashSet;

use super::{
    ids::{GroupId, UserId},
    track::Track,
};
use crate::storage::db::SecondsSinceUnix;

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// replaced wholesale on every collection run
    pub saved_tracks: HashSet<Track>,
    pub groups: HashSet<GroupId>,
    /// last successful collection run, if any
    pub refreshed_at: Option<SecondsSinceUnix>,
}

impl User {
    /// a freshly seen user with an empty library and no groups
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            saved_tracks: HashSet::new(),
            groups: HashSet::new(),
            refreshed_at: None,
        }
    }
}
