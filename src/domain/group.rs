use std::collections::HashSet;

use super::ids::{GroupId, UserId};

/// Named set of users whose libraries get intersected.
///
/// Membership only grows.
#[derive(Debug, Clone)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub members: HashSet<UserId>,
}

impl Group {
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            members: HashSet::new(),
        }
    }
}
