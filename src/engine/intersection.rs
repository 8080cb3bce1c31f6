//! Tracks shared by every member of a group

use std::collections::HashSet;

use log::debug;

use crate::{
    domain::{ids::GroupId, track::Track},
    engine::error::CoreError,
    storage::Repository,
};

/// Intersects the stored libraries of all members of `group_id`.
///
/// Reads whatever each member has stored; nothing gets re-collected.
/// No members gives an empty set, one member gives that member's library.
pub fn common_tracks<R>(repo: &R, group_id: &GroupId) -> Result<HashSet<Track>, CoreError>
where
    R: Repository + ?Sized,
{
    let group = repo
        .get_group(group_id)?
        .ok_or_else(|| CoreError::GroupNotFound(group_id.clone()))?;

    let mut libraries = Vec::with_capacity(group.members.len());
    for member in &group.members {
        let user = repo
            .get_user(member)?
            .ok_or_else(|| CoreError::UserNotFound(member.clone()))?;
        libraries.push(user.saved_tracks);
    }

    let common = intersect(libraries);
    debug!(
        "group {group_id}: {} members, {} common tracks",
        group.members.len(),
        common.len()
    );
    Ok(common)
}

/// Intersection of all sets, starting from the smallest
pub fn intersect(mut libraries: Vec<HashSet<Track>>) -> HashSet<Track> {
    libraries.sort_by_key(HashSet::len);

    let mut iter = libraries.into_iter();
    let Some(mut common) = iter.next() else {
        return HashSet::new();
    };

    for library in iter {
        if common.is_empty() {
            break;
        }
        common.retain(|track| library.contains(track));
    }

    common
}
