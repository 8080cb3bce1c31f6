use std::collections::HashSet;

use log::{debug, info, warn};
use rand::{Rng, distributions::Alphanumeric};

use crate::{
    domain::{
        group::Group,
        ids::{GroupId, UserId},
    },
    engine::error::CoreError,
    storage::{Repository, error::RepoError},
};

/// Hands out candidate group ids
pub trait GroupIdGenerator: Send + Sync {
    fn candidate(&self) -> GroupId;
}

/// Random alphanumeric ids of [`GroupId::LEN`] characters
#[derive(Debug, Default)]
pub struct RandomGroupIds;

impl GroupIdGenerator for RandomGroupIds {
    fn candidate(&self) -> GroupId {
        let id = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(GroupId::LEN)
            .map(char::from)
            .collect::<String>();
        GroupId(id)
    }
}

/// Creates groups and manages their membership
pub struct Registry {
    ids: Box<dyn GroupIdGenerator>,
    max_attempts: usize,
}

impl Registry {
    pub fn new(max_attempts: usize) -> Self {
        Self::with_generator(Box::new(RandomGroupIds), max_attempts)
    }

    pub fn with_generator(ids: Box<dyn GroupIdGenerator>, max_attempts: usize) -> Self {
        Self {
            ids,
            max_attempts: max_attempts.max(1),
        }
    }

    /// rejects names that are empty after trimming
    pub fn validate_name(name: &str) -> Result<&str, CoreError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            Err(CoreError::Validation("group name must not be blank".into()))
        } else {
            Ok(trimmed)
        }
    }

    /// Creates an empty group and returns its fresh id
    pub fn create_group<R>(&self, repo: &R, name: &str) -> Result<GroupId, CoreError>
    where
        R: Repository + ?Sized,
    {
        self.create_group_with_members(repo, name, HashSet::new())
    }

    /// Allocates a free id and persists the group with its initial members.
    ///
    /// A candidate is skipped when it is already taken, either as seen by the
    /// existence check or as a conflict on insert when another writer got
    /// there in between. After `max_attempts` candidates the call fails with
    /// [`CoreError::IdSpaceExhausted`].
    pub fn create_group_with_members<R>(
        &self,
        repo: &R,
        name: &str,
        members: HashSet<UserId>,
    ) -> Result<GroupId, CoreError>
    where
        R: Repository + ?Sized,
    {
        let name = Self::validate_name(name)?;

        for attempt in 1..=self.max_attempts {
            let candidate = self.ids.candidate();

            if repo.get_group(&candidate)?.is_some() {
                debug!("group id {candidate} taken, attempt {attempt}");
                continue;
            }

            let group = Group {
                id: candidate.clone(),
                name: name.to_string(),
                members: members.clone(),
            };
            match repo.create_group(&group) {
                Ok(()) => {
                    info!("Created group {candidate} ({name})");
                    return Ok(candidate);
                }
                Err(RepoError::Conflict(_)) => {
                    debug!("group id {candidate} claimed concurrently, attempt {attempt}");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(
            "Gave up allocating a group id after {} attempts",
            self.max_attempts
        );
        Err(CoreError::IdSpaceExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Adds a user to a group; joining twice is a no-op
    pub fn join<R>(&self, repo: &R, user: &UserId, group: &GroupId) -> Result<(), CoreError>
    where
        R: Repository + ?Sized,
    {
        if group.as_str().trim().is_empty() {
            return Err(CoreError::Validation("group id must not be blank".into()));
        }

        let existing = repo
            .get_group(group)?
            .ok_or_else(|| CoreError::GroupNotFound(group.clone()))?;

        if existing.members.contains(user) {
            debug!("{user} already in group {group}");
            return Ok(());
        }

        repo.register_user_with_group(user, group)?;
        info!("{user} joined group {group}");
        Ok(())
    }

    pub fn exists<R>(&self, repo: &R, group: &GroupId) -> Result<bool, CoreError>
    where
        R: Repository + ?Sized,
    {
        Ok(repo.get_group(group)?.is_some())
    }
}
