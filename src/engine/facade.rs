//! Entry points for the outer layer
//!
//! Every operation re-reads the repository, nothing is cached between calls.
//! Failures are logged here with their cause and handed out as an opaque
//! [`Failure`].

use std::{collections::HashSet, sync::Arc};

use log::{error, info};

use crate::{
    config::Config,
    domain::{
        group::Group,
        ids::{GroupId, UserId},
        track::Track,
        user::User,
    },
    engine::{
        collector::Collector,
        error::{CoreError, Failure},
        intersection,
        registry::Registry,
    },
    source::{Credential, ProfileResolver, TrackSource},
    storage::{Repository, error::RepoError},
};

/// Common tracks of a group in a stable order, ready to be written back as a playlist
#[derive(Debug, Clone)]
pub struct CombinedPlaylist {
    pub group_id: GroupId,
    pub name: String,
    /// sorted by track id
    pub tracks: Vec<Track>,
}

pub struct Aggregator<R: Repository> {
    repo: Arc<R>,
    collector: Collector,
    registry: Registry,
}

fn failure(operation: &'static str) -> impl FnOnce(CoreError) -> Failure {
    move |cause| {
        error!("{operation} failed: {cause}");
        Failure::from(cause)
    }
}

impl<R: Repository> Aggregator<R> {
    pub fn new(repo: Arc<R>, collector: Collector, registry: Registry) -> Self {
        Self {
            repo,
            collector,
            registry,
        }
    }

    pub fn from_config(repo: Arc<R>, config: &Config) -> Self {
        Self::new(
            repo,
            Collector::new(config.source.page_size),
            Registry::new(config.groups.max_id_attempts),
        )
    }

    /// Resolves the credential and creates the user record on first sight
    pub fn register<P>(&self, credential: &Credential, resolver: &P) -> Result<UserId, Failure>
    where
        P: ProfileResolver + ?Sized,
    {
        self.resolve_and_ensure_user(credential, resolver)
            .map_err(failure("register"))
    }

    /// Re-collects the caller's saved tracks; returns the distinct track count
    pub fn refresh_library<P, S>(
        &self,
        credential: &Credential,
        resolver: &P,
        source: &S,
    ) -> Result<usize, Failure>
    where
        P: ProfileResolver + ?Sized,
        S: TrackSource + ?Sized,
    {
        (|| -> Result<usize, CoreError> {
            let user = self.resolve_and_ensure_user(credential, resolver)?;
            info!("Getting saved tracks for {user}...");
            self.collector.collect(&*self.repo, &user, source)
        })()
        .map_err(failure("refresh library"))
    }

    /// Creates a group with the caller as its first member
    pub fn create_group<P>(
        &self,
        credential: &Credential,
        resolver: &P,
        name: &str,
    ) -> Result<GroupId, Failure>
    where
        P: ProfileResolver + ?Sized,
    {
        (|| -> Result<GroupId, CoreError> {
            Registry::validate_name(name)?;
            let creator = self.resolve_and_ensure_user(credential, resolver)?;
            info!("Creating group with name {name} for {creator}...");
            self.registry.create_group_with_members(
                &*self.repo,
                name,
                HashSet::from([creator]),
            )
        })()
        .map_err(failure("create group"))
    }

    pub fn join_group(&self, user: &UserId, group: &GroupId) -> Result<(), Failure> {
        self.registry
            .join(&*self.repo, user, group)
            .map_err(failure("join group"))
    }

    pub fn group_exists(&self, group: &GroupId) -> Result<bool, Failure> {
        self.registry
            .exists(&*self.repo, group)
            .map_err(failure("group lookup"))
    }

    pub fn common_tracks(&self, group: &GroupId) -> Result<HashSet<Track>, Failure> {
        intersection::common_tracks(&*self.repo, group).map_err(failure("common tracks"))
    }

    pub fn combined_playlist(&self, group: &GroupId) -> Result<CombinedPlaylist, Failure> {
        (|| -> Result<CombinedPlaylist, CoreError> {
            let found = self
                .repo
                .get_group(group)?
                .ok_or_else(|| CoreError::GroupNotFound(group.clone()))?;
            let mut tracks = intersection::common_tracks(&*self.repo, group)?
                .into_iter()
                .collect::<Vec<_>>();
            tracks.sort_by(|a, b| a.id.cmp(&b.id));

            Ok(CombinedPlaylist {
                group_id: found.id,
                name: found.name,
                tracks,
            })
        })()
        .map_err(failure("combined playlist"))
    }

    pub fn user(&self, id: &UserId) -> Result<User, Failure> {
        (|| -> Result<User, CoreError> {
            self.repo
                .get_user(id)?
                .ok_or_else(|| CoreError::UserNotFound(id.clone()))
        })()
        .map_err(failure("user lookup"))
    }

    pub fn group(&self, id: &GroupId) -> Result<Group, Failure> {
        (|| -> Result<Group, CoreError> {
            self.repo
                .get_group(id)?
                .ok_or_else(|| CoreError::GroupNotFound(id.clone()))
        })()
        .map_err(failure("group lookup"))
    }

    fn resolve_and_ensure_user<P>(
        &self,
        credential: &Credential,
        resolver: &P,
    ) -> Result<UserId, CoreError>
    where
        P: ProfileResolver + ?Sized,
    {
        let id = resolver.current_user_id(credential)?;

        if self.repo.get_user(&id)?.is_none() {
            match self.repo.create_user(&User::new(id.clone())) {
                Ok(()) => info!("Registered new user {id}"),
                // a concurrent request created it first
                Err(RepoError::Conflict(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(id)
    }
}
