//! Test doubles shared by the engine tests

use std::{cell::RefCell, collections::HashSet};

use rusqlite::Connection;

use crate::{
    domain::{ids::UserId, track::Track, user::User},
    source::{Credential, MAX_PAGE_SIZE, ProfileResolver, SourceError, TrackSource},
    storage::{Repository, schema, sqlite::SqliteRepository},
};

pub fn setup_repo() -> anyhow::Result<SqliteRepository> {
    let conn = Connection::open_in_memory()?;
    schema::init(&conn)?;
    Ok(SqliteRepository::from_existing_conn(conn))
}

pub fn with_user(repo: &impl Repository, id: &str) -> anyhow::Result<UserId> {
    let id = UserId::from(id);
    repo.create_user(&User::new(id.clone()))?;
    Ok(id)
}

/// sorted raw ids, for stable assertions
pub fn track_ids<'a>(tracks: impl IntoIterator<Item = &'a Track>) -> Vec<String> {
    let mut ids = tracks
        .into_iter()
        .map(|t| t.id.to_string())
        .collect::<Vec<_>>();
    ids.sort();
    ids
}

/// In-memory provider serving a fixed list of tracks page by page
pub struct ScriptedSource {
    owner: Option<UserId>,
    tracks: Vec<Track>,
    reported_total: Option<usize>,
    max_page_size: usize,
    fail_at_offset: Option<usize>,
    fail_probe: bool,
    requests: RefCell<Vec<(usize, usize)>>,
}

impl ScriptedSource {
    pub fn new(ids: &[&str]) -> Self {
        Self {
            owner: None,
            tracks: ids.iter().map(|id| Track::new(*id)).collect(),
            reported_total: None,
            max_page_size: MAX_PAGE_SIZE,
            fail_at_offset: None,
            fail_probe: false,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn owned_by(mut self, user: &str) -> Self {
        self.owner = Some(UserId::from(user));
        self
    }

    /// total returned by the probe, regardless of the real track count
    pub fn with_reported_total(mut self, total: usize) -> Self {
        self.reported_total = Some(total);
        self
    }

    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size;
        self
    }

    pub fn failing_at(mut self, offset: usize) -> Self {
        self.fail_at_offset = Some(offset);
        self
    }

    pub fn failing_probe(mut self) -> Self {
        self.fail_probe = true;
        self
    }

    pub fn requested_offsets(&self) -> Vec<usize> {
        self.requests.borrow().iter().map(|(_, offset)| *offset).collect()
    }

    pub fn requested_limits(&self) -> Vec<usize> {
        self.requests.borrow().iter().map(|(limit, _)| *limit).collect()
    }
}

impl TrackSource for ScriptedSource {
    fn total_saved_count(&self, _user: &UserId) -> Result<usize, SourceError> {
        if self.fail_probe {
            return Err(SourceError::Unreachable("connection refused".into()));
        }
        Ok(self.reported_total.unwrap_or(self.tracks.len()))
    }

    fn saved_tracks_page(
        &self,
        _user: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Track>, SourceError> {
        self.requests.borrow_mut().push((limit, offset));

        if self.fail_at_offset == Some(offset) {
            return Err(SourceError::RateLimited {
                retry_after_secs: Some(1),
            });
        }

        Ok(self
            .tracks
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn max_page_size(&self) -> usize {
        self.max_page_size
    }
}

impl ProfileResolver for ScriptedSource {
    fn current_user_id(&self, credential: &Credential) -> Result<UserId, SourceError> {
        self.owner.clone().ok_or_else(|| {
            SourceError::Unauthorized(format!("credential {} expired", credential.token()))
        })
    }
}

pub fn track_set(ids: &[&str]) -> HashSet<Track> {
    ids.iter().map(|id| Track::new(*id)).collect()
}
