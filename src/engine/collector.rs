use std::collections::HashSet;

use log::{debug, info};

use crate::{
    domain::{ids::UserId, track::Track},
    engine::error::CoreError,
    source::{MAX_PAGE_SIZE, TrackSource},
    storage::Repository,
};

/// Pulls a user's whole saved-track library from a [`TrackSource`]
#[derive(Debug, Clone)]
pub struct Collector {
    page_size: usize,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new(MAX_PAGE_SIZE)
    }
}

impl Collector {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    /// Fetches every page of saved tracks and replaces the stored set.
    ///
    /// The source is asked for the total first, then paged from offset 0
    /// until the offset passes that total. Any source error aborts the run
    /// before anything is written, so the previous set stays in place.
    /// Returns the number of distinct tracks stored.
    pub fn collect<R, S>(&self, repo: &R, user: &UserId, source: &S) -> Result<usize, CoreError>
    where
        R: Repository + ?Sized,
        S: TrackSource + ?Sized,
    {
        let saved = self.fetch_all(user, source)?;

        repo.set_user_saved_tracks(user, &saved)?;
        info!("Stored {} saved tracks for {user}", saved.len());

        Ok(saved.len())
    }

    fn fetch_all<S>(&self, user: &UserId, source: &S) -> Result<HashSet<Track>, CoreError>
    where
        S: TrackSource + ?Sized,
    {
        let limit = self.page_size.min(source.max_page_size()).max(1);
        let total = source.total_saved_count(user)?;
        debug!("{user} reports {total} saved tracks, paging by {limit}");

        let mut saved = HashSet::new();
        let mut offset = 0;
        while offset <= total {
            let page = source.saved_tracks_page(user, limit, offset)?;
            debug!("page at offset {offset}: {} tracks", page.len());
            saved.extend(page);
            offset += limit;
        }

        Ok(saved)
    }
}
