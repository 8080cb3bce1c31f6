//! File backed provider reading library exports
//!
//! Every credential maps to `<exports_dir>/<credential>.json` holding the
//! owner's id and their saved tracks in provider order.

use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::{
    domain::{
        ids::UserId,
        track::{Track, TrackMetadata},
    },
    source::{Credential, MAX_PAGE_SIZE, ProfileResolver, SourceError, TrackSource},
};

#[derive(Debug, Deserialize)]
struct ExportFile {
    user_id: String,
    #[serde(default)]
    saved_tracks: Vec<ExportedTrack>,
}

#[derive(Debug, Deserialize)]
struct ExportedTrack {
    uri: String,
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
}

impl From<ExportedTrack> for Track {
    fn from(t: ExportedTrack) -> Self {
        Track::with_metadata(
            t.uri,
            TrackMetadata {
                title: t.title,
                artist: t.artist,
                album: t.album,
            },
        )
    }
}

/// Library export of a single user, loaded for one credential
#[derive(Debug)]
pub struct LibraryExport {
    owner: UserId,
    tracks: Vec<Track>,
}

impl LibraryExport {
    /// path of the export a credential points at
    pub fn path_for(exports_dir: &Path, credential: &Credential) -> Result<PathBuf, SourceError> {
        let token = credential.token();
        if token.is_empty()
            || !token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SourceError::Unauthorized(format!(
                "credential '{token}' is not a valid token"
            )));
        }
        Ok(exports_dir.join(format!("{token}.json")))
    }

    pub fn load(exports_dir: &Path, credential: &Credential) -> Result<Self, SourceError> {
        let path = Self::path_for(exports_dir, credential)?;

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::Unauthorized(format!(
                    "no export for credential '{}'",
                    credential.token()
                )));
            }
            Err(e) => {
                return Err(SourceError::Unreachable(format!(
                    "failed to read {}: {e}",
                    path.to_string_lossy()
                )));
            }
        };

        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, SourceError> {
        let file: ExportFile =
            serde_json::from_str(contents).map_err(|e| SourceError::Malformed(e.to_string()))?;

        if file.user_id.trim().is_empty() {
            return Err(SourceError::Malformed("export has an empty user_id".into()));
        }

        Ok(Self {
            owner: UserId(file.user_id),
            tracks: file.saved_tracks.into_iter().map(Track::from).collect(),
        })
    }

    fn check_owner(&self, user: &UserId) -> Result<(), SourceError> {
        if &self.owner == user {
            Ok(())
        } else {
            Err(SourceError::Unauthorized(format!(
                "export belongs to {}, not {user}",
                self.owner
            )))
        }
    }
}

impl ProfileResolver for LibraryExport {
    fn current_user_id(&self, _credential: &Credential) -> Result<UserId, SourceError> {
        Ok(self.owner.clone())
    }
}

impl TrackSource for LibraryExport {
    fn total_saved_count(&self, user: &UserId) -> Result<usize, SourceError> {
        self.check_owner(user)?;
        Ok(self.tracks.len())
    }

    fn saved_tracks_page(
        &self,
        user: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Track>, SourceError> {
        self.check_owner(user)?;
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(SourceError::Malformed(format!(
                "page limit {limit} outside 1..={MAX_PAGE_SIZE}"
            )));
        }

        let start = offset.min(self.tracks.len());
        let end = offset.saturating_add(limit).min(self.tracks.len());
        debug!("export page for {user}: offset {offset}, {} tracks", end - start);

        Ok(self.tracks[start..end].to_vec())
    }
}
