use std::hash::{Hash, Hasher};

use super::ids::TrackId;

/// Represent a saved song
///
/// Equality and hashing only look at `id`, so a set of tracks
/// holds one entry per provider identity regardless of metadata.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub metadata: TrackMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

impl Track {
    pub fn new(id: impl Into<TrackId>) -> Self {
        Self {
            id: id.into(),
            metadata: TrackMetadata::default(),
        }
    }

    pub fn with_metadata(id: impl Into<TrackId>, metadata: TrackMetadata) -> Self {
        Self {
            id: id.into(),
            metadata,
        }
    }

    /// "Artist - Title" when known, the raw id otherwise
    pub fn display_name(&self) -> String {
        match (&self.metadata.artist, &self.metadata.title) {
            (Some(artist), Some(title)) => format!("{artist} - {title}"),
            (None, Some(title)) => title.clone(),
            _ => self.id.to_string(),
        }
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        TrackId(id)
    }
}
