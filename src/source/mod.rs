//! Capabilities the engine needs from the streaming provider.

use thiserror::Error;

use crate::domain::{ids::UserId, track::Track};

pub mod export;

/// Largest page the provider hands out in one request
pub const MAX_PAGE_SIZE: usize = 50;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    #[error("provider rate limit hit")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("credential rejected: {0}")]
    Unauthorized(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Opaque access credential of one user session.
///
/// Passed explicitly into every facade call that talks to the provider
/// and valid until the provider expires it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

/// Paginated access to a user's saved tracks
pub trait TrackSource {
    fn total_saved_count(&self, user: &UserId) -> Result<usize, SourceError>;

    fn saved_tracks_page(
        &self,
        user: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Track>, SourceError>;

    fn max_page_size(&self) -> usize {
        MAX_PAGE_SIZE
    }
}

/// Resolves the authenticated user behind a credential
pub trait ProfileResolver {
    fn current_user_id(&self, credential: &Credential) -> Result<UserId, SourceError>;
}
