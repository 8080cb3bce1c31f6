use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Represents the track ID.
///
/// This is the provider-issued URI of a song. Two tracks are the same song
/// iff their IDs are equal; the provider may still hand out several IDs for
/// one recording, and those are not reconciled here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

/// Stable identifier of a user as reported by the profile resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Short random alphanumeric group identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(TrackId);
string_id!(UserId);
string_id!(GroupId);

impl GroupId {
    pub const LEN: usize = 8;

    /// true when the id has the shape the registry hands out
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == Self::LEN && self.0.chars().all(|c| c.is_ascii_alphanumeric())
    }
}
