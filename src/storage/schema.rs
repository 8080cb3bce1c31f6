use rusqlite::Connection;

pub mod tables {
    pub const USERS: &str = "users";
    pub const SAVED_TRACKS: &str = "saved_tracks";
    pub const GROUPS: &str = "listening_groups";
    pub const MEMBERSHIPS: &str = "memberships";

    pub const ALL_TABLES: &[&str] = &[USERS, SAVED_TRACKS, GROUPS, MEMBERSHIPS];
}

pub mod columns {
    pub const ID: &str = "id";
    pub const USER_ID: &str = "user_id";
    pub const GROUP_ID: &str = "group_id";
    pub const TRACK_ID: &str = "track_id";
    pub const TITLE: &str = "title";
    pub const ARTIST: &str = "artist";
    pub const ALBUM: &str = "album";
    pub const NAME: &str = "name";
    pub const REFRESHED_AT: &str = "refreshed_at";
    pub const CREATED_AT: &str = "created_at";
}

pub use columns::*;
pub use tables::*;

const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    refreshed_at INTEGER
);

CREATE TABLE IF NOT EXISTS saved_tracks (
    user_id TEXT NOT NULL REFERENCES users(id),
    track_id TEXT NOT NULL,
    title TEXT,
    artist TEXT,
    album TEXT,
    PRIMARY KEY (user_id, track_id)
);

CREATE TABLE IF NOT EXISTS listening_groups (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS memberships (
    group_id TEXT NOT NULL REFERENCES listening_groups(id),
    user_id TEXT NOT NULL REFERENCES users(id),
    PRIMARY KEY (group_id, user_id)
);
"#;

pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}
