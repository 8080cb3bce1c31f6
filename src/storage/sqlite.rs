use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
    time::SystemTime,
};

use anyhow::anyhow;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Transaction, params};

use crate::{
    config,
    domain::{
        group::Group,
        ids::{GroupId, TrackId, UserId},
        track::{Track, TrackMetadata},
        user::User,
    },
    storage::{
        Repository,
        db::{self, SecondsSinceUnix, system_time_to_i64},
        error::RepoError,
        schema::{columns::*, tables::*},
    },
};

/// SQLite backed [`Repository`]
///
/// The connection sits behind a mutex, so one instance can be shared
/// between threads through an `Arc`.
pub struct SqliteRepository {
    db: Mutex<Connection>,
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn user_exists(tx: &Transaction, id: &UserId) -> Result<bool, rusqlite::Error> {
    tx.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {USERS} WHERE {ID} = ?1)"),
        params![id.as_str()],
        |row| row.get(0),
    )
}

fn group_exists(tx: &Transaction, id: &GroupId) -> Result<bool, rusqlite::Error> {
    tx.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {GROUPS} WHERE {ID} = ?1)"),
        params![id.as_str()],
        |row| row.get(0),
    )
}

impl SqliteRepository {
    /// when called, opens a data base connection
    pub fn new(db_config: &config::Database) -> Result<Self, RepoError> {
        let db = db::open(db_config)?;
        Ok(Self::from_existing_conn(db))
    }

    pub fn from_existing_conn(db: Connection) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, RepoError> {
        self.db
            .lock()
            .map_err(|e| RepoError::Internal(anyhow!("repository lock poisoned: {e}")))
    }

    fn load_saved_tracks(db: &Connection, id: &UserId) -> Result<HashSet<Track>, RepoError> {
        let mut stmt = db.prepare(&format!(
            "SELECT {TRACK_ID}, {TITLE}, {ARTIST}, {ALBUM} FROM {SAVED_TRACKS} WHERE {USER_ID} = ?1"
        ))?;

        let tracks = stmt
            .query_map(params![id.as_str()], |row| {
                Ok(Track::with_metadata(
                    TrackId(row.get(0)?),
                    TrackMetadata {
                        title: row.get(1)?,
                        artist: row.get(2)?,
                        album: row.get(3)?,
                    },
                ))
            })?
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(tracks)
    }

    fn load_user_groups(db: &Connection, id: &UserId) -> Result<HashSet<GroupId>, RepoError> {
        let mut stmt = db.prepare(&format!(
            "SELECT {GROUP_ID} FROM {MEMBERSHIPS} WHERE {USER_ID} = ?1"
        ))?;

        let groups = stmt
            .query_map(params![id.as_str()], |row| Ok(GroupId(row.get(0)?)))?
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(groups)
    }

    fn load_members(db: &Connection, id: &GroupId) -> Result<HashSet<UserId>, RepoError> {
        let mut stmt = db.prepare(&format!(
            "SELECT {USER_ID} FROM {MEMBERSHIPS} WHERE {GROUP_ID} = ?1"
        ))?;

        let members = stmt
            .query_map(params![id.as_str()], |row| Ok(UserId(row.get(0)?)))?
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(members)
    }
}

impl Repository for SqliteRepository {
    fn get_user(&self, id: &UserId) -> Result<Option<User>, RepoError> {
        let db = self.conn()?;

        let refreshed_at: Option<Option<SecondsSinceUnix>> = db
            .query_row(
                &format!("SELECT {REFRESHED_AT} FROM {USERS} WHERE {ID} = ?1"),
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(refreshed_at) = refreshed_at else {
            return Ok(None);
        };

        Ok(Some(User {
            id: id.clone(),
            saved_tracks: Self::load_saved_tracks(&db, id)?,
            groups: Self::load_user_groups(&db, id)?,
            refreshed_at,
        }))
    }

    fn create_user(&self, user: &User) -> Result<(), RepoError> {
        let mut db = self.conn()?;
        let tx = db.transaction()?;

        tx.execute(
            &format!("INSERT INTO {USERS} ({ID}, {REFRESHED_AT}) VALUES (?1, ?2)"),
            params![user.id.as_str(), user.refreshed_at],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                RepoError::Conflict(format!("user {}", user.id))
            } else {
                RepoError::Database(e)
            }
        })?;

        for track in &user.saved_tracks {
            insert_saved_track(&tx, &user.id, track)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn set_user_saved_tracks(
        &self,
        id: &UserId,
        tracks: &HashSet<Track>,
    ) -> Result<(), RepoError> {
        let time_secs = system_time_to_i64(SystemTime::now()).map_err(RepoError::Internal)?;

        let mut db = self.conn()?;
        let tx = db.transaction()?;

        if !user_exists(&tx, id)? {
            return Err(RepoError::UserNotFound(id.clone()));
        }

        tx.execute(
            &format!("DELETE FROM {SAVED_TRACKS} WHERE {USER_ID} = ?1"),
            params![id.as_str()],
        )?;

        for track in tracks {
            insert_saved_track(&tx, id, track)?;
        }

        tx.execute(
            &format!("UPDATE {USERS} SET {REFRESHED_AT} = ?1 WHERE {ID} = ?2"),
            params![time_secs, id.as_str()],
        )?;

        // dropping an uncommitted transaction rolls it back
        tx.commit()?;
        Ok(())
    }

    fn get_group(&self, id: &GroupId) -> Result<Option<Group>, RepoError> {
        let db = self.conn()?;

        let name: Option<String> = db
            .query_row(
                &format!("SELECT {NAME} FROM {GROUPS} WHERE {ID} = ?1"),
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(name) = name else {
            return Ok(None);
        };

        Ok(Some(Group {
            id: id.clone(),
            name,
            members: Self::load_members(&db, id)?,
        }))
    }

    fn create_group(&self, group: &Group) -> Result<(), RepoError> {
        let time_secs = system_time_to_i64(SystemTime::now()).map_err(RepoError::Internal)?;

        let mut db = self.conn()?;
        let tx = db.transaction()?;

        tx.execute(
            &format!("INSERT INTO {GROUPS} ({ID}, {NAME}, {CREATED_AT}) VALUES (?1, ?2, ?3)"),
            params![group.id.as_str(), group.name, time_secs],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                RepoError::Conflict(format!("group {}", group.id))
            } else {
                RepoError::Database(e)
            }
        })?;

        for member in &group.members {
            if !user_exists(&tx, member)? {
                return Err(RepoError::UserNotFound(member.clone()));
            }
            tx.execute(
                &format!("INSERT INTO {MEMBERSHIPS} ({GROUP_ID}, {USER_ID}) VALUES (?1, ?2)"),
                params![group.id.as_str(), member.as_str()],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn register_user_with_group(&self, user: &UserId, group: &GroupId) -> Result<(), RepoError> {
        let mut db = self.conn()?;
        let tx = db.transaction()?;

        if !group_exists(&tx, group)? {
            return Err(RepoError::GroupNotFound(group.clone()));
        }
        if !user_exists(&tx, user)? {
            return Err(RepoError::UserNotFound(user.clone()));
        }

        tx.execute(
            &format!(
                "INSERT OR IGNORE INTO {MEMBERSHIPS} ({GROUP_ID}, {USER_ID}) VALUES (?1, ?2)"
            ),
            params![group.as_str(), user.as_str()],
        )?;

        tx.commit()?;
        Ok(())
    }
}

fn insert_saved_track(tx: &Transaction, user: &UserId, track: &Track) -> Result<(), RepoError> {
    tx.execute(
        &format!(
            "INSERT INTO {SAVED_TRACKS} ({USER_ID}, {TRACK_ID}, {TITLE}, {ARTIST}, {ALBUM})
             VALUES (?1, ?2, ?3, ?4, ?5)"
        ),
        params![
            user.as_str(),
            track.id.as_str(),
            track.metadata.title,
            track.metadata.artist,
            track.metadata.album
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rusqlite::{Connection, params};

    use crate::{
        domain::{
            group::Group,
            ids::{GroupId, UserId},
            track::{Track, TrackMetadata},
            user::User,
        },
        storage::{
            Repository,
            error::RepoError,
            schema::{self, *},
            sqlite::SqliteRepository,
        },
    };

    fn setup_repo() -> anyhow::Result<SqliteRepository> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn)?;
        Ok(SqliteRepository::from_existing_conn(conn))
    }

    fn tracks(ids: &[&str]) -> HashSet<Track> {
        ids.iter().map(|id| Track::new(*id)).collect()
    }

    #[test]
    fn test_get_missing_user() -> anyhow::Result<()> {
        let repo = setup_repo()?;
        assert!(repo.get_user(&UserId::from("ghost"))?.is_none());
        Ok(())
    }

    #[test]
    fn test_create_and_get_user() -> anyhow::Result<()> {
        let repo = setup_repo()?;
        let alice = UserId::from("alice");

        repo.create_user(&User::new(alice.clone()))?;

        let user = repo.get_user(&alice)?.unwrap();
        assert_eq!(user.id, alice);
        assert!(user.saved_tracks.is_empty());
        assert!(user.groups.is_empty());
        assert_eq!(user.refreshed_at, None);

        Ok(())
    }

    #[test]
    fn test_create_user_twice_conflicts() -> anyhow::Result<()> {
        let repo = setup_repo()?;
        let alice = User::new(UserId::from("alice"));

        repo.create_user(&alice)?;
        let err = repo.create_user(&alice).unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));

        Ok(())
    }

    #[test]
    fn test_set_saved_tracks_replaces_previous_set() -> anyhow::Result<()> {
        let repo = setup_repo()?;
        let alice = UserId::from("alice");
        repo.create_user(&User::new(alice.clone()))?;

        repo.set_user_saved_tracks(&alice, &tracks(&["a", "b", "c"]))?;
        repo.set_user_saved_tracks(&alice, &tracks(&["c", "d"]))?;

        let user = repo.get_user(&alice)?.unwrap();
        assert_eq!(user.saved_tracks, tracks(&["c", "d"]));
        assert!(user.refreshed_at.is_some());

        Ok(())
    }

    #[test]
    fn test_saved_track_metadata_is_kept() -> anyhow::Result<()> {
        let repo = setup_repo()?;
        let alice = UserId::from("alice");
        repo.create_user(&User::new(alice.clone()))?;

        let metadata = TrackMetadata {
            title: Some("Song".into()),
            artist: Some("Band".into()),
            album: Some("Record".into()),
        };
        let saved = HashSet::from([Track::with_metadata("spotify:track:1", metadata.clone())]);
        repo.set_user_saved_tracks(&alice, &saved)?;

        let user = repo.get_user(&alice)?.unwrap();
        let track = user.saved_tracks.iter().next().unwrap();
        assert_eq!(track.metadata, metadata);

        Ok(())
    }

    #[test]
    fn test_set_saved_tracks_for_unknown_user() -> anyhow::Result<()> {
        let repo = setup_repo()?;

        let err = repo
            .set_user_saved_tracks(&UserId::from("ghost"), &tracks(&["a"]))
            .unwrap_err();
        assert!(matches!(err, RepoError::UserNotFound(_)));

        Ok(())
    }

    #[test]
    fn test_create_group_and_conflict() -> anyhow::Result<()> {
        let repo = setup_repo()?;
        let id = GroupId::from("AbCd1234");

        repo.create_group(&Group::new(id.clone(), "Road Trip"))?;

        let group = repo.get_group(&id)?.unwrap();
        assert_eq!(group.name, "Road Trip");
        assert!(group.members.is_empty());

        let err = repo
            .create_group(&Group::new(id.clone(), "Other"))
            .unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
        assert_eq!(repo.get_group(&id)?.unwrap().name, "Road Trip");

        Ok(())
    }

    #[test]
    fn test_register_user_with_group_is_idempotent() -> anyhow::Result<()> {
        let repo = setup_repo()?;
        let alice = UserId::from("alice");
        let id = GroupId::from("AbCd1234");
        repo.create_user(&User::new(alice.clone()))?;
        repo.create_group(&Group::new(id.clone(), "Road Trip"))?;

        repo.register_user_with_group(&alice, &id)?;
        repo.register_user_with_group(&alice, &id)?;

        let group = repo.get_group(&id)?.unwrap();
        assert_eq!(group.members, HashSet::from([alice.clone()]));

        let user = repo.get_user(&alice)?.unwrap();
        assert_eq!(user.groups, HashSet::from([id]));

        Ok(())
    }

    #[test]
    fn test_register_with_missing_group_or_user() -> anyhow::Result<()> {
        let repo = setup_repo()?;
        let alice = UserId::from("alice");
        let id = GroupId::from("AbCd1234");
        repo.create_user(&User::new(alice.clone()))?;

        let err = repo.register_user_with_group(&alice, &id).unwrap_err();
        assert!(matches!(err, RepoError::GroupNotFound(_)));

        repo.create_group(&Group::new(id.clone(), "Road Trip"))?;
        let err = repo
            .register_user_with_group(&UserId::from("ghost"), &id)
            .unwrap_err();
        assert!(matches!(err, RepoError::UserNotFound(_)));

        Ok(())
    }

    #[test]
    fn test_failed_replace_keeps_previous_tracks() -> anyhow::Result<()> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn)?;
        // reject one specific track so the replace fails half way through
        conn.execute_batch(&format!(
            "CREATE TRIGGER reject_poison BEFORE INSERT ON {SAVED_TRACKS}
             WHEN NEW.{TRACK_ID} = 'poison'
             BEGIN SELECT RAISE(ABORT, 'poisoned track'); END;"
        ))?;
        conn.execute(
            &format!("INSERT INTO {USERS} ({ID}) VALUES (?1)"),
            params!["alice"],
        )?;
        let repo = SqliteRepository::from_existing_conn(conn);
        let alice = UserId::from("alice");

        repo.set_user_saved_tracks(&alice, &tracks(&["a", "b"]))?;
        assert!(
            repo.set_user_saved_tracks(&alice, &tracks(&["c", "poison"]))
                .is_err()
        );

        let user = repo.get_user(&alice)?.unwrap();
        assert_eq!(user.saved_tracks, tracks(&["a", "b"]));

        Ok(())
    }
}
