//! Activity feed and note version history.
//!
//! # Responsibility
//! - Append activity/version rows inside the caller's write transaction.
//! - Read history back in chronological order.
//!
//! # Invariants
//! - History rows are append-only and never cascade-deleted.

use crate::model::activity::{Activity, ChangeAction, NoteVersion, TrackableType};
use crate::repo::{ensure_schema_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// Who changed what, attached to every tracked write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeContext<'a> {
    pub trackable_type: TrackableType,
    pub user: Option<&'a str>,
}

impl<'a> ChangeContext<'a> {
    pub fn new(trackable_type: TrackableType, user: Option<&'a str>) -> Self {
        Self {
            trackable_type,
            user,
        }
    }
}

pub trait HistoryRepository {
    /// Lists activities of one record, oldest first.
    fn list_activities(
        &self,
        trackable_type: TrackableType,
        trackable_id: Uuid,
    ) -> RepoResult<Vec<Activity>>;
    /// Lists the most recent activities across all records, newest first.
    fn latest_activities(&self, limit: u32) -> RepoResult<Vec<Activity>>;
    /// Lists text versions of one note, oldest first.
    fn list_versions(&self, note_id: Uuid) -> RepoResult<Vec<NoteVersion>>;
}

pub struct SqliteHistoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHistoryRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl HistoryRepository for SqliteHistoryRepository<'_> {
    fn list_activities(
        &self,
        trackable_type: TrackableType,
        trackable_id: Uuid,
    ) -> RepoResult<Vec<Activity>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, trackable_type, trackable_id, action, user_name, created_at
             FROM activities
             WHERE trackable_type = ?1
               AND trackable_id = ?2
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query(params![
            trackable_type.as_db_str(),
            trackable_id.to_string()
        ])?;
        let mut activities = Vec::new();
        while let Some(row) = rows.next()? {
            activities.push(parse_activity_row(row)?);
        }
        Ok(activities)
    }

    fn latest_activities(&self, limit: u32) -> RepoResult<Vec<Activity>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, trackable_type, trackable_id, action, user_name, created_at
             FROM activities
             ORDER BY created_at DESC, id DESC
             LIMIT ?1;",
        )?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut activities = Vec::new();
        while let Some(row) = rows.next()? {
            activities.push(parse_activity_row(row)?);
        }
        Ok(activities)
    }

    fn list_versions(&self, note_id: Uuid) -> RepoResult<Vec<NoteVersion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, note_id, event, whodunnit, text, created_at
             FROM note_versions
             WHERE note_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([note_id.to_string()])?;
        let mut versions = Vec::new();
        while let Some(row) = rows.next()? {
            versions.push(parse_version_row(row)?);
        }
        Ok(versions)
    }
}

pub(crate) fn insert_activity(
    conn: &Connection,
    context: ChangeContext<'_>,
    trackable_id: Uuid,
    action: ChangeAction,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO activities (trackable_type, trackable_id, action, user_name)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            context.trackable_type.as_db_str(),
            trackable_id.to_string(),
            action.as_db_str(),
            context.user,
        ],
    )?;
    Ok(())
}

/// Records the text a note had before `event`.
pub(crate) fn insert_version(
    conn: &Connection,
    note_id: Uuid,
    event: ChangeAction,
    whodunnit: Option<&str>,
    previous_text: &str,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO note_versions (note_id, event, whodunnit, text)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            note_id.to_string(),
            event.as_db_str(),
            whodunnit,
            previous_text
        ],
    )?;
    Ok(())
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<Activity> {
    let type_text: String = row.get("trackable_type")?;
    let trackable_type = TrackableType::from_db_str(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid trackable type `{type_text}` in activities.trackable_type"
        ))
    })?;
    let action_text: String = row.get("action")?;
    let action = ChangeAction::from_db_str(&action_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid action `{action_text}` in activities.action"))
    })?;
    let trackable_id: String = row.get("trackable_id")?;

    Ok(Activity {
        id: row.get("id")?,
        trackable_type,
        trackable_id: parse_uuid(&trackable_id, "activities.trackable_id")?,
        action,
        user: row.get("user_name")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_version_row(row: &Row<'_>) -> RepoResult<NoteVersion> {
    let event_text: String = row.get("event")?;
    let event = ChangeAction::from_db_str(&event_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid event `{event_text}` in note_versions.event"))
    })?;
    let note_id: String = row.get("note_id")?;

    Ok(NoteVersion {
        id: row.get("id")?,
        note_id: parse_uuid(&note_id, "note_versions.note_id")?,
        event,
        whodunnit: row.get("whodunnit")?,
        text: row.get("text")?,
        created_at: row.get("created_at")?,
    })
}
