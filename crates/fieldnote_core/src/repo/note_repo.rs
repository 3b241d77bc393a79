//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for notes (issues are notes too).
//! - Record version and activity rows for every write.
//!
//! # Invariants
//! - Every write runs in one immediate transaction together with its
//!   version row, its activity row and the parent node touch.
//! - List order is deterministic: `updated_at DESC, id ASC`.
//! - Versions store the text as it was before the write.

use crate::db::NOW_MS_SQL;
use crate::fields::TextDocument;
use crate::model::activity::ChangeAction;
use crate::model::category::CategoryId;
use crate::model::node::NodeId;
use crate::model::note::{Note, NoteId};
use crate::repo::history_repo::{insert_activity, insert_version, ChangeContext};
use crate::repo::node_repo::touch_node;
use crate::repo::{ensure_schema_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rusqlite::{Transaction, TransactionBehavior};

const NOTES_LIMIT_MAX: u32 = 500;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    node_id,
    category_id,
    author,
    text,
    created_at,
    updated_at
FROM notes";

/// Query options for note list use-cases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    pub node_id: Option<NodeId>,
    pub category_id: Option<CategoryId>,
    /// Skips notes filed under this category.
    pub exclude_category_id: Option<CategoryId>,
    /// Only notes with `created_at >= created_since`.
    pub created_since: Option<i64>,
    /// Only notes with `updated_at >= updated_since`.
    pub updated_since: Option<i64>,
    /// Maximum rows to return. `None` means no limit; values clamp to 500.
    pub limit: Option<u32>,
    pub offset: u32,
}

pub trait NoteRepository {
    /// Inserts one note and returns the stored row.
    fn create_note(&self, note: &Note, context: ChangeContext<'_>) -> RepoResult<Note>;
    /// Replaces node, category and text of an existing note.
    fn update_note(&self, note: &Note, context: ChangeContext<'_>) -> RepoResult<Note>;
    fn delete_note(&self, id: NoteId, context: ChangeContext<'_>) -> RepoResult<()>;
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
}

pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn require_note(&self, id: NoteId) -> RepoResult<Note> {
        self.get_note(id)?
            .ok_or_else(|| RepoError::not_found("note", id))
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, note: &Note, context: ChangeContext<'_>) -> RepoResult<Note> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO notes (id, node_id, category_id, author, text)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                note.id.to_string(),
                note.node_id.to_string(),
                note.category_id,
                note.author.as_deref(),
                note.text.as_str(),
            ],
        )?;
        insert_version(&tx, note.id, ChangeAction::Create, context.user, "")?;
        insert_activity(&tx, context, note.id, ChangeAction::Create)?;
        touch_node(&tx, note.node_id)?;
        tx.commit()?;

        self.require_note(note.id)
    }

    fn update_note(&self, note: &Note, context: ChangeContext<'_>) -> RepoResult<Note> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let (previous_node, previous_text) = load_node_and_text(&tx, note.id)?
            .ok_or_else(|| RepoError::not_found("note", note.id))?;

        tx.execute(
            &format!(
                "UPDATE notes
                 SET node_id = ?2,
                     category_id = ?3,
                     text = ?4,
                     updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![
                note.id.to_string(),
                note.node_id.to_string(),
                note.category_id,
                note.text.as_str(),
            ],
        )?;
        insert_version(
            &tx,
            note.id,
            ChangeAction::Update,
            context.user,
            &previous_text,
        )?;
        insert_activity(&tx, context, note.id, ChangeAction::Update)?;
        touch_node(&tx, note.node_id)?;
        if previous_node != note.node_id {
            touch_node(&tx, previous_node)?;
        }
        tx.commit()?;

        self.require_note(note.id)
    }

    fn delete_note(&self, id: NoteId, context: ChangeContext<'_>) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let (node_id, previous_text) =
            load_node_and_text(&tx, id)?.ok_or_else(|| RepoError::not_found("note", id))?;

        tx.execute("DELETE FROM notes WHERE id = ?1;", [id.to_string()])?;
        insert_version(&tx, id, ChangeAction::Destroy, context.user, &previous_text)?;
        insert_activity(&tx, context, id, ChangeAction::Destroy)?;
        touch_node(&tx, node_id)?;
        tx.commit()?;
        Ok(())
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }

    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(node_id) = query.node_id {
            sql.push_str(" AND node_id = ?");
            bind_values.push(Value::Text(node_id.to_string()));
        }
        if let Some(category_id) = query.category_id {
            sql.push_str(" AND category_id = ?");
            bind_values.push(Value::Integer(category_id));
        }
        if let Some(category_id) = query.exclude_category_id {
            sql.push_str(" AND category_id <> ?");
            bind_values.push(Value::Integer(category_id));
        }
        if let Some(since) = query.created_since {
            sql.push_str(" AND created_at >= ?");
            bind_values.push(Value::Integer(since));
        }
        if let Some(since) = query.updated_since {
            sql.push_str(" AND updated_at >= ?");
            bind_values.push(Value::Integer(since));
        }

        sql.push_str(" ORDER BY updated_at DESC, id ASC");
        // SQLite only accepts OFFSET after LIMIT; -1 means unbounded.
        let limit = normalize_note_limit(query.limit).map_or(-1, i64::from);
        if limit >= 0 || query.offset > 0 {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(limit));
        }
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }
}

/// Normalizes list limit; `Some(0)` and `None` both mean unbounded.
pub fn normalize_note_limit(limit: Option<u32>) -> Option<u32> {
    match limit {
        Some(0) | None => None,
        Some(value) => Some(value.min(NOTES_LIMIT_MAX)),
    }
}

fn load_node_and_text(conn: &Connection, id: NoteId) -> RepoResult<Option<(NodeId, String)>> {
    let row = conn
        .query_row(
            "SELECT node_id, text FROM notes WHERE id = ?1;",
            [id.to_string()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;
    match row {
        Some((node_id, text)) => Ok(Some((parse_uuid(&node_id, "notes.node_id")?, text))),
        None => Ok(None),
    }
}

pub(crate) fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id_text: String = row.get("id")?;
    let node_text: String = row.get("node_id")?;
    let text: String = row.get("text")?;

    Ok(Note {
        id: parse_uuid(&id_text, "notes.id")?,
        node_id: parse_uuid(&node_text, "notes.node_id")?,
        category_id: row.get("category_id")?,
        author: row.get("author")?,
        text: TextDocument::new(text),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::normalize_note_limit;

    #[test]
    fn limit_normalization_clamps_and_unbounds() {
        assert_eq!(normalize_note_limit(None), None);
        assert_eq!(normalize_note_limit(Some(0)), None);
        assert_eq!(normalize_note_limit(Some(20)), Some(20));
        assert_eq!(normalize_note_limit(Some(10_000)), Some(500));
    }
}
