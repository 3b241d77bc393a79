//! Node tree repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for the hierarchical node tree.
//! - Keep SQL details and ordering behavior inside repository boundary.
//!
//! # Invariants
//! - Child listing is deterministic: `position ASC, label ASC, id ASC`.
//! - New nodes are appended after their last sibling.
//! - Deleting a node removes its subtree, notes and evidence (FK cascade).

use crate::db::NOW_MS_SQL;
use crate::model::node::{Node, NodeId, NodeKind};
use crate::repo::{ensure_schema_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const NODE_SELECT_SQL: &str = "SELECT
    id,
    label,
    kind,
    parent_id,
    position,
    created_at,
    updated_at
FROM nodes";

pub trait NodeRepository {
    /// Creates one node under an optional parent.
    fn create_node(
        &self,
        parent_id: Option<NodeId>,
        label: &str,
        kind: NodeKind,
    ) -> RepoResult<Node>;
    fn get_node(&self, id: NodeId) -> RepoResult<Option<Node>>;
    /// Lists direct children; `None` lists root-level nodes.
    fn list_children(&self, parent_id: Option<NodeId>) -> RepoResult<Vec<Node>>;
    fn rename_node(&self, id: NodeId, label: &str) -> RepoResult<()>;
    /// Deletes one node and everything below it.
    fn delete_node(&self, id: NodeId) -> RepoResult<()>;
    /// Returns the single issue library node, if created.
    fn find_issue_library(&self) -> RepoResult<Option<Node>>;
}

pub struct SqliteNodeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNodeRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NodeRepository for SqliteNodeRepository<'_> {
    fn create_node(
        &self,
        parent_id: Option<NodeId>,
        label: &str,
        kind: NodeKind,
    ) -> RepoResult<Node> {
        let id = Uuid::new_v4();
        let position = next_position(self.conn, parent_id)?;
        self.conn.execute(
            "INSERT INTO nodes (id, label, kind, parent_id, position)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                label,
                kind.as_db_str(),
                parent_id.map(|value| value.to_string()),
                position,
            ],
        )?;
        self.get_node(id)?
            .ok_or_else(|| RepoError::not_found("node", id))
    }

    fn get_node(&self, id: NodeId) -> RepoResult<Option<Node>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NODE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_node_row(row)?));
        }
        Ok(None)
    }

    fn list_children(&self, parent_id: Option<NodeId>) -> RepoResult<Vec<Node>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NODE_SELECT_SQL}
             WHERE parent_id IS ?1
             ORDER BY position ASC, label ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([parent_id.map(|value| value.to_string())])?;
        let mut nodes = Vec::new();
        while let Some(row) = rows.next()? {
            nodes.push(parse_node_row(row)?);
        }
        Ok(nodes)
    }

    fn rename_node(&self, id: NodeId, label: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE nodes
                 SET label = ?2,
                     updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![id.to_string(), label],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("node", id));
        }
        Ok(())
    }

    fn delete_node(&self, id: NodeId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM nodes WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found("node", id));
        }
        Ok(())
    }

    fn find_issue_library(&self) -> RepoResult<Option<Node>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NODE_SELECT_SQL} WHERE kind = 'issue_library' LIMIT 1;"
        ))?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_node_row(row)?));
        }
        Ok(None)
    }
}

/// Bumps `updated_at` of one node; used when one of its notes is saved.
pub(crate) fn touch_node(conn: &Connection, id: NodeId) -> RepoResult<()> {
    conn.execute(
        &format!("UPDATE nodes SET updated_at = {NOW_MS_SQL} WHERE id = ?1;"),
        [id.to_string()],
    )?;
    Ok(())
}

fn next_position(conn: &Connection, parent_id: Option<NodeId>) -> RepoResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1
         FROM nodes
         WHERE parent_id IS ?1;",
        [parent_id.map(|value| value.to_string())],
        |row| row.get(0),
    )?;
    Ok(next)
}

pub(crate) fn parse_node_row(row: &Row<'_>) -> RepoResult<Node> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "nodes.id")?;

    let parent_id = row
        .get::<_, Option<String>>("parent_id")?
        .map(|value| parse_uuid(&value, "nodes.parent_id"))
        .transpose()?;

    let kind_text: String = row.get("kind")?;
    let kind = NodeKind::from_db_str(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid node kind `{kind_text}` in nodes.kind"))
    })?;

    Ok(Node {
        id,
        label: row.get("label")?,
        kind,
        parent_id,
        position: row.get("position")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
