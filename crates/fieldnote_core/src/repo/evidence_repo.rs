//! Evidence repository.
//!
//! # Invariants
//! - Writes record an `evidence` activity in the same transaction.
//! - Per-issue listing is ordered by node label, then creation time.

use crate::db::NOW_MS_SQL;
use crate::fields::TextDocument;
use crate::model::activity::ChangeAction;
use crate::model::evidence::{Evidence, EvidenceId};
use crate::model::node::{Node, NodeId};
use crate::model::note::NoteId;
use crate::repo::history_repo::{insert_activity, ChangeContext};
use crate::repo::node_repo::{parse_node_row, touch_node};
use crate::repo::{ensure_schema_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite::{Transaction, TransactionBehavior};

const EVIDENCE_SELECT_SQL: &str = "SELECT
    e.id,
    e.node_id,
    e.issue_id,
    e.author,
    e.content,
    e.created_at,
    e.updated_at
FROM evidence e";

pub trait EvidenceRepository {
    fn create_evidence(
        &self,
        evidence: &Evidence,
        context: ChangeContext<'_>,
    ) -> RepoResult<Evidence>;
    /// Replaces the content of one evidence row.
    fn update_evidence(
        &self,
        id: EvidenceId,
        content: &str,
        context: ChangeContext<'_>,
    ) -> RepoResult<Evidence>;
    fn delete_evidence(&self, id: EvidenceId, context: ChangeContext<'_>) -> RepoResult<()>;
    fn get_evidence(&self, id: EvidenceId) -> RepoResult<Option<Evidence>>;
    fn list_for_issue(&self, issue_id: NoteId) -> RepoResult<Vec<Evidence>>;
    fn list_for_node(&self, node_id: NodeId) -> RepoResult<Vec<Evidence>>;
    /// Distinct nodes with at least one evidence of the issue, by label.
    fn affected_nodes(&self, issue_id: NoteId) -> RepoResult<Vec<Node>>;
}

pub struct SqliteEvidenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEvidenceRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn require_evidence(&self, id: EvidenceId) -> RepoResult<Evidence> {
        self.get_evidence(id)?
            .ok_or_else(|| RepoError::not_found("evidence", id))
    }

    fn query_evidence(&self, filter: &str, key: String) -> RepoResult<Vec<Evidence>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVIDENCE_SELECT_SQL}
             INNER JOIN nodes n ON n.id = e.node_id
             WHERE {filter} = ?1
             ORDER BY n.label COLLATE NOCASE ASC, e.created_at ASC, e.id ASC;"
        ))?;
        let mut rows = stmt.query([key])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_evidence_row(row)?);
        }
        Ok(items)
    }
}

impl EvidenceRepository for SqliteEvidenceRepository<'_> {
    fn create_evidence(
        &self,
        evidence: &Evidence,
        context: ChangeContext<'_>,
    ) -> RepoResult<Evidence> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO evidence (id, node_id, issue_id, author, content)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                evidence.id.to_string(),
                evidence.node_id.to_string(),
                evidence.issue_id.to_string(),
                evidence.author.as_deref(),
                evidence.content.as_str(),
            ],
        )?;
        insert_activity(&tx, context, evidence.id, ChangeAction::Create)?;
        touch_node(&tx, evidence.node_id)?;
        tx.commit()?;

        self.require_evidence(evidence.id)
    }

    fn update_evidence(
        &self,
        id: EvidenceId,
        content: &str,
        context: ChangeContext<'_>,
    ) -> RepoResult<Evidence> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            &format!(
                "UPDATE evidence
                 SET content = ?2,
                     updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![id.to_string(), content],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("evidence", id));
        }
        insert_activity(&tx, context, id, ChangeAction::Update)?;
        tx.commit()?;

        self.require_evidence(id)
    }

    fn delete_evidence(&self, id: EvidenceId, context: ChangeContext<'_>) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let node_id: Option<String> = tx
            .query_row(
                "SELECT node_id FROM evidence WHERE id = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(node_id) = node_id else {
            return Err(RepoError::not_found("evidence", id));
        };

        tx.execute("DELETE FROM evidence WHERE id = ?1;", [id.to_string()])?;
        insert_activity(&tx, context, id, ChangeAction::Destroy)?;
        touch_node(&tx, parse_uuid(&node_id, "evidence.node_id")?)?;
        tx.commit()?;
        Ok(())
    }

    fn get_evidence(&self, id: EvidenceId) -> RepoResult<Option<Evidence>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EVIDENCE_SELECT_SQL} WHERE e.id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_evidence_row(row)?));
        }
        Ok(None)
    }

    fn list_for_issue(&self, issue_id: NoteId) -> RepoResult<Vec<Evidence>> {
        self.query_evidence("e.issue_id", issue_id.to_string())
    }

    fn list_for_node(&self, node_id: NodeId) -> RepoResult<Vec<Evidence>> {
        self.query_evidence("e.node_id", node_id.to_string())
    }

    fn affected_nodes(&self, issue_id: NoteId) -> RepoResult<Vec<Node>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT n.id, n.label, n.kind, n.parent_id, n.position,
                    n.created_at, n.updated_at
             FROM nodes n
             INNER JOIN evidence e ON e.node_id = n.id
             WHERE e.issue_id = ?1
             ORDER BY n.label COLLATE NOCASE ASC, n.id ASC;",
        )?;
        let mut rows = stmt.query([issue_id.to_string()])?;
        let mut nodes = Vec::new();
        while let Some(row) = rows.next()? {
            nodes.push(parse_node_row(row)?);
        }
        Ok(nodes)
    }
}

fn parse_evidence_row(row: &Row<'_>) -> RepoResult<Evidence> {
    let id_text: String = row.get("id")?;
    let node_text: String = row.get("node_id")?;
    let issue_text: String = row.get("issue_id")?;
    let content: String = row.get("content")?;

    Ok(Evidence {
        id: parse_uuid(&id_text, "evidence.id")?,
        node_id: parse_uuid(&node_text, "evidence.node_id")?,
        issue_id: parse_uuid(&issue_text, "evidence.issue_id")?,
        author: row.get("author")?,
        content: TextDocument::new(content),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
