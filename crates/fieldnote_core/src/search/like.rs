//! `LIKE`-based substring search over note text.
//!
//! # Responsibility
//! - Match a term anywhere in the raw text of notes, ignoring ASCII case.
//! - Return typed notes ordered by last modification.
//!
//! # Invariants
//! - `%`, `_` and `\` in the term match literally.
//! - Result ordering is deterministic: `updated_at DESC, id ASC`.
//! - Blank terms return no rows without touching the database.

use crate::db::DbError;
use crate::model::category::CategoryId;
use crate::model::note::Note;
use crate::repo::note_repo::parse_note_row;
use crate::repo::RepoError;
use log::info;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_SEARCH_LIMIT: u32 = 50;

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug)]
pub enum SearchError {
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// Which notes a search looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Every note.
    All,
    /// Notes filed under one category (issues, for example).
    Category(CategoryId),
    /// Notes outside one category (plain notes, excluding issues).
    ExcludingCategory(CategoryId),
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// User query text; matched as one literal substring.
    pub text: String,
    pub scope: SearchScope,
    /// Maximum number of hits; `0` returns nothing.
    pub limit: u32,
}

impl SearchQuery {
    /// Creates a query over every note with the default limit.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            scope: SearchScope::All,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// Search seam used by services.
pub trait TextSearch {
    fn search(&self, query: &SearchQuery) -> SearchResult<Vec<Note>>;
}

/// [`TextSearch`] over a migrated SQLite connection.
pub struct SqliteTextSearch<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTextSearch<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TextSearch for SqliteTextSearch<'_> {
    fn search(&self, query: &SearchQuery) -> SearchResult<Vec<Note>> {
        search_notes(self.conn, query)
    }
}

/// Searches note text for `query.text`, most recently updated first.
pub fn search_notes(conn: &Connection, query: &SearchQuery) -> SearchResult<Vec<Note>> {
    let term = query.text.trim();
    if term.is_empty() || query.limit == 0 {
        return Ok(Vec::new());
    }

    let mut sql = String::from(
        "SELECT
            id,
            node_id,
            category_id,
            author,
            text,
            created_at,
            updated_at
         FROM notes
         WHERE text LIKE ? ESCAPE '\\'",
    );
    let mut bind_values: Vec<Value> = vec![Value::Text(like_pattern(term))];

    match query.scope {
        SearchScope::All => {}
        SearchScope::Category(category_id) => {
            sql.push_str(" AND category_id = ?");
            bind_values.push(Value::Integer(category_id));
        }
        SearchScope::ExcludingCategory(category_id) => {
            sql.push_str(" AND category_id <> ?");
            bind_values.push(Value::Integer(category_id));
        }
    }

    sql.push_str(" ORDER BY updated_at DESC, id ASC LIMIT ?");
    bind_values.push(Value::Integer(i64::from(query.limit)));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut hits = Vec::new();
    while let Some(row) = rows.next()? {
        hits.push(parse_note_row(row)?);
    }

    info!(
        "event=search module=search status=ok scope={} hits={}",
        scope_label(query.scope),
        hits.len()
    );
    Ok(hits)
}

/// Wraps `term` in `%...%` with LIKE wildcards escaped.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn scope_label(scope: SearchScope) -> &'static str {
    match scope {
        SearchScope::All => "all",
        SearchScope::Category(_) => "category",
        SearchScope::ExcludingCategory(_) => "excluding_category",
    }
}
