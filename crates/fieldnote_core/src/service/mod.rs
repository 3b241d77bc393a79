//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Resolve configured categories and validate references before writes.
//! - Keep CLI/HTTP layers decoupled from storage details.
//!
//! # Invariants
//! - A rejected save reports every violated rule in one
//!   [`ServiceError::Validation`].
//! - Services receive [`crate::config::CoreConfig`] explicitly.

use crate::model::validation::ValidationErrors;
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::evidence_repo::{EvidenceRepository, SqliteEvidenceRepository};
use crate::repo::history_repo::{HistoryRepository, SqliteHistoryRepository};
use crate::repo::node_repo::{NodeRepository, SqliteNodeRepository};
use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository};
use crate::repo::{RepoError, RepoResult};
use crate::search::like::{SearchError, SqliteTextSearch, TextSearch};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod evidence_service;
pub mod issue_service;
pub mod node_service;
pub mod note_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error shared by every use-case.
#[derive(Debug)]
pub enum ServiceError {
    /// Save rejected; carries every reason.
    Validation(ValidationErrors),
    /// Target record does not exist.
    NotFound { entity: &'static str, id: String },
    Repo(RepoError),
    Search(SearchError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl ServiceError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Messages suitable for an error list shown to the user.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(errors) => errors.messages(),
            other => vec![other.to_string()],
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Search(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Search(err) => Some(err),
            Self::NotFound { .. } | Self::InconsistentState(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Validation(errors) => Self::Validation(errors),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<SearchError> for ServiceError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

/// Repository bundle consumed by services.
pub trait Store {
    type Categories: CategoryRepository;
    type Nodes: NodeRepository;
    type Notes: NoteRepository;
    type Evidence: EvidenceRepository;
    type History: HistoryRepository;
    type Search: TextSearch;

    fn categories(&self) -> &Self::Categories;
    fn nodes(&self) -> &Self::Nodes;
    fn notes(&self) -> &Self::Notes;
    fn evidence(&self) -> &Self::Evidence;
    fn history(&self) -> &Self::History;
    fn search(&self) -> &Self::Search;
}

/// [`Store`] backed by one migrated SQLite connection.
pub struct SqliteStore<'conn> {
    categories: SqliteCategoryRepository<'conn>,
    nodes: SqliteNodeRepository<'conn>,
    notes: SqliteNoteRepository<'conn>,
    evidence: SqliteEvidenceRepository<'conn>,
    history: SqliteHistoryRepository<'conn>,
    search: SqliteTextSearch<'conn>,
}

impl<'conn> SqliteStore<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            categories: SqliteCategoryRepository::try_new(conn)?,
            nodes: SqliteNodeRepository::try_new(conn)?,
            notes: SqliteNoteRepository::try_new(conn)?,
            evidence: SqliteEvidenceRepository::try_new(conn)?,
            history: SqliteHistoryRepository::try_new(conn)?,
            search: SqliteTextSearch::new(conn),
        })
    }
}

impl<'conn> Store for SqliteStore<'conn> {
    type Categories = SqliteCategoryRepository<'conn>;
    type Nodes = SqliteNodeRepository<'conn>;
    type Notes = SqliteNoteRepository<'conn>;
    type Evidence = SqliteEvidenceRepository<'conn>;
    type History = SqliteHistoryRepository<'conn>;
    type Search = SqliteTextSearch<'conn>;

    fn categories(&self) -> &Self::Categories {
        &self.categories
    }

    fn nodes(&self) -> &Self::Nodes {
        &self.nodes
    }

    fn notes(&self) -> &Self::Notes {
        &self.notes
    }

    fn evidence(&self) -> &Self::Evidence {
        &self.evidence
    }

    fn history(&self) -> &Self::History {
        &self.history
    }

    fn search(&self) -> &Self::Search {
        &self.search
    }
}

/// Lets several services share one store by reference.
impl<S: Store> Store for &S {
    type Categories = S::Categories;
    type Nodes = S::Nodes;
    type Notes = S::Notes;
    type Evidence = S::Evidence;
    type History = S::History;
    type Search = S::Search;

    fn categories(&self) -> &Self::Categories {
        (**self).categories()
    }

    fn nodes(&self) -> &Self::Nodes {
        (**self).nodes()
    }

    fn notes(&self) -> &Self::Notes {
        (**self).notes()
    }

    fn evidence(&self) -> &Self::Evidence {
        (**self).evidence()
    }

    fn history(&self) -> &Self::History {
        (**self).history()
    }

    fn search(&self) -> &Self::Search {
        (**self).search()
    }
}
