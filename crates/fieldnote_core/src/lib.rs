//! Core domain logic for fieldnote.
//! This crate is the single source of truth for field markup and the
//! note/issue business invariants.

pub mod api;
pub mod config;
pub mod db;
pub mod fields;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use api::{ActionResponse, IssueView, NoteView, SearchResponse};
pub use config::{CategoryConfig, ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use fields::{
    contains_marker_line, decode, encode, is_valid_field_name, FieldError, FieldMap, HasFields,
    TextDocument, MAX_TEXT_LENGTH, UNTAGGED_FIELD,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::activity::{Activity, ChangeAction, NoteVersion, TrackableType};
pub use model::category::{Category, CategoryId};
pub use model::evidence::{Evidence, EvidenceId};
pub use model::node::{Node, NodeId, NodeKind};
pub use model::note::{Issue, Note, NoteId};
pub use model::validation::{ValidationError, ValidationErrors};
pub use repo::{RepoError, RepoResult};
pub use search::like::{search_notes, SearchError, SearchQuery, SearchResult, SearchScope};
pub use service::evidence_service::{EvidenceService, NewEvidence};
pub use service::issue_service::{IssueService, NewIssue};
pub use service::node_service::NodeService;
pub use service::note_service::{NewNote, NoteService, NoteUpdate};
pub use service::{ServiceError, ServiceResult, SqliteStore, Store};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
