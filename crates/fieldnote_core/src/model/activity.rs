//! Activity feed entries and text version history.
//!
//! # Invariants
//! - Activities and versions outlive the record they describe; deleting a
//!   note keeps its `trackable_id`/`note_id` references intact.
//! - A version stores the text as it was *before* its event (empty for
//!   `create`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackableType {
    Note,
    Issue,
    Evidence,
}

impl TrackableType {
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Issue => "issue",
            Self::Evidence => "evidence",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "note" => Some(Self::Note),
            "issue" => Some(Self::Issue),
            "evidence" => Some(Self::Evidence),
            _ => None,
        }
    }
}

/// What happened to a tracked record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Create,
    Update,
    Destroy,
}

impl ChangeAction {
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Destroy => "destroy",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "destroy" => Some(Self::Destroy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub trackable_type: TrackableType,
    pub trackable_id: Uuid,
    pub action: ChangeAction,
    pub user: Option<String>,
    pub created_at: i64,
}

/// One entry of a note's change history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteVersion {
    pub id: i64,
    pub note_id: Uuid,
    pub event: ChangeAction,
    /// User responsible for the change.
    pub whodunnit: Option<String>,
    /// Text before the change.
    pub text: String,
    pub created_at: i64,
}
