//! Evidence linking an issue to an affected node.

use crate::fields::{HasFields, TextDocument};
use crate::model::node::NodeId;
use crate::model::note::NoteId;
use crate::model::validation::{ValidationError, ValidationErrors};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type EvidenceId = Uuid;

/// Proof that an issue affects one node. Content uses the same field markup
/// as notes (for example `#[Output]#`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: EvidenceId,
    pub node_id: NodeId,
    pub issue_id: NoteId,
    pub author: Option<String>,
    pub content: TextDocument,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Evidence {
    pub fn new(node_id: NodeId, issue_id: NoteId, content: impl Into<TextDocument>) -> Self {
        Self {
            id: Uuid::new_v4(),
            node_id,
            issue_id,
            author: None,
            content: content.into(),
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self, max_text_length: usize) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        if let Err(err) = self.content.validate_length(max_text_length) {
            errors.push(ValidationError::from(err));
        }
        ValidationErrors::check(errors)
    }
}

impl HasFields for Evidence {
    fn document(&self) -> &TextDocument {
        &self.content
    }

    fn document_mut(&mut self) -> &mut TextDocument {
        &mut self.content
    }
}
