//! Notes and issues.
//!
//! A note is the basic unit of information: free text attached to a node,
//! written by an author and filed under a category. Its text may pack several
//! named fields using the marker syntax:
//!
//! ```text
//! #[Title]#
//! Directory Listings
//!
//! #[Description]#
//! Some directories on the server were configured [...]
//! ```
//!
//! An issue is a note in the issue category, stored under the issue library
//! node. Issues expose a title taken from their `Title` field.

use crate::config::{ISSUE_TITLE_FALLBACK, ISSUE_TITLE_FIELD};
use crate::fields::{HasFields, TextDocument};
use crate::model::category::CategoryId;
use crate::model::node::NodeId;
use crate::model::validation::{ValidationError, ValidationErrors};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable note identifier. Issues share the same id space.
pub type NoteId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub node_id: NodeId,
    pub category_id: CategoryId,
    /// Display name of the creator, if known.
    pub author: Option<String>,
    pub text: TextDocument,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl Note {
    /// Creates an unsaved note with a fresh id.
    pub fn new(node_id: NodeId, category_id: CategoryId, text: impl Into<TextDocument>) -> Self {
        Self {
            id: Uuid::new_v4(),
            node_id,
            category_id,
            author: None,
            text: text.into(),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Checks entity-local rules.
    ///
    /// Reference checks (node, category) need storage and live in services.
    pub fn validate(&self, max_text_length: usize) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        if let Err(err) = self.text.validate_length(max_text_length) {
            errors.push(ValidationError::from(err));
        }
        ValidationErrors::check(errors)
    }
}

impl HasFields for Note {
    fn document(&self) -> &TextDocument {
        &self.text
    }

    fn document_mut(&mut self) -> &mut TextDocument {
        &mut self.text
    }
}

/// Issue view over a note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Issue(Note);

impl Issue {
    pub fn from_note(note: Note) -> Self {
        Self(note)
    }

    pub fn id(&self) -> NoteId {
        self.0.id
    }

    pub fn note(&self) -> &Note {
        &self.0
    }

    pub fn note_mut(&mut self) -> &mut Note {
        &mut self.0
    }

    pub fn into_note(self) -> Note {
        self.0
    }

    /// Value of the `Title` field, or a fixed placeholder when absent.
    pub fn title(&self) -> &str {
        self.title_or(ISSUE_TITLE_FIELD, ISSUE_TITLE_FALLBACK)
    }

    /// Whether the `Title` field is actually present.
    pub fn has_title(&self) -> bool {
        self.field(ISSUE_TITLE_FIELD).is_some()
    }

    /// Title lookup with a configured field name and placeholder.
    pub fn title_or<'a>(&'a self, field: &str, fallback: &'a str) -> &'a str {
        self.field_or(field, fallback)
    }
}

impl HasFields for Issue {
    fn document(&self) -> &TextDocument {
        &self.0.text
    }

    fn document_mut(&mut self) -> &mut TextDocument {
        &mut self.0.text
    }
}

#[cfg(test)]
mod tests {
    use super::{Issue, Note};
    use crate::config::ISSUE_TITLE_FALLBACK;
    use crate::fields::HasFields;
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    fn issue(text: &str) -> Issue {
        Issue::from_note(Note::new(Uuid::new_v4(), 2, text))
    }

    #[test]
    fn title_reads_title_field() {
        let issue = issue("#[Title]#\nMy Title");
        assert_eq!(issue.title(), "My Title");
        assert!(issue.has_title());
    }

    #[test]
    fn title_falls_back_when_field_missing() {
        let issue = issue("#[Not The Title]#\nMy Title");
        assert_eq!(issue.title(), ISSUE_TITLE_FALLBACK);
        assert_eq!(issue.title(), "This issue doesn't provide a #[Title]# field");
        assert!(!issue.has_title());
    }

    #[test]
    fn set_field_updates_issue_text() {
        let mut issue = issue("#[Title]#\nSomething");
        issue.set_field("Title", "New title").unwrap();
        assert_eq!(issue.fields()["Title"], "New title");
        assert_eq!(issue.note().text.as_str(), "#[Title]#\nNew title");
    }

    #[test]
    fn validate_enforces_text_length() {
        let ok = Note::new(Uuid::new_v4(), 1, "a".repeat(65_535));
        assert!(ok.validate(65_535).is_ok());

        let too_long = Note::new(Uuid::new_v4(), 1, "a".repeat(65_536));
        let err = too_long.validate(65_535).unwrap_err();
        assert_eq!(
            err.errors(),
            &[ValidationError::TextTooLong {
                length: 65_536,
                max: 65_535
            }]
        );
    }

    #[test]
    fn field_or_text_previews_untitled_note() {
        let note = Note::new(Uuid::new_v4(), 1, "A rather long note body without fields");
        assert_eq!(note.field_or_text("Title"), "A rather long not...");
    }
}
