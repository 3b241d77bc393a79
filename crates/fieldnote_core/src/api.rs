//! Response envelopes for CLI and HTTP adapters.
//!
//! # Responsibility
//! - Turn service results into stable serde shapes.
//! - Never expose storage or error internals beyond user-facing messages.
//!
//! # Invariants
//! - `ActionResponse.ok == errors.is_empty()`.
//! - Field maps keep document order.

use crate::config::CoreConfig;
use crate::fields::{truncate_preview, FieldMap, HasFields};
use crate::model::note::{Issue, Note};
use crate::service::ServiceResult;
use serde::{Deserialize, Serialize};

/// Outcome of a create/update/delete call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub ok: bool,
    /// Id of the created or updated record.
    pub id: Option<String>,
    /// Every reason the action was rejected.
    pub errors: Vec<String>,
}

impl ActionResponse {
    pub fn success(id: impl ToString) -> Self {
        Self {
            ok: true,
            id: Some(id.to_string()),
            errors: Vec::new(),
        }
    }

    pub fn failure(errors: Vec<String>) -> Self {
        Self {
            ok: false,
            id: None,
            errors,
        }
    }

    /// Maps any service result, using `id_of` to pick the record id.
    pub fn from_result<T, I: ToString>(
        result: &ServiceResult<T>,
        id_of: impl FnOnce(&T) -> I,
    ) -> Self {
        match result {
            Ok(value) => Self::success(id_of(value)),
            Err(err) => Self::failure(err.messages()),
        }
    }
}

/// Read model of one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteView {
    pub id: String,
    pub node_id: String,
    pub category_id: i64,
    pub author: Option<String>,
    pub text: String,
    pub fields: FieldMap,
    /// Short text for list displays.
    pub preview: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl NoteView {
    pub fn from_note(note: &Note, config: &CoreConfig) -> Self {
        Self {
            id: note.id.to_string(),
            node_id: note.node_id.to_string(),
            category_id: note.category_id,
            author: note.author.clone(),
            text: note.text.as_str().to_string(),
            fields: note.fields(),
            preview: truncate_preview(note.text.as_str(), config.preview_length),
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// Read model of one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueView {
    pub id: String,
    pub title: String,
    pub has_title: bool,
    pub author: Option<String>,
    pub text: String,
    pub fields: FieldMap,
    pub updated_at: i64,
}

impl IssueView {
    pub fn from_issue(issue: &Issue, config: &CoreConfig) -> Self {
        let title = issue.title_or(&config.issue_title_field, &config.issue_title_fallback);
        Self {
            id: issue.id().to_string(),
            title: title.to_string(),
            has_title: issue.field(&config.issue_title_field).is_some(),
            author: issue.note().author.clone(),
            text: issue.note().text.as_str().to_string(),
            fields: issue.fields(),
            updated_at: issue.note().updated_at,
        }
    }
}

/// Search response with a short summary line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse<T> {
    pub items: Vec<T>,
    pub message: String,
}

impl<T> SearchResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        let message = if items.is_empty() {
            "No results.".to_string()
        } else {
            format!("Found {} result(s).", items.len())
        };
        Self { items, message }
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionResponse, IssueView, NoteView, SearchResponse};
    use crate::config::CoreConfig;
    use crate::model::note::{Issue, Note};
    use crate::model::validation::{ValidationError, ValidationErrors};
    use crate::service::{ServiceError, ServiceResult};
    use uuid::Uuid;

    #[test]
    fn action_response_collects_every_validation_reason() {
        let result: ServiceResult<Note> = Err(ServiceError::Validation(
            ValidationErrors::check(vec![
                ValidationError::UnknownNode(Uuid::nil()),
                ValidationError::TextTooLong {
                    length: 65_536,
                    max: 65_535,
                },
            ])
            .unwrap_err(),
        ));
        let response = ActionResponse::from_result(&result, |note| note.id);
        assert!(!response.ok);
        assert_eq!(response.id, None);
        assert_eq!(response.errors.len(), 2);
        assert!(response.errors[1].contains("65536"));
    }

    #[test]
    fn action_response_serializes_success() {
        let response = ActionResponse::success("abc");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "ok": true, "id": "abc", "errors": [] })
        );
    }

    #[test]
    fn note_view_keeps_field_order() {
        let note = Note::new(Uuid::new_v4(), 1, "#[B]#\n2\n#[A]#\n1");
        let view = NoteView::from_note(&note, &CoreConfig::default());
        let json = serde_json::to_string(&view.fields).unwrap();
        assert_eq!(json, r#"{"B":"2","A":"1"}"#);
    }

    #[test]
    fn issue_view_uses_fallback_title() {
        let issue = Issue::from_note(Note::new(Uuid::new_v4(), 1, "#[Not The Title]#\nMy Title"));
        let view = IssueView::from_issue(&issue, &CoreConfig::default());
        assert_eq!(view.title, "This issue doesn't provide a #[Title]# field");
        assert!(!view.has_title);
    }

    #[test]
    fn search_response_summarizes_hits() {
        assert_eq!(SearchResponse::<String>::new(Vec::new()).message, "No results.");
        assert_eq!(
            SearchResponse::new(vec![1, 2]).message,
            "Found 2 result(s)."
        );
    }
}
