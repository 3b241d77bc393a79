//! Issue use-case service.
//!
//! # Responsibility
//! - Create issues in the configured issue category under the issue library.
//! - Provide issue update/set-field/delete/get/list/search APIs.
//! - Report nodes affected by an issue through its evidence.
//!
//! # Invariants
//! - An issue is a note in the issue category; other notes are never
//!   returned as issues.
//! - Issue lists are sorted by title, then id.
//! - Deleting an issue deletes its evidence.

use crate::config::CoreConfig;
use crate::fields::HasFields;
use crate::model::activity::{Activity, NoteVersion, TrackableType};
use crate::model::category::CategoryId;
use crate::model::evidence::Evidence;
use crate::model::node::Node;
use crate::model::note::{Issue, Note, NoteId};
use crate::repo::category_repo::CategoryRepository;
use crate::repo::evidence_repo::EvidenceRepository;
use crate::repo::history_repo::{ChangeContext, HistoryRepository};
use crate::repo::note_repo::{NoteListQuery, NoteRepository};
use crate::search::like::{SearchQuery, SearchScope, TextSearch};
use crate::service::node_service::ensure_issue_library;
use crate::service::note_service::{
    log_rejected, lookup_category_id, save_existing_note, set_entity_field, validate_note,
};
use crate::service::{ServiceError, ServiceResult, Store};
use log::info;

/// Input for [`IssueService::create_issue`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewIssue {
    pub author: Option<String>,
    pub text: String,
}

impl NewIssue {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            author: None,
            text: text.into(),
        }
    }
}

pub struct IssueService<S: Store> {
    store: S,
    config: CoreConfig,
}

impl<S: Store> IssueService<S> {
    pub fn new(store: S, config: CoreConfig) -> Self {
        Self { store, config }
    }

    pub fn create_issue(&self, input: NewIssue) -> ServiceResult<Issue> {
        let library = ensure_issue_library(&self.store, &self.config)?;
        let category_id = self
            .store
            .categories()
            .find_or_create(&self.config.categories.issue)?
            .id;
        let mut note = Note::new(library.id, category_id, input.text);
        note.author = input.author;

        if let Err(errors) = validate_note(&self.store, &note, self.config.max_text_length) {
            log_rejected("issue_save", "create", &errors);
            return Err(errors);
        }

        let context = ChangeContext::new(TrackableType::Issue, note.author.as_deref());
        let saved = self.store.notes().create_note(&note, context)?;
        info!(
            "event=issue_save module=service status=ok action=create issue_id={}",
            saved.id
        );
        Ok(Issue::from_note(saved))
    }

    /// Replaces the whole issue text.
    pub fn update_issue(&self, id: NoteId, text: &str, user: Option<&str>) -> ServiceResult<Issue> {
        let mut issue = self.get_issue(id)?;
        issue.note_mut().text.replace(text);
        self.save(issue, user)
    }

    /// Writes one field of the issue text, keeping every other field as is.
    pub fn set_field(
        &self,
        id: NoteId,
        name: &str,
        value: &str,
        user: Option<&str>,
    ) -> ServiceResult<Issue> {
        let mut issue = self.get_issue(id)?;
        set_entity_field(&mut issue, name, value, &self.config)?;
        self.save(issue, user)
    }

    pub fn delete_issue(&self, id: NoteId, user: Option<&str>) -> ServiceResult<()> {
        self.get_issue(id)?;
        let context = ChangeContext::new(TrackableType::Issue, user);
        self.store.notes().delete_note(id, context)?;
        info!("event=issue_delete module=service status=ok issue_id={id}");
        Ok(())
    }

    pub fn get_issue(&self, id: NoteId) -> ServiceResult<Issue> {
        let Some(category_id) = self.issue_category_id()? else {
            return Err(ServiceError::not_found("issue", id));
        };
        match self.store.notes().get_note(id)? {
            Some(note) if note.category_id == category_id => Ok(Issue::from_note(note)),
            _ => Err(ServiceError::not_found("issue", id)),
        }
    }

    /// All issues sorted by title.
    pub fn list_issues(&self) -> ServiceResult<Vec<Issue>> {
        let Some(category_id) = self.issue_category_id()? else {
            return Ok(Vec::new());
        };
        let query = NoteListQuery {
            category_id: Some(category_id),
            ..NoteListQuery::default()
        };
        let mut issues: Vec<Issue> = self
            .store
            .notes()
            .list_notes(&query)?
            .into_iter()
            .map(Issue::from_note)
            .collect();
        issues.sort_by(|left, right| {
            self.title_of(left)
                .cmp(self.title_of(right))
                .then_with(|| left.id().cmp(&right.id()))
        });
        Ok(issues)
    }

    /// Case-insensitive substring search over issues, most recent first.
    pub fn search(&self, term: &str) -> ServiceResult<Vec<Issue>> {
        let Some(category_id) = self.issue_category_id()? else {
            return Ok(Vec::new());
        };
        let query = SearchQuery::new(term)
            .with_scope(SearchScope::Category(category_id))
            .with_limit(self.config.search_limit);
        let hits = self.store.search().search(&query)?;
        Ok(hits.into_iter().map(Issue::from_note).collect())
    }

    /// Title using the configured field name and placeholder.
    pub fn title_of<'a>(&'a self, issue: &'a Issue) -> &'a str {
        issue.title_or(
            &self.config.issue_title_field,
            &self.config.issue_title_fallback,
        )
    }

    /// Whether the issue carries the configured title field.
    pub fn has_title(&self, issue: &Issue) -> bool {
        issue.field(&self.config.issue_title_field).is_some()
    }

    /// Distinct nodes with evidence for the issue, ordered by label.
    pub fn affected_nodes(&self, id: NoteId) -> ServiceResult<Vec<Node>> {
        self.get_issue(id)?;
        Ok(self.store.evidence().affected_nodes(id)?)
    }

    pub fn evidence(&self, id: NoteId) -> ServiceResult<Vec<Evidence>> {
        self.get_issue(id)?;
        Ok(self.store.evidence().list_for_issue(id)?)
    }

    pub fn versions(&self, id: NoteId) -> ServiceResult<Vec<NoteVersion>> {
        Ok(self.store.history().list_versions(id)?)
    }

    pub fn activities(&self, id: NoteId) -> ServiceResult<Vec<Activity>> {
        Ok(self
            .store
            .history()
            .list_activities(TrackableType::Issue, id)?)
    }

    fn save(&self, issue: Issue, user: Option<&str>) -> ServiceResult<Issue> {
        let saved = save_existing_note(
            &self.store,
            &self.config,
            issue.into_note(),
            TrackableType::Issue,
            user,
        )?;
        Ok(Issue::from_note(saved))
    }

    /// `None` until the first issue is created.
    fn issue_category_id(&self) -> ServiceResult<Option<CategoryId>> {
        lookup_category_id(&self.store, &self.config.categories.issue)
    }
}
