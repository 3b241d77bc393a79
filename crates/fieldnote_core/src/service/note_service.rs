//! Note use-case service.
//!
//! # Responsibility
//! - Provide note create/update/set-field/delete/get/list/search APIs.
//! - Assign the configured default category to new notes.
//! - Validate node, category and text length before any write.
//!
//! # Invariants
//! - Every rejected save returns all reasons at once.
//! - `set_field` edits one field and leaves the rest of the text untouched.
//! - Lists and search results are sorted by `updated_at DESC, id ASC`.
//! - Issue-category notes are excluded from note lists and search.

use crate::config::CoreConfig;
use crate::fields::HasFields;
use crate::model::activity::{Activity, NoteVersion, TrackableType};
use crate::model::category::CategoryId;
use crate::model::node::NodeId;
use crate::model::note::{Note, NoteId};
use crate::model::validation::{ValidationError, ValidationErrors};
use crate::repo::category_repo::CategoryRepository;
use crate::repo::history_repo::{ChangeContext, HistoryRepository};
use crate::repo::node_repo::NodeRepository;
use crate::repo::note_repo::{NoteListQuery, NoteRepository};
use crate::search::like::{SearchQuery, SearchScope, TextSearch};
use crate::service::{ServiceError, ServiceResult, Store};
use log::{info, warn};
use std::time::{SystemTime, UNIX_EPOCH};

/// Window used by the "recent notes" listings.
pub const RECENT_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// Input for [`NoteService::create_note`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub node_id: NodeId,
    /// Falls back to the configured default category.
    pub category_id: Option<CategoryId>,
    pub author: Option<String>,
    pub text: String,
}

impl NewNote {
    pub fn new(node_id: NodeId, text: impl Into<String>) -> Self {
        Self {
            node_id,
            category_id: None,
            author: None,
            text: text.into(),
        }
    }
}

/// Partial update for [`NoteService::update_note`]; `None` keeps a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub text: Option<String>,
    pub category_id: Option<CategoryId>,
}

pub struct NoteService<S: Store> {
    store: S,
    config: CoreConfig,
}

impl<S: Store> NoteService<S> {
    pub fn new(store: S, config: CoreConfig) -> Self {
        Self { store, config }
    }

    /// Creates one note after validating its references and length.
    pub fn create_note(&self, input: NewNote) -> ServiceResult<Note> {
        let category_id = match input.category_id {
            Some(category_id) => category_id,
            None => self.default_category_id()?,
        };
        let mut note = Note::new(input.node_id, category_id, input.text);
        note.author = input.author;

        if let Err(errors) = validate_note(&self.store, &note, self.config.max_text_length) {
            log_rejected("note_save", "create", &errors);
            return Err(errors);
        }

        let context = ChangeContext::new(TrackableType::Note, note.author.as_deref());
        let saved = self.store.notes().create_note(&note, context)?;
        info!(
            "event=note_save module=service status=ok action=create note_id={}",
            saved.id
        );
        Ok(saved)
    }

    /// Replaces the text and/or category of one note.
    pub fn update_note(
        &self,
        id: NoteId,
        update: NoteUpdate,
        user: Option<&str>,
    ) -> ServiceResult<Note> {
        let mut note = self.get_note(id)?;
        if let Some(text) = update.text {
            note.text.replace(text);
        }
        if let Some(category_id) = update.category_id {
            note.category_id = category_id;
        }
        self.save_existing(note, TrackableType::Note, user)
    }

    /// Writes one field of the note text, keeping every other field as is.
    pub fn set_field(
        &self,
        id: NoteId,
        name: &str,
        value: &str,
        user: Option<&str>,
    ) -> ServiceResult<Note> {
        let mut note = self.get_note(id)?;
        set_entity_field(&mut note, name, value, &self.config)?;
        self.save_existing(note, TrackableType::Note, user)
    }

    pub fn delete_note(&self, id: NoteId, user: Option<&str>) -> ServiceResult<()> {
        self.get_note(id)?;
        let context = ChangeContext::new(TrackableType::Note, user);
        self.store.notes().delete_note(id, context)?;
        info!("event=note_delete module=service status=ok note_id={id}");
        Ok(())
    }

    /// Issue-category rows are not notes and read as missing.
    pub fn get_note(&self, id: NoteId) -> ServiceResult<Note> {
        let issue_category = self.issue_category_id()?;
        match self.store.notes().get_note(id)? {
            Some(note) if Some(note.category_id) != issue_category => Ok(note),
            _ => Err(ServiceError::not_found("note", id)),
        }
    }

    /// Lists notes attached to one node, most recently updated first.
    pub fn list_for_node(&self, node_id: NodeId) -> ServiceResult<Vec<Note>> {
        let query = NoteListQuery {
            node_id: Some(node_id),
            exclude_category_id: self.issue_category_id()?,
            ..NoteListQuery::default()
        };
        Ok(self.store.notes().list_notes(&query)?)
    }

    /// Notes created at or after `since` (epoch milliseconds).
    pub fn created_since(&self, since: i64) -> ServiceResult<Vec<Note>> {
        let query = NoteListQuery {
            created_since: Some(since),
            exclude_category_id: self.issue_category_id()?,
            ..NoteListQuery::default()
        };
        Ok(self.store.notes().list_notes(&query)?)
    }

    /// Notes updated at or after `since` (epoch milliseconds).
    pub fn updated_since(&self, since: i64) -> ServiceResult<Vec<Note>> {
        let query = NoteListQuery {
            updated_since: Some(since),
            exclude_category_id: self.issue_category_id()?,
            ..NoteListQuery::default()
        };
        Ok(self.store.notes().list_notes(&query)?)
    }

    /// Notes created during the last 24 hours.
    pub fn recently_created(&self) -> ServiceResult<Vec<Note>> {
        self.created_since(now_epoch_ms() - RECENT_WINDOW_MS)
    }

    /// Notes updated during the last 24 hours.
    pub fn recently_updated(&self) -> ServiceResult<Vec<Note>> {
        self.updated_since(now_epoch_ms() - RECENT_WINDOW_MS)
    }

    /// Case-insensitive substring search over non-issue notes.
    pub fn search(&self, term: &str) -> ServiceResult<Vec<Note>> {
        let query = SearchQuery::new(term)
            .with_scope(match self.issue_category_id()? {
                Some(category_id) => SearchScope::ExcludingCategory(category_id),
                None => SearchScope::All,
            })
            .with_limit(self.config.search_limit);
        Ok(self.store.search().search(&query)?)
    }

    /// Text history of one note, oldest first.
    pub fn versions(&self, id: NoteId) -> ServiceResult<Vec<NoteVersion>> {
        Ok(self.store.history().list_versions(id)?)
    }

    pub fn activities(&self, id: NoteId) -> ServiceResult<Vec<Activity>> {
        Ok(self
            .store
            .history()
            .list_activities(TrackableType::Note, id)?)
    }

    fn save_existing(
        &self,
        note: Note,
        trackable_type: TrackableType,
        user: Option<&str>,
    ) -> ServiceResult<Note> {
        save_existing_note(&self.store, &self.config, note, trackable_type, user)
    }

    fn default_category_id(&self) -> ServiceResult<CategoryId> {
        let category = self
            .store
            .categories()
            .find_or_create(&self.config.categories.default_note)?;
        Ok(category.id)
    }

    fn issue_category_id(&self) -> ServiceResult<Option<CategoryId>> {
        lookup_category_id(&self.store, &self.config.categories.issue)
    }
}

/// Resolves a configured category name without creating it.
pub(crate) fn lookup_category_id<S: Store>(
    store: &S,
    name: &str,
) -> ServiceResult<Option<CategoryId>> {
    Ok(store
        .categories()
        .find_by_name(name)?
        .map(|category| category.id))
}

/// Validates and stores an already persisted note; shared with issues.
pub(crate) fn save_existing_note<S: Store>(
    store: &S,
    config: &CoreConfig,
    note: Note,
    trackable_type: TrackableType,
    user: Option<&str>,
) -> ServiceResult<Note> {
    let event = save_event(trackable_type);
    if let Err(errors) = validate_note(store, &note, config.max_text_length) {
        log_rejected(event, "update", &errors);
        return Err(errors);
    }
    let context = ChangeContext::new(trackable_type, user);
    let saved = store.notes().update_note(&note, context)?;
    info!(
        "event={event} module=service status=ok action=update note_id={}",
        saved.id
    );
    Ok(saved)
}

/// Collects every rule a note violates.
pub(crate) fn validate_note<S: Store>(
    store: &S,
    note: &Note,
    max_text_length: usize,
) -> ServiceResult<()> {
    let mut errors = Vec::new();
    if store.nodes().get_node(note.node_id)?.is_none() {
        errors.push(ValidationError::UnknownNode(note.node_id));
    }
    if store.categories().get_category(note.category_id)?.is_none() {
        errors.push(ValidationError::UnknownCategory(note.category_id));
    }
    if let Err(local) = note.validate(max_text_length) {
        errors.extend(local.errors().iter().cloned());
    }
    ValidationErrors::check(errors)?;
    Ok(())
}

pub(crate) fn set_entity_field(
    entity: &mut impl HasFields,
    name: &str,
    value: &str,
    config: &CoreConfig,
) -> ServiceResult<()> {
    entity
        .set_field_within(name, value, config.max_text_length)
        .map_err(|err| ServiceError::Validation(err.into()))
}

pub(crate) fn log_rejected(event: &str, action: &str, err: &ServiceError) {
    if let ServiceError::Validation(errors) = err {
        warn!(
            "event={event} module=service status=rejected action={action} reasons={}",
            errors.errors().len()
        );
    }
}

pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn save_event(trackable_type: TrackableType) -> &'static str {
    match trackable_type {
        TrackableType::Issue => "issue_save",
        TrackableType::Note | TrackableType::Evidence => "note_save",
    }
}
