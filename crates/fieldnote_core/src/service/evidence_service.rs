//! Evidence use-case service.
//!
//! # Invariants
//! - Evidence always points at an existing node and an existing issue.
//! - Content obeys the same length limit as note text.

use crate::config::CoreConfig;
use crate::model::activity::TrackableType;
use crate::model::evidence::{Evidence, EvidenceId};
use crate::model::node::NodeId;
use crate::model::note::NoteId;
use crate::model::validation::{ValidationError, ValidationErrors};
use crate::repo::evidence_repo::EvidenceRepository;
use crate::repo::history_repo::ChangeContext;
use crate::repo::node_repo::NodeRepository;
use crate::repo::note_repo::NoteRepository;
use crate::service::note_service::{log_rejected, lookup_category_id, set_entity_field};
use crate::service::{ServiceError, ServiceResult, Store};
use log::info;

/// Input for [`EvidenceService::create_evidence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvidence {
    pub node_id: NodeId,
    pub issue_id: NoteId,
    pub author: Option<String>,
    pub content: String,
}

pub struct EvidenceService<S: Store> {
    store: S,
    config: CoreConfig,
}

impl<S: Store> EvidenceService<S> {
    pub fn new(store: S, config: CoreConfig) -> Self {
        Self { store, config }
    }

    pub fn create_evidence(&self, input: NewEvidence) -> ServiceResult<Evidence> {
        let mut evidence = Evidence::new(input.node_id, input.issue_id, input.content);
        evidence.author = input.author;

        if let Err(errors) = self.validate(&evidence) {
            log_rejected("evidence_save", "create", &errors);
            return Err(errors);
        }

        let context = ChangeContext::new(TrackableType::Evidence, evidence.author.as_deref());
        let saved = self.store.evidence().create_evidence(&evidence, context)?;
        info!(
            "event=evidence_save module=service status=ok action=create evidence_id={}",
            saved.id
        );
        Ok(saved)
    }

    /// Replaces the whole evidence content.
    pub fn update_evidence(
        &self,
        id: EvidenceId,
        content: &str,
        user: Option<&str>,
    ) -> ServiceResult<Evidence> {
        let mut evidence = self.get_evidence(id)?;
        evidence.content.replace(content);
        self.save(evidence, user)
    }

    /// Writes one field of the evidence content.
    pub fn set_field(
        &self,
        id: EvidenceId,
        name: &str,
        value: &str,
        user: Option<&str>,
    ) -> ServiceResult<Evidence> {
        let mut evidence = self.get_evidence(id)?;
        set_entity_field(&mut evidence, name, value, &self.config)?;
        self.save(evidence, user)
    }

    pub fn delete_evidence(&self, id: EvidenceId, user: Option<&str>) -> ServiceResult<()> {
        let context = ChangeContext::new(TrackableType::Evidence, user);
        self.store.evidence().delete_evidence(id, context)?;
        info!("event=evidence_delete module=service status=ok evidence_id={id}");
        Ok(())
    }

    pub fn get_evidence(&self, id: EvidenceId) -> ServiceResult<Evidence> {
        self.store
            .evidence()
            .get_evidence(id)?
            .ok_or_else(|| ServiceError::not_found("evidence", id))
    }

    /// Evidence of one issue, ordered by node label.
    pub fn list_for_issue(&self, issue_id: NoteId) -> ServiceResult<Vec<Evidence>> {
        Ok(self.store.evidence().list_for_issue(issue_id)?)
    }

    pub fn list_for_node(&self, node_id: NodeId) -> ServiceResult<Vec<Evidence>> {
        Ok(self.store.evidence().list_for_node(node_id)?)
    }

    fn save(&self, evidence: Evidence, user: Option<&str>) -> ServiceResult<Evidence> {
        if let Err(errors) = evidence.validate(self.config.max_text_length) {
            let errors = ServiceError::Validation(errors);
            log_rejected("evidence_save", "update", &errors);
            return Err(errors);
        }
        let context = ChangeContext::new(TrackableType::Evidence, user);
        let saved = self.store.evidence().update_evidence(
            evidence.id,
            evidence.content.as_str(),
            context,
        )?;
        info!(
            "event=evidence_save module=service status=ok action=update evidence_id={}",
            saved.id
        );
        Ok(saved)
    }

    fn validate(&self, evidence: &Evidence) -> ServiceResult<()> {
        let mut errors = Vec::new();
        if self.store.nodes().get_node(evidence.node_id)?.is_none() {
            errors.push(ValidationError::UnknownNode(evidence.node_id));
        }
        let issue_category = lookup_category_id(&self.store, &self.config.categories.issue)?;
        let is_issue = match issue_category {
            Some(category_id) => self
                .store
                .notes()
                .get_note(evidence.issue_id)?
                .is_some_and(|note| note.category_id == category_id),
            None => false,
        };
        if !is_issue {
            errors.push(ValidationError::UnknownIssue(evidence.issue_id));
        }
        if let Err(local) = evidence.validate(self.config.max_text_length) {
            errors.extend(local.errors().iter().cloned());
        }
        ValidationErrors::check(errors)?;
        Ok(())
    }
}
