//! Node tree use-case service.
//!
//! # Responsibility
//! - Validate node labels and parents above the repository layer.
//! - Own lazy creation of the issue library node.
//!
//! # Invariants
//! - Labels are trimmed and must not be blank.
//! - Parent node must exist when provided.
//! - The issue library node cannot be created through `create_node`.

use crate::config::CoreConfig;
use crate::model::node::{Node, NodeId, NodeKind};
use crate::model::validation::{ValidationError, ValidationErrors};
use crate::repo::node_repo::NodeRepository;
use crate::service::{ServiceError, ServiceResult, Store};
use log::info;

pub struct NodeService<S: Store> {
    store: S,
    config: CoreConfig,
}

impl<S: Store> NodeService<S> {
    pub fn new(store: S, config: CoreConfig) -> Self {
        Self { store, config }
    }

    /// Creates one node under an optional parent.
    pub fn create_node(
        &self,
        parent_id: Option<NodeId>,
        label: impl Into<String>,
        kind: NodeKind,
    ) -> ServiceResult<Node> {
        let mut errors = Vec::new();
        let label = normalize_label(label.into());
        if label.is_none() {
            errors.push(ValidationError::BlankLabel);
        }
        if let Some(parent_id) = parent_id {
            if self.store.nodes().get_node(parent_id)?.is_none() {
                errors.push(ValidationError::UnknownNode(parent_id));
            }
        }
        if kind == NodeKind::IssueLibrary {
            errors.push(ValidationError::ReservedNodeKind);
        }
        ValidationErrors::check(errors)?;

        let label = label.unwrap_or_default();
        let node = self.store.nodes().create_node(parent_id, &label, kind)?;
        info!(
            "event=node_save module=service status=ok action=create node_id={}",
            node.id
        );
        Ok(node)
    }

    pub fn rename_node(&self, id: NodeId, label: impl Into<String>) -> ServiceResult<Node> {
        let label = normalize_label(label.into())
            .ok_or_else(|| ValidationErrors::single(ValidationError::BlankLabel))?;
        self.store.nodes().rename_node(id, &label)?;
        self.get_node(id)
    }

    /// Deletes one node with its subtree, notes and evidence.
    pub fn delete_node(&self, id: NodeId) -> ServiceResult<()> {
        self.store.nodes().delete_node(id)?;
        info!("event=node_delete module=service status=ok node_id={id}");
        Ok(())
    }

    pub fn get_node(&self, id: NodeId) -> ServiceResult<Node> {
        self.store
            .nodes()
            .get_node(id)?
            .ok_or_else(|| ServiceError::not_found("node", id))
    }

    /// Lists direct children; `None` lists root nodes except the issue library.
    pub fn list_children(&self, parent_id: Option<NodeId>) -> ServiceResult<Vec<Node>> {
        let nodes = self.store.nodes().list_children(parent_id)?;
        Ok(nodes
            .into_iter()
            .filter(|node| node.kind != NodeKind::IssueLibrary)
            .collect())
    }

    /// Returns the issue library node, creating it on first use.
    pub fn issue_library(&self) -> ServiceResult<Node> {
        ensure_issue_library(&self.store, &self.config)
    }
}

pub(crate) fn ensure_issue_library<S: Store>(store: &S, config: &CoreConfig) -> ServiceResult<Node> {
    if let Some(node) = store.nodes().find_issue_library()? {
        return Ok(node);
    }
    let node = store
        .nodes()
        .create_node(None, &config.issue_library_label, NodeKind::IssueLibrary)?;
    info!(
        "event=issue_library_create module=service status=ok node_id={}",
        node.id
    );
    Ok(node)
}

fn normalize_label(label: String) -> Option<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_label;

    #[test]
    fn labels_are_trimmed_and_blank_rejected() {
        assert_eq!(normalize_label("  host-a  ".to_string()), Some("host-a".to_string()));
        assert_eq!(normalize_label(" \t ".to_string()), None);
    }
}
