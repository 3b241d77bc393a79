//! Hierarchical nodes (hosts, targets, folders) that own notes.
//!
//! # Invariants
//! - `parent_id = None` means a root-level node.
//! - Siblings are ordered by `position ASC, label ASC`.
//! - At most one node has kind [`NodeKind::IssueLibrary`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable node identifier.
pub type NodeId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Plain grouping node.
    Default,
    /// Assessed host or target.
    Host,
    /// Hidden node that owns every issue.
    IssueLibrary,
}

impl NodeKind {
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Host => "host",
            Self::IssueLibrary => "issue_library",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Self::Default),
            "host" => Some(Self::Host),
            "issue_library" => Some(Self::IssueLibrary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
    pub parent_id: Option<NodeId>,
    /// Order key among siblings.
    pub position: i64,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds. Bumped whenever one of the node's notes is saved.
    pub updated_at: i64,
}

impl Node {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::NodeKind;

    #[test]
    fn kind_db_strings_round_trip() {
        for kind in [NodeKind::Default, NodeKind::Host, NodeKind::IssueLibrary] {
            assert_eq!(NodeKind::from_db_str(kind.as_db_str()), Some(kind));
        }
        assert_eq!(NodeKind::from_db_str("folder"), None);
    }
}
