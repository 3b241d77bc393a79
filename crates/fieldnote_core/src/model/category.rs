//! Note categories.

use serde::{Deserialize, Serialize};

/// Database identifier of a category.
pub type CategoryId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}
