//! Domain model for nodes, notes, issues and their history.
//!
//! # Responsibility
//! - Define the records core services read and write.
//! - Keep entity-level validation next to the data it guards.
//!
//! # Invariants
//! - Note, issue and evidence text is held in a [`crate::fields::TextDocument`]
//!   and reaches fields only through [`crate::fields::HasFields`].
//! - Issues are notes in the configured issue category, owned by the issue
//!   library node.

pub mod activity;
pub mod category;
pub mod evidence;
pub mod node;
pub mod note;
pub mod validation;
