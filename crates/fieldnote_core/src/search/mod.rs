//! Substring search entry points.
//!
//! # Responsibility
//! - Expose case-insensitive text search over notes and issues.
//! - Keep query building and result shaping inside core.

pub mod like;
