//! Structured text fields embedded in note bodies.
//!
//! # Responsibility
//! - Decode/encode the `#[Name]#` marker format (`codec`).
//! - Hold raw text with a cached field view (`document`).
//! - Give entities field accessors through explicit delegation (`HasFields`).
//!
//! # Invariants
//! - Field reads never fail; absence is a soft miss.
//! - Only writes can fail: invalid names, values holding marker lines, or
//!   excess length.

pub mod codec;
pub mod document;

pub use codec::{
    contains_marker_line, decode, encode, is_valid_field_name, FieldError, FieldMap,
    MAX_TEXT_LENGTH, UNTAGGED_FIELD,
};
pub use document::TextDocument;

/// Character budget used by [`truncate_preview`] callers by default.
pub const DEFAULT_PREVIEW_LENGTH: usize = 20;

const PREVIEW_OMISSION: &str = "...";

/// Field access for entities that store a [`TextDocument`].
///
/// Implementors only expose their document; every accessor is provided.
pub trait HasFields {
    fn document(&self) -> &TextDocument;
    fn document_mut(&mut self) -> &mut TextDocument;

    /// Decoded field mapping of the entity text.
    fn fields(&self) -> FieldMap {
        self.document().fields()
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.document().get(name)
    }

    /// Soft-miss lookup returning `default` for absent fields.
    fn field_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.document().get_or(name, default)
    }

    /// Field value, or a [`DEFAULT_PREVIEW_LENGTH`] preview of the whole text
    /// when absent. Configured callers use [`HasFields::field_or_text_within`].
    fn field_or_text(&self, name: &str) -> String {
        self.field_or_text_within(name, DEFAULT_PREVIEW_LENGTH)
    }

    /// Field value, or the whole text cut to `preview_length` characters.
    fn field_or_text_within(&self, name: &str, preview_length: usize) -> String {
        match self.document().get(name) {
            Some(value) => value.to_string(),
            None => truncate_preview(self.document().as_str(), preview_length),
        }
    }

    /// Sets one field under the fixed [`MAX_TEXT_LENGTH`] bound.
    fn set_field(&mut self, name: &str, value: &str) -> Result<(), FieldError> {
        self.set_field_within(name, value, MAX_TEXT_LENGTH)
    }

    /// Sets one field under a caller-provided length bound.
    fn set_field_within(
        &mut self,
        name: &str,
        value: &str,
        max_length: usize,
    ) -> Result<(), FieldError> {
        self.document_mut().set_field_within(name, value, max_length)
    }
}

/// Truncates `text` to at most `max_chars` characters, ending in `...` when cut.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(PREVIEW_OMISSION.len());
    let mut preview: String = text.chars().take(keep).collect();
    preview.push_str(PREVIEW_OMISSION);
    preview
}
