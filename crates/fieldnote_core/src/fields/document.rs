//! Raw text blob with a lazily parsed field view.
//!
//! # Responsibility
//! - Own the persisted `raw` string of a note, issue or evidence record.
//! - Cache the parsed field layout until the text changes.
//!
//! # Invariants
//! - `raw` and the cached layout are always replaced together.
//! - A failed `set_field` leaves the document unchanged.

use super::codec::{apply_set, check_length, FieldError, FieldMap, Layout, MAX_TEXT_LENGTH};
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Text document that can be read and edited field by field.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    raw: String,
    layout: OnceCell<Layout>,
}

impl TextDocument {
    /// Wraps raw text without parsing it.
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            layout: OnceCell::new(),
        }
    }

    /// Returns the raw text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn into_string(self) -> String {
        self.raw
    }

    /// Length in characters, as enforced by [`MAX_TEXT_LENGTH`].
    pub fn char_len(&self) -> usize {
        self.raw.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Overwrites the whole text and drops the cached layout.
    pub fn replace(&mut self, raw: impl Into<String>) {
        self.raw = raw.into();
        self.layout = OnceCell::new();
    }

    /// Returns whether the text contains at least one field marker.
    pub fn is_tagged(&self) -> bool {
        self.layout().has_markers()
    }

    /// Returns the decoded field mapping.
    pub fn fields(&self) -> FieldMap {
        self.layout().to_map(&self.raw)
    }

    /// Returns field names in first-occurrence order.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in self.layout().segments() {
            if !names.contains(&segment.name.as_str()) {
                names.push(segment.name.as_str());
            }
        }
        names
    }

    /// Returns the value of `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.layout()
            .find(name)
            .map(|segment| &self.raw[segment.value.clone()])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layout().find(name).is_some()
    }

    /// Returns the value of `name`, or `default` when it is absent.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Sets one field, keeping every other field's text and position.
    ///
    /// # Errors
    /// - [`FieldError::InvalidName`] for names that cannot be written as markers.
    /// - [`FieldError::MarkerInValue`] when a line of `value` is a marker.
    /// - [`FieldError::TooLong`] when the result exceeds [`MAX_TEXT_LENGTH`].
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), FieldError> {
        self.set_field_within(name, value, MAX_TEXT_LENGTH)
    }

    /// Same as [`TextDocument::set_field`] with a caller-provided length limit.
    pub fn set_field_within(
        &mut self,
        name: &str,
        value: &str,
        max_length: usize,
    ) -> Result<(), FieldError> {
        let updated = apply_set(&self.raw, self.layout(), name, value)?;
        check_length(&updated, max_length)?;
        let layout = Layout::parse(&updated);
        self.raw = updated;
        self.layout = OnceCell::from(layout);
        Ok(())
    }

    /// Fails when the text is longer than `max_length` characters.
    pub fn validate_length(&self, max_length: usize) -> Result<(), FieldError> {
        check_length(&self.raw, max_length)
    }

    fn layout(&self) -> &Layout {
        self.layout.get_or_init(|| Layout::parse(&self.raw))
    }
}

impl PartialEq for TextDocument {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for TextDocument {}

impl From<String> for TextDocument {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for TextDocument {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for TextDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for TextDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::TextDocument;
    use crate::fields::codec::{FieldError, UNTAGGED_FIELD};

    #[test]
    fn set_field_replaces_existing_value_in_place() {
        let mut doc = TextDocument::new("#[Title]#\nSomething");
        doc.set_field("Title", "New title").unwrap();
        assert_eq!(doc.as_str(), "#[Title]#\nNew title");
        assert_eq!(doc.get("Title"), Some("New title"));
    }

    #[test]
    fn set_field_keeps_sibling_text_byte_for_byte() {
        let raw = "#[Title]#\nT\r\n\n#[Description]#\nold\n\n\n#[Refs]#\n  spaced  ";
        let mut doc = TextDocument::new(raw);
        doc.set_field("Description", "new").unwrap();
        assert_eq!(
            doc.as_str(),
            "#[Title]#\nT\r\n\n#[Description]#\nnew\n#[Refs]#\n  spaced  "
        );
        assert_eq!(doc.get("Title"), Some("T\r\n"));
        assert_eq!(doc.get("Refs"), Some("  spaced  "));
    }

    #[test]
    fn set_field_appends_missing_field() {
        let mut doc = TextDocument::new("#[Title]#\nA");
        doc.set_field("Description", "B").unwrap();
        assert_eq!(doc.as_str(), "#[Title]#\nA\n#[Description]#\nB");

        let mut empty = TextDocument::default();
        empty.set_field("Title", "x").unwrap();
        assert_eq!(empty.as_str(), "#[Title]#\nx");
    }

    #[test]
    fn set_field_on_untagged_text_keeps_it_as_lead() {
        let mut doc = TextDocument::new("free text");
        doc.set_field("Title", "T").unwrap();
        assert_eq!(doc.as_str(), "free text\n#[Title]#\nT");
        assert_eq!(doc.get(UNTAGGED_FIELD), Some("free text"));
    }

    #[test]
    fn set_field_repairs_adjacent_and_unterminated_markers() {
        let mut adjacent = TextDocument::new("#[A]#\n#[B]#\nb");
        adjacent.set_field("A", "a").unwrap();
        assert_eq!(adjacent.as_str(), "#[A]#\na\n#[B]#\nb");
        assert_eq!(adjacent.get("B"), Some("b"));

        let mut unterminated = TextDocument::new("#[A]#\na\n#[B]#");
        unterminated.set_field("B", "b").unwrap();
        assert_eq!(unterminated.as_str(), "#[A]#\na\n#[B]#\nb");
    }

    #[test]
    fn set_field_updates_last_duplicate() {
        let mut doc = TextDocument::new("#[A]#\n1\n#[A]#\n2");
        doc.set_field("A", "3").unwrap();
        assert_eq!(doc.as_str(), "#[A]#\n1\n#[A]#\n3");
        assert_eq!(doc.get("A"), Some("3"));
    }

    #[test]
    fn set_field_rejects_invalid_names_without_mutation() {
        let mut doc = TextDocument::new("#[Title]#\nA");
        let err = doc.set_field("bad]#name", "x").unwrap_err();
        assert_eq!(err, FieldError::InvalidName("bad]#name".to_string()));
        assert_eq!(doc.as_str(), "#[Title]#\nA");
    }

    #[test]
    fn set_field_cannot_overwrite_a_sibling_through_a_marker_line() {
        let mut doc = TextDocument::new("#[Title]#\nT");
        let err = doc
            .set_field("Description", "line\n#[Title]#\nhijack")
            .unwrap_err();
        assert_eq!(err, FieldError::MarkerInValue("Description".to_string()));
        assert_eq!(doc.as_str(), "#[Title]#\nT");
        assert_eq!(doc.get("Title"), Some("T"));
        assert!(!doc.contains("Description"));
    }

    #[test]
    fn set_field_keeps_trailing_carriage_return_before_next_marker() {
        let mut doc = TextDocument::default();
        doc.set_field("A", "x\r").unwrap();
        doc.set_field("B", "b").unwrap();
        assert_eq!(doc.as_str(), "#[A]#\nx\r\n#[B]#\nb");
        assert_eq!(doc.get("A"), Some("x\r"));
        assert_eq!(doc.get("B"), Some("b"));
    }

    #[test]
    fn set_field_rejects_results_over_limit() {
        let mut doc = TextDocument::new("#[Title]#\nA");
        let err = doc.set_field_within("Title", "0123456789", 15).unwrap_err();
        assert!(matches!(err, FieldError::TooLong { max: 15, .. }));
        assert_eq!(doc.get("Title"), Some("A"));
    }

    #[test]
    fn get_or_returns_default_on_miss() {
        let doc = TextDocument::new("#[Not The Title]#\nMy Title");
        assert_eq!(doc.get_or("Title", "fallback"), "fallback");
        assert!(!doc.contains("Title"));
        assert_eq!(doc.field_names(), vec!["Not The Title"]);
    }

    #[test]
    fn serializes_as_raw_string() {
        let doc = TextDocument::new("#[Title]#\nA");
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json, "\"#[Title]#\\nA\"");
        let back: TextDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
