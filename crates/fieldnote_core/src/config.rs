//! Core configuration injected into services.
//!
//! # Responsibility
//! - Carry the well-known category names, length limits and display
//!   fallbacks that entity-creating services need.
//! - Load and validate configuration from JSON.
//!
//! # Invariants
//! - Services receive configuration explicitly; nothing here is global.
//! - `max_text_length` never exceeds the codec hard limit.

use crate::fields::{is_valid_field_name, MAX_TEXT_LENGTH};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub const DEFAULT_NOTE_CATEGORY: &str = "Default category";
pub const ISSUE_CATEGORY: &str = "Issue description";
pub const ISSUE_TITLE_FIELD: &str = "Title";
pub const ISSUE_TITLE_FALLBACK: &str = "This issue doesn't provide a #[Title]# field";
pub const ISSUE_LIBRARY_LABEL: &str = "All issues";

/// Names of the categories assigned to newly created records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    /// Category for notes created without an explicit category.
    pub default_note: String,
    /// Category shared by every issue.
    pub issue: String,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            default_note: DEFAULT_NOTE_CATEGORY.to_string(),
            issue: ISSUE_CATEGORY.to_string(),
        }
    }
}

/// Runtime configuration for `fieldnote_core` services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub categories: CategoryConfig,
    /// Maximum note/issue/evidence text length in characters.
    pub max_text_length: usize,
    /// Field holding an issue's title.
    pub issue_title_field: String,
    /// Title shown for issues without a title field.
    pub issue_title_fallback: String,
    /// Label of the node that owns every issue.
    pub issue_library_label: String,
    /// Character budget for text previews.
    pub preview_length: usize,
    /// Default cap on search results.
    pub search_limit: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            categories: CategoryConfig::default(),
            max_text_length: MAX_TEXT_LENGTH,
            issue_title_field: ISSUE_TITLE_FIELD.to_string(),
            issue_title_fallback: ISSUE_TITLE_FALLBACK.to_string(),
            issue_library_label: ISSUE_LIBRARY_LABEL.to_string(),
            preview_length: crate::fields::DEFAULT_PREVIEW_LENGTH,
            search_limit: 50,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl CoreConfig {
    /// Parses and validates configuration from a JSON document.
    ///
    /// Missing keys fall back to [`CoreConfig::default`] values.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.categories.default_note.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "categories.default_note must not be blank".to_string(),
            ));
        }
        if self.categories.issue.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "categories.issue must not be blank".to_string(),
            ));
        }
        if self.categories.default_note == self.categories.issue {
            return Err(ConfigError::Invalid(
                "note and issue categories must differ".to_string(),
            ));
        }
        if self.max_text_length == 0 || self.max_text_length > MAX_TEXT_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "max_text_length must be within 1..={MAX_TEXT_LENGTH}, got {}",
                self.max_text_length
            )));
        }
        if !is_valid_field_name(&self.issue_title_field) {
            return Err(ConfigError::Invalid(format!(
                "issue_title_field `{}` is not a valid field name",
                self.issue_title_field
            )));
        }
        if self.issue_library_label.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "issue_library_label must not be blank".to_string(),
            ));
        }
        if self.preview_length < 4 {
            return Err(ConfigError::Invalid(format!(
                "preview_length must be at least 4, got {}",
                self.preview_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ISSUE_CATEGORY};
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = CoreConfig::default();
        config.validate().unwrap();
        assert_eq!(config.max_text_length, 65_535);
        assert_eq!(config.categories.issue, ISSUE_CATEGORY);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config =
            CoreConfig::from_json_str(r#"{"categories": {"default_note": "Findings"}}"#).unwrap();
        assert_eq!(config.categories.default_note, "Findings");
        assert_eq!(config.categories.issue, ISSUE_CATEGORY);
        assert_eq!(config.preview_length, 20);
    }

    #[test]
    fn rejects_limit_above_codec_maximum() {
        let err = CoreConfig::from_json_str(r#"{"max_text_length": 70000}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_same_category_for_notes_and_issues() {
        let err = CoreConfig::from_json_str(
            r#"{"categories": {"default_note": "Same", "issue": "Same"}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"issue_library_label": "Library"}}"#).unwrap();
        let config = CoreConfig::load(file.path()).unwrap();
        assert_eq!(config.issue_library_label, "Library");
    }
}
