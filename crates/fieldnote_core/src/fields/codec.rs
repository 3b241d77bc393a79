//! `#[Name]#` field codec.
//!
//! # Responsibility
//! - Split a flat text blob into marker-delimited field segments.
//! - Encode an ordered field mapping back into canonical text.
//! - Compute span-preserving edits for single-field updates.
//!
//! # Invariants
//! - Decoding never fails; malformed markers are kept as literal text.
//! - A marker is a whole line `#[name]#` terminated by `\n`, `\r\n` or end
//!   of input.
//! - A value is separated from the next marker by exactly one `\n`; a `\r`
//!   in front of it stays in the value.
//! - Writes never store a value containing a marker line.
//! - Duplicate names resolve to first position, last value.
//! - `decode(encode(map)) == map` for maps whose values contain no marker
//!   lines (see [`contains_marker_line`]) and whose untagged entry (if any) is non-empty or followed by
//!   named entries.

use indexmap::IndexMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Range;

/// Key under which text without a leading marker is exposed.
///
/// Marker names must be non-empty, so this key can never collide with a
/// named field.
pub const UNTAGGED_FIELD: &str = "";

/// Hard upper bound on raw text length, in characters.
pub const MAX_TEXT_LENGTH: usize = 65_535;

const MARKER_OPEN: &str = "#[";
const MARKER_CLOSE: &str = "]#";

/// Ordered mapping of field name to field value.
pub type FieldMap = IndexMap<String, String>;

/// Errors produced by field writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Field name is empty or contains a line break or marker delimiter.
    InvalidName(String),
    /// Resulting text would exceed the maximum allowed length.
    TooLong { length: usize, max: usize },
    /// Value of the named field contains a line that would decode as a marker.
    MarkerInValue(String),
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid field name `{name}`"),
            Self::TooLong { length, max } => write!(
                f,
                "text is too long ({length} characters, maximum is {max})"
            ),
            Self::MarkerInValue(name) => {
                write!(f, "value of field `{name}` contains a marker line")
            }
        }
    }
}

impl Error for FieldError {}

/// One field occurrence located inside a raw text blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    /// Field name, or [`UNTAGGED_FIELD`] for leading text.
    pub name: String,
    /// Byte span of the value inside the raw text.
    pub value: Range<usize>,
    /// Marker line ended at end of input with no line break.
    pub unterminated: bool,
    /// Another marker follows this value.
    pub followed: bool,
    /// A line break separates the value from the following marker.
    pub separated: bool,
}

/// Parsed segment layout of one raw text blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Layout {
    segments: Vec<Segment>,
}

impl Layout {
    pub(crate) fn parse(raw: &str) -> Self {
        let markers = find_markers(raw);
        if markers.is_empty() {
            if raw.is_empty() {
                return Self::default();
            }
            return Self {
                segments: vec![Segment {
                    name: UNTAGGED_FIELD.to_string(),
                    value: 0..raw.len(),
                    unterminated: false,
                    followed: false,
                    separated: false,
                }],
            };
        }

        let mut segments = Vec::with_capacity(markers.len() + 1);
        let lead_end = markers[0].line_start;
        if lead_end > 0 {
            let (value, separated) = strip_separator(raw, 0..lead_end);
            segments.push(Segment {
                name: UNTAGGED_FIELD.to_string(),
                value,
                unterminated: false,
                followed: true,
                separated,
            });
        }

        for (index, marker) in markers.iter().enumerate() {
            let next_start = markers.get(index + 1).map(|next| next.line_start);
            let region_end = next_start.unwrap_or(raw.len());
            let (value, separated) = if next_start.is_some() {
                strip_separator(raw, marker.value_start..region_end)
            } else {
                (marker.value_start..region_end, false)
            };
            segments.push(Segment {
                name: marker.name.clone(),
                value,
                unterminated: marker.unterminated,
                followed: next_start.is_some(),
                separated,
            });
        }

        Self { segments }
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the winning (last) occurrence of `name`.
    pub(crate) fn find(&self, name: &str) -> Option<&Segment> {
        self.segments.iter().rev().find(|segment| segment.name == name)
    }

    pub(crate) fn has_markers(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| segment.name != UNTAGGED_FIELD)
    }

    pub(crate) fn to_map(&self, raw: &str) -> FieldMap {
        let mut map = FieldMap::with_capacity(self.segments.len());
        for segment in &self.segments {
            // IndexMap keeps the original slot on re-insert.
            map.insert(segment.name.clone(), raw[segment.value.clone()].to_string());
        }
        map
    }
}

#[derive(Debug)]
struct Marker {
    name: String,
    line_start: usize,
    value_start: usize,
    unterminated: bool,
}

/// Decodes raw text into an ordered field mapping.
///
/// Never fails. Text without markers is returned under [`UNTAGGED_FIELD`];
/// empty text yields an empty map.
pub fn decode(raw: &str) -> FieldMap {
    Layout::parse(raw).to_map(raw)
}

/// Encodes a field mapping into canonical marker text.
///
/// The untagged entry is emitted first without a marker; named entries follow
/// as `#[name]#\nvalue`, all joined by `\n`.
pub fn encode(fields: &FieldMap) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(fields.len());
    if let Some(untagged) = fields.get(UNTAGGED_FIELD) {
        parts.push(untagged.clone());
    }
    for (name, value) in fields {
        if name == UNTAGGED_FIELD {
            continue;
        }
        parts.push(format!("{MARKER_OPEN}{name}{MARKER_CLOSE}\n{value}"));
    }
    parts.join("\n")
}

/// Returns whether `name` can be written as a marker.
pub fn is_valid_field_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['\n', '\r'])
        && !name.contains(MARKER_OPEN)
        && !name.contains(MARKER_CLOSE)
}

/// Returns whether any line of `value` would be read back as a marker.
///
/// Lines are checked as if followed by a line break, so `#[x]#\r` counts.
pub fn contains_marker_line(value: &str) -> bool {
    value
        .split('\n')
        .any(|line| marker_name(line, true).is_some())
}

/// Computes the raw text that results from setting one field.
///
/// Existing fields are edited in place (last occurrence); missing named
/// fields are appended and a missing untagged field is prepended.
pub(crate) fn apply_set(
    raw: &str,
    layout: &Layout,
    name: &str,
    value: &str,
) -> Result<String, FieldError> {
    if name != UNTAGGED_FIELD && !is_valid_field_name(name) {
        return Err(FieldError::InvalidName(name.to_string()));
    }
    if contains_marker_line(value) {
        return Err(FieldError::MarkerInValue(name.to_string()));
    }

    let Some(segment) = layout.find(name) else {
        return Ok(insert_missing(raw, layout, name, value));
    };

    let replacement = if segment.unterminated {
        if value.is_empty() {
            String::new()
        } else {
            format!("\n{value}")
        }
    } else if segment.followed && !segment.separated && !value.is_empty() {
        format!("{value}\n")
    } else {
        value.to_string()
    };

    let mut updated = String::with_capacity(raw.len() + replacement.len());
    updated.push_str(&raw[..segment.value.start]);
    updated.push_str(&replacement);
    updated.push_str(&raw[segment.value.end..]);
    Ok(updated)
}

/// Fails when `raw` is longer than `max` characters.
pub fn check_length(raw: &str, max: usize) -> Result<(), FieldError> {
    let length = raw.chars().count();
    if length > max {
        return Err(FieldError::TooLong { length, max });
    }
    Ok(())
}

fn insert_missing(raw: &str, layout: &Layout, name: &str, value: &str) -> String {
    if name == UNTAGGED_FIELD {
        if raw.is_empty() {
            return value.to_string();
        }
        debug_assert!(layout.has_markers());
        return format!("{value}\n{raw}");
    }

    let marker = format!("{MARKER_OPEN}{name}{MARKER_CLOSE}\n{value}");
    if raw.is_empty() {
        marker
    } else {
        format!("{raw}\n{marker}")
    }
}

fn find_markers(raw: &str) -> Vec<Marker> {
    let mut markers = Vec::new();
    let mut line_start = 0;
    while line_start <= raw.len() {
        let rest = &raw[line_start..];
        let line_len = rest.find('\n').unwrap_or(rest.len());
        let has_newline = line_len < rest.len();
        if let Some(name) = marker_name(&rest[..line_len], has_newline) {
            markers.push(Marker {
                name: name.to_string(),
                line_start,
                value_start: if has_newline {
                    line_start + line_len + 1
                } else {
                    line_start + line_len
                },
                unterminated: !has_newline,
            });
        }
        if !has_newline {
            break;
        }
        line_start += line_len + 1;
    }
    markers
}

fn marker_name(line: &str, has_newline: bool) -> Option<&str> {
    let line = if has_newline {
        line.strip_suffix('\r').unwrap_or(line)
    } else {
        line
    };
    let name = line
        .strip_prefix(MARKER_OPEN)?
        .strip_suffix(MARKER_CLOSE)?;
    is_valid_field_name(name).then_some(name)
}

/// Removes the `\n` that separates a value from the next marker.
///
/// Only the bare `\n` written by [`encode`] is a separator; a `\r` before it
/// belongs to the value.
fn strip_separator(raw: &str, region: Range<usize>) -> (Range<usize>, bool) {
    match raw[region.clone()].strip_suffix('\n') {
        Some(stripped) => (region.start..region.start + stripped.len(), true),
        None => (region, false),
    }
}
