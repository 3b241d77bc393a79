use fieldnote_core::{
    contains_marker_line, decode, encode, FieldError, FieldMap, TextDocument,
};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::Config;

fn field_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 _-]{0,11}"
}

/// Value pieces biased towards the codec's edges: carriage returns, marker
/// delimiters and whole marker lines.
fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        6 => "[a-zA-Z0-9 .,:]{0,6}",
        2 => Just("\n".to_string()),
        1 => Just("\r".to_string()),
        1 => Just("\r\n".to_string()),
        1 => Just("#[".to_string()),
        1 => Just("]#".to_string()),
        1 => Just("#[Title]#".to_string()),
        1 => Just("\n#[B]#\n".to_string()),
        1 => Just("\n#[A]#\r\n".to_string()),
    ]
}

/// Any value, including ones that `set_field` must reject.
fn field_value() -> impl Strategy<Value = String> {
    vec(fragment(), 0..8).prop_map(|parts| parts.concat())
}

/// Values `set_field` accepts.
fn storable_value() -> impl Strategy<Value = String> {
    field_value().prop_filter("value holds a marker line", |value| {
        !contains_marker_line(value)
    })
}

/// Applies every op; rejected ops must leave the document as it was.
fn build(ops: &[(String, String)]) -> TextDocument {
    let mut doc = TextDocument::default();
    for (name, value) in ops {
        let before = doc.as_str().to_string();
        match doc.set_field(name, value) {
            Ok(()) => assert!(!contains_marker_line(value)),
            Err(err) => {
                assert_eq!(err, FieldError::MarkerInValue(name.clone()));
                assert_eq!(doc.as_str(), before);
            }
        }
    }
    doc
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn documents_built_by_set_field_round_trip(
        ops in vec((field_name(), field_value()), 0..8)
    ) {
        let doc = build(&ops);
        prop_assert_eq!(encode(&decode(doc.as_str())), doc.as_str());
    }

    #[test]
    fn set_field_then_get_returns_value(
        ops in vec((field_name(), field_value()), 0..6),
        name in field_name(),
        value in field_value()
    ) {
        let mut doc = build(&ops);
        let before = doc.as_str().to_string();
        match doc.set_field(&name, &value) {
            Ok(()) => {
                prop_assert!(!contains_marker_line(&value));
                prop_assert_eq!(doc.get(&name), Some(value.as_str()));
                let decoded = decode(doc.as_str());
                prop_assert_eq!(decoded.get(&name), Some(&value));
            }
            Err(err) => {
                prop_assert!(contains_marker_line(&value));
                prop_assert_eq!(err, FieldError::MarkerInValue(name.clone()));
                prop_assert_eq!(doc.as_str(), before.as_str());
            }
        }
    }

    #[test]
    fn set_field_leaves_siblings_untouched(
        ops in vec((field_name(), field_value()), 1..8),
        name in field_name(),
        value in field_value()
    ) {
        let mut doc = build(&ops);
        let before: FieldMap = doc.fields();
        let _ = doc.set_field(&name, &value);
        let after = doc.fields();

        for (other, other_value) in &before {
            if other != &name {
                prop_assert_eq!(after.get(other), Some(other_value));
            }
        }
        let names_before: Vec<&String> = before.keys().filter(|key| *key != &name).collect();
        let names_after: Vec<&String> = after.keys().filter(|key| *key != &name).collect();
        prop_assert_eq!(names_before, names_after);
    }

    #[test]
    fn missing_field_returns_exact_default(
        ops in vec((field_name(), field_value()), 0..6),
        default in field_value()
    ) {
        let doc = build(&ops);
        prop_assert_eq!(doc.get_or("#missing#", &default), default.as_str());
    }

    #[test]
    fn duplicates_keep_first_position_and_last_value(
        first in storable_value(),
        middle in storable_value(),
        last in storable_value()
    ) {
        let raw = format!("#[A]#\n{first}\n#[B]#\n{middle}\n#[A]#\n{last}");
        let fields = decode(&raw);
        let names: Vec<&str> = fields.keys().map(String::as_str).collect();
        prop_assert_eq!(names, vec!["A", "B"]);
        prop_assert_eq!(fields.get("A"), Some(&last));
        prop_assert_eq!(fields.get("B"), Some(&middle));
    }

    #[test]
    fn set_field_edits_the_winning_duplicate(
        first in storable_value(),
        last in storable_value(),
        value in storable_value()
    ) {
        let raw = format!("#[A]#\n{first}\n#[A]#\n{last}");
        let mut doc = TextDocument::new(raw);
        doc.set_field("A", &value).unwrap();
        prop_assert_eq!(doc.get("A"), Some(value.as_str()));
        let expected_prefix = format!("#[A]#\n{first}\n#[A]#\n");
        prop_assert!(doc.as_str().starts_with(&expected_prefix));
    }

    #[test]
    fn encoded_maps_decode_back(
        entries in vec((field_name(), storable_value()), 0..6)
    ) {
        let fields: FieldMap = entries.into_iter().collect();
        prop_assert_eq!(decode(&encode(&fields)), fields);
    }

    #[test]
    fn decode_never_panics_on_arbitrary_text(raw in "(?s).{0,200}") {
        let _ = decode(&raw);
    }
}

#[test]
fn title_example_is_replaced_in_place() {
    let mut doc = TextDocument::new("#[Title]#\nSomething");
    doc.set_field("Title", "New title").unwrap();
    assert_eq!(doc.as_str(), "#[Title]#\nNew title");
}

#[test]
fn untagged_text_is_exposed_under_empty_key() {
    let fields = decode("just some text");
    assert_eq!(fields.get(""), Some(&"just some text".to_string()));
    assert!(decode("").is_empty());
}
