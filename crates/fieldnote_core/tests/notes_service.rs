use fieldnote_core::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use fieldnote_core::{
    open_db_in_memory, ChangeAction, CoreConfig, HasFields, IssueService, NewIssue, NewNote,
    NodeKind, NodeService, NoteService, NoteUpdate, ServiceError, SqliteStore, ValidationError,
    MAX_TEXT_LENGTH,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

fn host(store: &SqliteStore<'_>, label: &str) -> Uuid {
    NodeService::new(store, CoreConfig::default())
        .create_node(None, label, NodeKind::Host)
        .unwrap()
        .id
}

fn validation_errors(err: ServiceError) -> Vec<ValidationError> {
    match err {
        ServiceError::Validation(errors) => errors.errors().to_vec(),
        other => panic!("expected validation failure, got {other}"),
    }
}

#[test]
fn create_note_uses_configured_default_category() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let node_id = host(&store, "10.0.0.1");
    let notes = NoteService::new(&store, CoreConfig::default());

    let mut input = NewNote::new(node_id, "#[Port]#\n443\n#[Service]#\nhttps");
    input.author = Some("alice".to_string());
    let note = notes.create_note(input).unwrap();

    let default_category = SqliteCategoryRepository::try_new(&conn)
        .unwrap()
        .find_or_create("Default category")
        .unwrap();
    assert_eq!(note.category_id, default_category.id);
    assert_eq!(note.author.as_deref(), Some("alice"));
    assert_eq!(note.field("Port"), Some("443"));
    assert_eq!(note.field("Service"), Some("https"));
    assert!(note.created_at > 0);
}

#[test]
fn rejected_create_reports_every_reason() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let notes = NoteService::new(&store, CoreConfig::default());

    let missing_node = Uuid::new_v4();
    let mut input = NewNote::new(missing_node, "a".repeat(MAX_TEXT_LENGTH + 1));
    input.category_id = Some(9_999);
    let errors = validation_errors(notes.create_note(input).unwrap_err());

    assert_eq!(
        errors,
        vec![
            ValidationError::UnknownNode(missing_node),
            ValidationError::UnknownCategory(9_999),
            ValidationError::TextTooLong {
                length: MAX_TEXT_LENGTH + 1,
                max: MAX_TEXT_LENGTH,
            },
        ]
    );
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn text_length_boundary_is_65535_characters() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let node_id = host(&store, "boundary");
    let notes = NoteService::new(&store, CoreConfig::default());

    let accepted = notes
        .create_note(NewNote::new(node_id, "é".repeat(65_535)))
        .unwrap();
    assert_eq!(accepted.text.char_len(), 65_535);

    let errors = validation_errors(
        notes
            .create_note(NewNote::new(node_id, "é".repeat(65_536)))
            .unwrap_err(),
    );
    assert_eq!(
        errors,
        vec![ValidationError::TextTooLong {
            length: 65_536,
            max: 65_535,
        }]
    );
}

#[test]
fn set_field_keeps_siblings_and_rejects_oversized_results() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let node_id = host(&store, "web");
    let notes = NoteService::new(&store, CoreConfig::default());
    let note = notes
        .create_note(NewNote::new(node_id, "#[Title]#\nSomething\n#[Refs]#\nCVE-1"))
        .unwrap();

    let updated = notes
        .set_field(note.id, "Title", "New title", Some("bob"))
        .unwrap();
    assert_eq!(updated.text.as_str(), "#[Title]#\nNew title\n#[Refs]#\nCVE-1");

    let err = notes
        .set_field(note.id, "Refs", &"x".repeat(MAX_TEXT_LENGTH), None)
        .unwrap_err();
    assert!(matches!(
        validation_errors(err).as_slice(),
        [ValidationError::TextTooLong { .. }]
    ));
    assert_eq!(
        notes.get_note(note.id).unwrap().text.as_str(),
        "#[Title]#\nNew title\n#[Refs]#\nCVE-1"
    );

    let err = notes
        .set_field(note.id, "Bad]#Name", "value", None)
        .unwrap_err();
    assert_eq!(
        validation_errors(err),
        vec![ValidationError::InvalidFieldName("Bad]#Name".to_string())]
    );
}

#[test]
fn set_field_honours_configured_length_and_marker_rules() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let node_id = host(&store, "small");
    let config = CoreConfig {
        max_text_length: 40,
        ..CoreConfig::default()
    };
    let notes = NoteService::new(&store, config);
    let note = notes
        .create_note(NewNote::new(node_id, "#[Title]#\nT"))
        .unwrap();

    let err = notes
        .set_field(note.id, "Description", &"d".repeat(30), None)
        .unwrap_err();
    assert!(matches!(
        validation_errors(err).as_slice(),
        [ValidationError::TextTooLong { max: 40, .. }]
    ));

    let err = notes
        .set_field(note.id, "Description", "line\n#[Title]#\nhijack", None)
        .unwrap_err();
    assert_eq!(
        validation_errors(err),
        vec![ValidationError::MarkerInFieldValue("Description".to_string())]
    );
    let stored = notes.get_note(note.id).unwrap();
    assert_eq!(stored.text.as_str(), "#[Title]#\nT");
    assert_eq!(stored.field("Title"), Some("T"));
}

#[test]
fn note_service_cannot_reach_issues() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let notes = NoteService::new(&store, CoreConfig::default());
    let issues = IssueService::new(&store, CoreConfig::default());
    let issue = issues
        .create_issue(NewIssue::new("#[Title]#\nOpen redirect"))
        .unwrap();

    assert!(matches!(
        notes.get_note(issue.id()),
        Err(ServiceError::NotFound { entity: "note", .. })
    ));
    assert!(matches!(
        notes.delete_note(issue.id(), Some("mallory")),
        Err(ServiceError::NotFound { entity: "note", .. })
    ));
    assert!(matches!(
        notes.set_field(issue.id(), "Title", "renamed", None),
        Err(ServiceError::NotFound { entity: "note", .. })
    ));

    let fetched = issues.get_issue(issue.id()).unwrap();
    assert_eq!(issues.title_of(&fetched), "Open redirect");
    assert!(notes.activities(issue.id()).unwrap().is_empty());
    assert_eq!(issues.activities(issue.id()).unwrap().len(), 1);
}

#[test]
fn reads_never_create_categories() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let node_id = host(&store, "readonly");
    let notes = NoteService::new(&store, CoreConfig::default());
    let issues = IssueService::new(&store, CoreConfig::default());

    assert!(notes.list_for_node(node_id).unwrap().is_empty());
    assert!(notes.recently_updated().unwrap().is_empty());
    assert!(notes.search("anything").unwrap().is_empty());
    assert!(issues.list_issues().unwrap().is_empty());
    assert!(issues.search("anything").unwrap().is_empty());
    assert!(matches!(
        issues.get_issue(Uuid::new_v4()),
        Err(ServiceError::NotFound { entity: "issue", .. })
    ));

    let categories: i64 = conn
        .query_row("SELECT COUNT(*) FROM categories;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(categories, 0);
}

#[test]
fn writes_record_versions_and_activities() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let node_id = host(&store, "audit");
    let notes = NoteService::new(&store, CoreConfig::default());

    let mut input = NewNote::new(node_id, "first");
    input.author = Some("alice".to_string());
    let note = notes.create_note(input).unwrap();
    notes
        .update_note(
            note.id,
            NoteUpdate {
                text: Some("second".to_string()),
                ..NoteUpdate::default()
            },
            Some("bob"),
        )
        .unwrap();
    notes.delete_note(note.id, Some("carol")).unwrap();

    let versions = notes.versions(note.id).unwrap();
    let snapshot: Vec<(ChangeAction, &str, Option<&str>)> = versions
        .iter()
        .map(|version| {
            (
                version.event,
                version.text.as_str(),
                version.whodunnit.as_deref(),
            )
        })
        .collect();
    assert_eq!(
        snapshot,
        vec![
            (ChangeAction::Create, "", Some("alice")),
            (ChangeAction::Update, "first", Some("bob")),
            (ChangeAction::Destroy, "second", Some("carol")),
        ]
    );

    let actions: Vec<ChangeAction> = notes
        .activities(note.id)
        .unwrap()
        .iter()
        .map(|activity| activity.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            ChangeAction::Create,
            ChangeAction::Update,
            ChangeAction::Destroy
        ]
    );
    assert!(matches!(
        notes.get_note(note.id),
        Err(ServiceError::NotFound { entity: "note", .. })
    ));
}

#[test]
fn list_for_node_orders_by_updated_at_desc() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let node_id = host(&store, "ordering");
    let other_node = host(&store, "other");
    let notes = NoteService::new(&store, CoreConfig::default());

    let first = notes.create_note(NewNote::new(node_id, "first")).unwrap();
    let second = notes.create_note(NewNote::new(node_id, "second")).unwrap();
    notes.create_note(NewNote::new(other_node, "elsewhere")).unwrap();
    set_updated_at(&conn, first.id, 2_000);
    set_updated_at(&conn, second.id, 1_000);

    let listed: Vec<Uuid> = notes
        .list_for_node(node_id)
        .unwrap()
        .iter()
        .map(|note| note.id)
        .collect();
    assert_eq!(listed, vec![first.id, second.id]);
}

#[test]
fn recent_listings_cover_the_last_day() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let node_id = host(&store, "recent");
    let notes = NoteService::new(&store, CoreConfig::default());

    let fresh = notes.create_note(NewNote::new(node_id, "fresh")).unwrap();
    let stale = notes.create_note(NewNote::new(node_id, "stale")).unwrap();
    conn.execute(
        "UPDATE notes SET created_at = 1000, updated_at = 1000 WHERE id = ?1;",
        params![stale.id.to_string()],
    )
    .unwrap();

    let created: Vec<Uuid> = notes
        .recently_created()
        .unwrap()
        .iter()
        .map(|note| note.id)
        .collect();
    assert_eq!(created, vec![fresh.id]);
    let updated: Vec<Uuid> = notes
        .recently_updated()
        .unwrap()
        .iter()
        .map(|note| note.id)
        .collect();
    assert_eq!(updated, vec![fresh.id]);
}

#[test]
fn saving_a_note_touches_its_node() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let node_id = host(&store, "touched");
    conn.execute(
        "UPDATE nodes SET updated_at = 1 WHERE id = ?1;",
        params![node_id.to_string()],
    )
    .unwrap();

    NoteService::new(&store, CoreConfig::default())
        .create_note(NewNote::new(node_id, "body"))
        .unwrap();

    let updated_at: i64 = conn
        .query_row(
            "SELECT updated_at FROM nodes WHERE id = ?1;",
            params![node_id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert!(updated_at > 1);
}

fn set_updated_at(conn: &Connection, id: Uuid, updated_at: i64) {
    conn.execute(
        "UPDATE notes SET updated_at = ?2 WHERE id = ?1;",
        params![id.to_string(), updated_at],
    )
    .unwrap();
}
