//! Wire format and session file tests

use evtree::application::{persist, session, ApplicationError};
use evtree::domain::{engine, Branch, NewNode, NodeKind, NodeUpdate, TreeStore};
use rstest::{fixture, rstest};

#[fixture]
fn detector_tree() -> TreeStore {
    let mut store = engine::initialize();
    let root = store.root_ids()[0].clone();
    engine::update(
        &mut store,
        &root,
        NodeUpdate {
            name: Some("Fire Ignition".into()),
            initiating_frequency: Some(2.0),
            ..Default::default()
        },
    )
    .unwrap();
    let detector = engine::insert(
        &mut store,
        &root,
        Branch::Success,
        NewNode::Barrier {
            name: "Detector".into(),
            success_probability: 0.9,
        },
    )
    .unwrap();
    engine::insert(
        &mut store,
        &detector,
        Branch::Failure,
        NewNode::Outcome {
            name: "Loss".into(),
            cost: 50_000.0,
        },
    )
    .unwrap();
    store
}

// ============================================================
// Round trip
// ============================================================

#[rstest]
fn given_exported_tree_when_imported_then_structure_is_isomorphic(detector_tree: TreeStore) {
    let json = persist::export_string(&detector_tree).unwrap();
    let restored = persist::import_str(&json).unwrap();

    assert_eq!(restored.len(), detector_tree.len());
    for original in detector_tree.iter() {
        let node = restored.get(&original.id).expect("id preserved");
        assert_eq!(node.kind, original.kind);
        assert_eq!(node.name, original.name);
        assert_eq!(node.parent, original.parent);
        assert_eq!(node.branch, original.branch);
        assert_eq!(node.success_probability, original.success_probability);
        assert_eq!(node.initiating_frequency, original.initiating_frequency);
        assert_eq!(node.cost, original.cost);
        // derived fields were recomputed, not merely copied
        assert_eq!(node.path_probability, original.path_probability);
        assert_eq!(node.path_frequency, original.path_frequency);
        assert_eq!(node.risk, original.risk);
    }
}

#[rstest]
fn given_exported_tree_when_reading_json_then_wire_spellings_hold(detector_tree: TreeStore) {
    let json = persist::export_string(&detector_tree).unwrap();

    assert!(json.contains("\"type\": \"root\""));
    assert!(json.contains("\"type\": \"event\""));
    assert!(json.contains("\"type\": \"outcome\""));
    assert!(json.contains("\"Success (Yes)\""));
    assert!(json.contains("\"Failure (No)\""));
    assert!(json.contains("\"path_prob\""));
    assert!(json.contains("\"parent_id\""));
}

// ============================================================
// Import validation
// ============================================================

#[test]
fn given_non_mapping_payload_when_importing_then_malformed() {
    for payload in ["[1, 2, 3]", "42", "\"tree\"", "null"] {
        let err = persist::import_str(payload).unwrap_err();
        assert!(
            matches!(err, ApplicationError::MalformedPersistence { .. }),
            "payload {payload:?} gave {err:?}"
        );
    }
}

#[test]
fn given_mapping_without_root_when_importing_then_malformed() {
    let payload = r#"{
        "aaaaaaaa": {
            "name": "Lonely Outcome",
            "type": "outcome",
            "parent_id": null,
            "branch": null
        }
    }"#;
    let err = persist::import_str(payload).unwrap_err();
    assert!(matches!(err, ApplicationError::MalformedPersistence { .. }));
}

#[test]
fn given_mapping_with_two_roots_when_importing_then_malformed() {
    let payload = r#"{
        "aaaaaaaa": { "name": "One", "type": "root", "parent_id": null, "branch": null },
        "bbbbbbbb": { "name": "Two", "type": "root", "parent_id": null, "branch": null }
    }"#;
    let err = persist::import_str(payload).unwrap_err();
    assert!(matches!(err, ApplicationError::MalformedPersistence { .. }));
}

#[test]
fn given_root_with_parent_when_importing_then_malformed() {
    // A parented root would make the root reachable from itself and the
    // recompute traversal would never finish.
    let payload = r#"{
        "aaaaaaaa": {
            "name": "Ouroboros",
            "type": "root",
            "parent_id": "aaaaaaaa",
            "branch": "Failure (No)"
        }
    }"#;
    let err = persist::import_str(payload).unwrap_err();
    assert!(matches!(err, ApplicationError::MalformedPersistence { .. }));
    assert!(err.to_string().contains("parent"));
}

#[test]
fn given_unparseable_record_when_importing_then_malformed() {
    let payload = r#"{ "aaaaaaaa": { "name": "No Kind" } }"#;
    let err = persist::import_str(payload).unwrap_err();
    assert!(matches!(err, ApplicationError::MalformedPersistence { .. }));
}

// ============================================================
// Defaults and stale derived fields
// ============================================================

#[test]
fn given_sparse_records_when_importing_then_numeric_defaults_apply() {
    let payload = r#"{
        "aaaaaaaa": { "name": "Start", "type": "root", "parent_id": null, "branch": null }
    }"#;
    let store = persist::import_str(payload).unwrap();
    let root = store.get(&"aaaaaaaa".into()).unwrap();
    assert_eq!(root.initiating_frequency, 1.0);
    assert_eq!(root.path_frequency, 1.0);
    assert_eq!(root.cost, 0.0);
}

#[test]
fn given_stale_derived_fields_when_importing_then_they_are_recomputed() {
    let payload = r#"{
        "aaaaaaaa": {
            "name": "Start", "type": "root", "freq": 3.0,
            "path_prob": 0.123, "path_freq": 99.0, "risk": 7.0,
            "parent_id": null, "branch": null
        },
        "bbbbbbbb": {
            "name": "Boom", "type": "outcome", "cost": 10.0,
            "path_prob": 0.5, "path_freq": 0.5, "risk": 12345.0,
            "parent_id": "aaaaaaaa", "branch": "Failure (No)"
        }
    }"#;
    let store = persist::import_str(payload).unwrap();

    let root = store.get(&"aaaaaaaa".into()).unwrap();
    assert_eq!(root.path_probability, 1.0);
    assert_eq!(root.path_frequency, 3.0);

    // root edge carries probability 1 regardless of branch
    let outcome = store.get(&"bbbbbbbb".into()).unwrap();
    assert_eq!(outcome.kind, NodeKind::Outcome);
    assert_eq!(outcome.path_probability, 1.0);
    assert_eq!(outcome.path_frequency, 3.0);
    assert_eq!(outcome.risk, 30.0);
}

// ============================================================
// Session file
// ============================================================

#[rstest]
fn given_saved_session_when_loading_then_tree_is_back(detector_tree: TreeStore) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.json");

    session::save(&path, &detector_tree).unwrap();
    let restored = session::load(&path).unwrap();

    assert_eq!(restored.len(), detector_tree.len());
    for original in detector_tree.iter() {
        assert!(restored.contains(&original.id));
    }
}

#[test]
fn given_missing_session_file_when_loading_then_error_mentions_init() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.json");

    let err = session::load(&path).unwrap_err();
    assert!(matches!(err, ApplicationError::Io { .. }));
    assert!(err.to_string().contains("evtree init"));
}
