//! Renderer tests: DOT source and terminal tree view

use evtree::application::render::{to_dot, to_text_tree};
use evtree::application::DisplayMode;
use evtree::domain::{engine, Branch, NewNode, NodeUpdate, TreeStore};
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
        Branch::Success,
        NewNode::Outcome {
            name: "Safe".into(),
            cost: 0.0,
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
// DOT source
// ============================================================

#[rstest]
fn given_probability_mode_when_rendering_dot_then_labels_show_probabilities(
    detector_tree: TreeStore,
) {
    let dot = to_dot(&detector_tree, DisplayMode::Probability);

    assert!(dot.starts_with("digraph {"));
    assert!(dot.contains("rankdir=LR"));
    assert!(dot.contains("splines=ortho"));
    assert!(dot.contains("Detector\\n(P: 0.90)"));
    assert!(dot.contains("Safe\\nProb: 0.9000"));
    assert!(dot.contains("Loss\\nProb: 0.1000"));
    // probability mode carries no money labels
    assert!(!dot.contains("Cost:"));
    assert!(!dot.contains("Risk:"));
}

#[rstest]
fn given_risk_mode_when_rendering_dot_then_labels_show_frequency_cost_risk(
    detector_tree: TreeStore,
) {
    let dot = to_dot(&detector_tree, DisplayMode::Risk);

    assert!(dot.contains("Fire Ignition\\nFreq: 2.0000/yr"));
    assert!(dot.contains("Cost: $50,000"));
    assert!(dot.contains("Risk: $10,000.00/yr"));
    assert!(dot.contains("Freq:"));
}

#[rstest]
fn given_branch_edges_when_rendering_dot_then_colors_and_labels_match(detector_tree: TreeStore) {
    let dot = to_dot(&detector_tree, DisplayMode::Probability);

    // success edge green, failure edge red, root stem neutral grey
    assert!(dot.contains("label=\"Yes\\n(0.90)\""));
    assert!(dot.contains("label=\"No\\n(0.10)\""));
    assert!(dot.contains("#2E7D32"));
    assert!(dot.contains("#C62828"));
    assert!(dot.contains("#666666"));
    assert!(dot.contains("tailport=e headport=w"));
}

#[rstest]
fn given_loss_and_safe_outcomes_when_rendering_dot_then_fills_are_tinted(
    detector_tree: TreeStore,
) {
    let dot = to_dot(&detector_tree, DisplayMode::Probability);
    assert!(dot.contains("#FFEBEE")); // Loss
    assert!(dot.contains("#E8F5E9")); // Safe
}

#[test]
fn given_quotes_in_names_when_rendering_dot_then_labels_are_escaped() {
    let mut store = engine::initialize();
    let root = store.root_ids()[0].clone();
    engine::update(
        &mut store,
        &root,
        NodeUpdate {
            name: Some(r#"The "Big" One"#.into()),
            ..Default::default()
        },
    )
    .unwrap();

    let dot = to_dot(&store, DisplayMode::Probability);
    assert!(dot.contains(r#"The \"Big\" One"#));
}

// ============================================================
// Terminal tree
// ============================================================

#[rstest]
fn given_probability_mode_when_rendering_text_then_tree_reads_top_down(detector_tree: TreeStore) {
    let text = to_text_tree(&detector_tree, DisplayMode::Probability);
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines[0].contains("Fire Ignition"));
    assert!(text.contains("Detector (P: 0.90)"));
    assert!(text.contains("✓"));
    assert!(text.contains("✗"));
    assert!(text.contains("Safe Prob: 0.9000"));
    assert!(text.contains("Loss Prob: 0.1000"));

    // success branch listed before failure branch
    let safe_line = lines.iter().position(|l| l.contains("Safe")).unwrap();
    let loss_line = lines.iter().position(|l| l.contains("Loss")).unwrap();
    assert!(safe_line < loss_line);
}

#[rstest]
fn given_risk_mode_when_rendering_text_then_outcomes_show_money(detector_tree: TreeStore) {
    let text = to_text_tree(&detector_tree, DisplayMode::Risk);

    assert!(text.contains("Freq: 2.0000/yr"));
    assert!(text.contains("Cost: $50,000"));
    assert!(text.contains("Risk: $10,000.00/yr"));
}

#[rstest]
fn given_any_mode_when_rendering_text_then_node_ids_are_visible(detector_tree: TreeStore) {
    let text = to_text_tree(&detector_tree, DisplayMode::Probability);
    for node in detector_tree.iter() {
        assert!(text.contains(&format!("[{}]", node.id)));
    }
}
