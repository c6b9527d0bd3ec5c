//! Render collaborator: read-only views of the tree.
//!
//! Two renderings share the same mode-dependent label content: Graphviz DOT
//! source for diagrams and a termtree-based view for the terminal. Neither
//! touches derived fields.

use std::fmt::Write as _;

use termtree::Tree;
use tracing::instrument;

use crate::domain::{engine, Branch, Node, NodeKind, TreeStore};

/// What the labels show: cumulative probability only, or frequency/cost/risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Probability,
    Risk,
}

/// Frequency per year: scientific below 1e-3, plain otherwise.
pub fn format_frequency(value: f64) -> String {
    if value < 0.001 {
        format!("{value:.2e}")
    } else {
        format!("{value:.4}")
    }
}

/// Money with thousands separators, e.g. `50,000` or `10,000.00`.
pub fn format_money(value: f64, decimals: usize) -> String {
    let plain = format!("{value:.decimals$}");
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (plain.as_str(), None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    match frac_part {
        Some(f) => format!("{grouped}.{f}"),
        None => grouped,
    }
}

/// Escape a string for use inside a DOT double-quoted label.
fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn dot_label(node: &Node, mode: DisplayMode) -> String {
    match node.kind {
        NodeKind::Root => {
            let mut label = node.name.clone();
            if mode == DisplayMode::Risk {
                label.push_str(&format!(
                    "\\nFreq: {}/yr",
                    format_frequency(node.initiating_frequency)
                ));
            }
            label
        }
        NodeKind::Barrier => {
            format!("{}\\n(P: {:.2})", node.name, node.success_probability)
        }
        NodeKind::Outcome => match mode {
            DisplayMode::Probability => {
                format!("{}\\nProb: {:.4}", node.name, node.path_probability)
            }
            DisplayMode::Risk => format!(
                "{}\\nFreq: {:.2e}/yr\\nCost: ${}\\nRisk: ${}/yr",
                node.name,
                node.path_frequency,
                format_money(node.cost, 0),
                format_money(node.risk, 2),
            ),
        },
    }
}

/// Tint outcomes by the flavor of their name: losses red, safe endings green.
fn outcome_fill(name: &str) -> &'static str {
    if name.contains("Loss") || name.contains("Fatality") {
        "#FFEBEE"
    } else if name.contains("Safe") || name.contains("Minor") {
        "#E8F5E9"
    } else {
        "#F5F5F5"
    }
}

/// Produce Graphviz DOT source for the tree.
///
/// Left-to-right orthogonal layout; `tailport=e`/`headport=w` pin the edges
/// to the node sides so the hierarchy reads as an event tree.
#[instrument(level = "debug", skip(store))]
pub fn to_dot(store: &TreeStore, mode: DisplayMode) -> String {
    let mut dot = String::new();
    dot.push_str("digraph {\n");
    dot.push_str("    rankdir=LR splines=ortho nodesep=0.8 ranksep=1.5\n");
    dot.push_str("    node [shape=rect fontname=\"Arial\" fontsize=12 margin=0.15 height=0.5]\n");

    for node in store.iter() {
        let label = escape(&dot_label(node, mode));
        match node.kind {
            NodeKind::Root => {
                let _ = writeln!(
                    dot,
                    "    \"{}\" [label=\"{}\" shape=box style=\"filled,rounded\" fillcolor=\"#EEEEEE\" color=\"#222222\" penwidth=2]",
                    node.id, label
                );
            }
            NodeKind::Barrier => {
                let _ = writeln!(
                    dot,
                    "    \"{}\" [label=\"{}\" shape=box style=filled fillcolor=white]",
                    node.id, label
                );
            }
            NodeKind::Outcome => {
                let _ = writeln!(
                    dot,
                    "    \"{}\" [label=\"{}\" shape=note style=filled fillcolor=\"{}\"]",
                    node.id,
                    label,
                    outcome_fill(&node.name)
                );
            }
        }
    }

    for node in store.iter() {
        let Some(parent_id) = &node.parent else {
            continue;
        };
        let Some(parent) = store.get(parent_id) else {
            continue;
        };

        if parent.kind == NodeKind::Root {
            // Neutral stem from the initiating event, no Yes/No semantics.
            let _ = writeln!(
                dot,
                "    \"{}\" -> \"{}\" [color=\"#666666\" penwidth=2.0 arrowsize=0.8 tailport=e headport=w]",
                parent_id, node.id
            );
        } else {
            let (word, color) = match node.branch {
                Some(Branch::Success) => ("Yes", "#2E7D32"),
                _ => ("No", "#C62828"),
            };
            let edge = engine::edge_probability(parent, node.branch);
            let _ = writeln!(
                dot,
                "    \"{}\" -> \"{}\" [label=\"{}\\n({:.2})\" color=\"{}\" fontcolor=\"{}\" fontsize=10 tailport=e headport=w]",
                parent_id, node.id, word, edge, color, color
            );
        }
    }

    dot.push_str("}\n");
    dot
}

fn text_label(store: &TreeStore, node: &Node, mode: DisplayMode) -> String {
    let prefix = match node.branch {
        Some(Branch::Success) => "✓ ",
        Some(Branch::Failure) => "✗ ",
        None => "",
    };
    let edge = node
        .parent
        .as_ref()
        .and_then(|p| store.get(p))
        .filter(|p| p.kind != NodeKind::Root)
        .map(|p| format!("({:.2}) ", engine::edge_probability(p, node.branch)))
        .unwrap_or_default();

    let body = match node.kind {
        NodeKind::Root => match mode {
            DisplayMode::Probability => node.name.clone(),
            DisplayMode::Risk => format!(
                "{} Freq: {}/yr",
                node.name,
                format_frequency(node.initiating_frequency)
            ),
        },
        NodeKind::Barrier => format!("{} (P: {:.2})", node.name, node.success_probability),
        NodeKind::Outcome => match mode {
            DisplayMode::Probability => {
                format!("{} Prob: {:.4}", node.name, node.path_probability)
            }
            DisplayMode::Risk => format!(
                "{} Freq: {:.2e}/yr Cost: ${} Risk: ${}/yr",
                node.name,
                node.path_frequency,
                format_money(node.cost, 0),
                format_money(node.risk, 2),
            ),
        },
    };

    format!("{prefix}{edge}{body}  [{}]", node.id)
}

fn build_subtree(store: &TreeStore, node: &Node, mode: DisplayMode) -> Tree<String> {
    let mut tree = Tree::new(text_label(store, node, mode));
    // Success branch first, for a stable top-to-bottom reading order.
    let mut children: Vec<&Node> = store
        .children_of(&node.id)
        .iter()
        .filter_map(|c| store.get(c))
        .collect();
    children.sort_by_key(|c| match c.branch {
        Some(Branch::Success) => 0,
        Some(Branch::Failure) => 1,
        None => 2,
    });
    for child in children {
        tree.push(build_subtree(store, child, mode));
    }
    tree
}

/// Terminal tree view of the whole event tree.
#[instrument(level = "debug", skip(store))]
pub fn to_text_tree(store: &TreeStore, mode: DisplayMode) -> String {
    let Some(root) = store.root_ids().first().and_then(|id| store.get(id)).cloned() else {
        return String::from("(empty tree)");
    };
    build_subtree(store, &root, mode).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_is_digit_grouped() {
        assert_eq!(format_money(50000.0, 0), "50,000");
        assert_eq!(format_money(10000.0, 2), "10,000.00");
        assert_eq!(format_money(999.0, 0), "999");
        assert_eq!(format_money(1234567.5, 2), "1,234,567.50");
    }

    #[test]
    fn frequency_switches_to_scientific_below_millis() {
        assert_eq!(format_frequency(2.0), "2.0000");
        assert!(format_frequency(0.0002).contains('e'));
    }

    #[test]
    fn labels_are_dot_escaped() {
        assert_eq!(escape(r#"say "no""#), r#"say \"no\""#);
    }
}
