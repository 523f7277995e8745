//! Pane rows and tree views
//!
//! A pane lists the children of its main category; the main category itself
//! is the pane header. Collapsed nodes hide their subtree.

use std::collections::BTreeSet;

use termtree::Tree;

use crate::domain::{Forest, MainCategoryOrder, NodeId};

/// One visible row of a pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneRow {
    pub id: NodeId,
    pub name: String,
    /// Indentation inside the pane, 0 for the root's children
    pub depth: usize,
    /// Level in the forest, 1 for the root's children
    pub level: usize,
    pub has_children: bool,
    pub expanded: bool,
}

/// Visible rows under `root`, honoring the pane's expansion set.
pub fn pane_rows(forest: &Forest, root: NodeId, expanded: Option<&BTreeSet<NodeId>>) -> Vec<PaneRow> {
    let mut rows = Vec::new();
    for child in forest.children_of(root) {
        push_rows(forest, child, 0, expanded, &mut rows);
    }
    rows
}

fn push_rows(
    forest: &Forest,
    id: NodeId,
    depth: usize,
    expanded: Option<&BTreeSet<NodeId>>,
    rows: &mut Vec<PaneRow>,
) {
    let Some(record) = forest.find_by_id(id) else {
        return;
    };
    let children = forest.children_of(id);
    let is_expanded = expanded.is_some_and(|set| set.contains(&id));
    rows.push(PaneRow {
        id,
        name: record.name.clone(),
        depth,
        level: depth + 1,
        has_children: !children.is_empty(),
        expanded: is_expanded,
    });
    if is_expanded {
        for child in children {
            push_rows(forest, child, depth + 1, expanded, rows);
        }
    }
}

fn label(forest: &Forest, id: NodeId) -> String {
    let name = forest
        .find_by_id(id)
        .map(|n| n.name.as_str())
        .unwrap_or("?");
    format!("{} [{}]", name, id)
}

fn full_subtree(forest: &Forest, id: NodeId) -> Tree<String> {
    let leaves: Vec<_> = forest
        .children_of(id)
        .into_iter()
        .map(|child| full_subtree(forest, child))
        .collect();
    Tree::new(label(forest, id)).with_leaves(leaves)
}

/// Every main category in display order with its complete subtree.
pub fn forest_tree(forest: &Forest, order: &MainCategoryOrder) -> Vec<Tree<String>> {
    order
        .ids()
        .iter()
        .filter(|id| forest.contains(**id))
        .map(|&root| full_subtree(forest, root))
        .collect()
}

/// One pane as a tree. Collapsed nodes with children show their hidden count.
pub fn pane_tree(forest: &Forest, root: NodeId, expanded: Option<&BTreeSet<NodeId>>) -> Tree<String> {
    let leaves: Vec<_> = forest
        .children_of(root)
        .into_iter()
        .map(|child| pane_subtree(forest, child, expanded))
        .collect();
    Tree::new(label(forest, root)).with_leaves(leaves)
}

fn pane_subtree(forest: &Forest, id: NodeId, expanded: Option<&BTreeSet<NodeId>>) -> Tree<String> {
    let children = forest.children_of(id);
    if children.is_empty() {
        return Tree::new(label(forest, id));
    }
    if !expanded.is_some_and(|set| set.contains(&id)) {
        let hidden = forest.descendants_of(id).len();
        return Tree::new(format!("{} (+{})", label(forest, id), hidden));
    }
    let leaves: Vec<_> = children
        .into_iter()
        .map(|child| pane_subtree(forest, child, expanded))
        .collect();
    Tree::new(label(forest, id)).with_leaves(leaves)
}
