use std::collections::{BTreeMap, HashMap};

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::{IndustryNode, NodeId};

/// Tree node in the arena-based forest.
#[derive(Debug)]
pub struct ForestNode {
    /// Backend record for this node
    pub record: IndustryNode,
    /// Index of parent node in the arena, None for roots
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in source order
    pub children: Vec<Index>,
}

impl ForestNode {
    pub fn id(&self) -> NodeId {
        self.record.id
    }
}

/// Arena-backed forest of industry trees.
///
/// Built fresh from the flat record list on every load and never patched.
/// Lookups by backend id go through an id index.
#[derive(Debug, Default)]
pub struct Forest {
    /// Arena storage for all nodes of all trees
    arena: Arena<ForestNode>,
    /// Root indices in source order
    roots: Vec<Index>,
    /// Backend id to arena index
    index: HashMap<NodeId, Index>,
    /// Records whose parent reference did not resolve
    orphans: Vec<NodeId>,
}

/// Identity-free shape of a forest, for structural comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestShape {
    pub roots: Vec<NodeId>,
    pub children: BTreeMap<NodeId, Vec<NodeId>>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "trace", skip(self, record), fields(id = %record.id))]
    pub fn insert_node(&mut self, record: IndustryNode, parent: Option<Index>) -> Index {
        let id = record.id;
        let node = ForestNode {
            record,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);
        self.index.insert(id, node_idx);

        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent) => parent.children.push(node_idx),
            None => self.roots.push(node_idx),
        }

        node_idx
    }

    pub(crate) fn record_orphan(&mut self, id: NodeId) {
        self.orphans.push(id);
    }

    pub fn get_node(&self, idx: Index) -> Option<&ForestNode> {
        self.arena.get(idx)
    }

    pub fn index_of(&self, id: NodeId) -> Option<Index> {
        self.index.get(&id).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&ForestNode> {
        self.index_of(id).and_then(|idx| self.arena.get(idx))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn root_ids(&self) -> Vec<NodeId> {
        self.roots
            .iter()
            .filter_map(|&idx| self.get_node(idx))
            .map(ForestNode::id)
            .collect()
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.parent.is_none())
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)
            .and_then(|n| n.parent)
            .and_then(|p| self.get_node(p))
            .map(ForestNode::id)
    }

    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|n| {
                n.children
                    .iter()
                    .filter_map(|&c| self.get_node(c))
                    .map(ForestNode::id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ids whose `parent_id` was set but did not resolve to a reachable node.
    pub fn orphans(&self) -> &[NodeId] {
        &self.orphans
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal over every tree, roots in source order.
    pub fn iter(&self) -> ForestIterator<'_> {
        ForestIterator::new(self)
    }

    /// Number of levels in the deepest tree (0 for an empty forest).
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    pub fn shape(&self) -> ForestShape {
        let children = self
            .iter()
            .map(|(_, node)| (node.id(), self.children_of(node.id())))
            .collect();
        ForestShape {
            roots: self.root_ids(),
            children,
        }
    }
}

pub struct ForestIterator<'a> {
    forest: &'a Forest,
    stack: Vec<Index>,
}

impl<'a> ForestIterator<'a> {
    fn new(forest: &'a Forest) -> Self {
        let stack = forest.roots.iter().rev().copied().collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for ForestIterator<'a> {
    type Item = (Index, &'a ForestNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_inserted_nodes_when_iterating_then_visits_preorder_across_roots() {
        let mut forest = Forest::new();
        let a = forest.insert_node(IndustryNode::new(1, "A", None), None);
        forest.insert_node(IndustryNode::new(2, "A1", Some(1)), Some(a));
        forest.insert_node(IndustryNode::new(3, "B", None), None);

        let ids: Vec<i64> = forest.iter().map(|(_, n)| n.id().0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(forest.root_ids(), vec![NodeId(1), NodeId(3)]);
        assert_eq!(forest.parent_of(NodeId(2)), Some(NodeId(1)));
        assert_eq!(forest.depth(), 2);
    }

    #[test]
    fn given_empty_forest_when_querying_then_everything_is_empty() {
        let forest = Forest::new();
        assert!(forest.is_empty());
        assert_eq!(forest.depth(), 0);
        assert!(forest.children_of(NodeId(1)).is_empty());
        assert!(!forest.is_root(NodeId(1)));
    }
}
