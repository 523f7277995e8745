//! Read-only path queries over a forest.

use tracing::instrument;

use crate::domain::arena::Forest;
use crate::domain::{IndustryNode, NodeId};

/// Display/creation label for a depth: "Main Industry", "Sub Industry",
/// "Sub-Sub Industry", ...
pub fn category_label_for_level(level: usize) -> String {
    if level == 0 {
        return "Main Industry".to_string();
    }
    format!("{} Industry", vec!["Sub"; level].join("-"))
}

impl Forest {
    pub fn find_by_id(&self, id: NodeId) -> Option<&IndustryNode> {
        self.node(id).map(|n| &n.record)
    }

    /// Depth below the nearest root (root = 0).
    #[instrument(level = "trace", skip(self))]
    pub fn level_of(&self, id: NodeId) -> Option<usize> {
        self.contains(id).then(|| self.ancestors_of(id).len())
    }

    /// Ancestor chain, nearest parent first, root last.
    pub fn ancestors_of(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.node(id).and_then(|n| n.parent);
        while let Some(idx) = current {
            match self.get_node(idx) {
                Some(node) => {
                    chain.push(node.id());
                    current = node.parent;
                }
                None => break,
            }
        }
        chain
    }

    /// Main category the node belongs to (itself when it is a root).
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        if !self.contains(id) {
            return None;
        }
        self.ancestors_of(id).last().copied().or(Some(id))
    }

    /// Every node below `id` in pre-order, excluding `id` itself.
    #[instrument(level = "trace", skip(self))]
    pub fn descendants_of(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(node) = self.node(id) {
            for &child in &node.children {
                self.collect_descendants(child, &mut out);
            }
        }
        out
    }

    fn collect_descendants(&self, idx: generational_arena::Index, out: &mut Vec<NodeId>) {
        if let Some(node) = self.get_node(idx) {
            out.push(node.id());
            for &child in &node.children {
                self.collect_descendants(child, out);
            }
        }
    }

    /// True when `target` lies strictly inside the subtree of `ancestor`.
    ///
    /// A node is never its own descendant. Guards every reparent: moving
    /// `ancestor` under `target` is legal only when this is false.
    #[instrument(level = "trace", skip(self))]
    pub fn is_descendant(&self, ancestor: NodeId, target: NodeId) -> bool {
        if ancestor == target || !self.contains(ancestor) {
            return false;
        }
        self.ancestors_of(target).contains(&ancestor)
    }
}
