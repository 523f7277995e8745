//! Client-side ordering of main categories.
//!
//! Reordering roots is visual only and never reaches the backend.

use tracing::debug;

use crate::domain::arena::Forest;
use crate::domain::NodeId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MainCategoryOrder {
    ids: Vec<NodeId>,
}

impl MainCategoryOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// Keep the saved order for roots that still exist, then append new roots
    /// in forest order. Afterwards the order holds exactly the current roots.
    pub fn reconcile(&mut self, forest: &Forest) {
        let current = forest.root_ids();
        self.ids.retain(|id| current.contains(id));
        for id in current {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    /// Move `moved` to the slot currently held by `target`.
    ///
    /// Returns false when either id is unknown or both are the same.
    pub fn move_before(&mut self, moved: NodeId, target: NodeId) -> bool {
        if moved == target {
            return false;
        }
        let (Some(from), Some(to)) = (self.position(moved), self.position(target)) else {
            return false;
        };
        let id = self.ids.remove(from);
        self.ids.insert(to, id);
        debug!("main category {} moved from slot {} to {}", moved, from, to);
        true
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.ids.iter().position(|&x| x == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{build_forest, IndustryNode};

    fn roots(ids: &[i64]) -> Forest {
        let records: Vec<_> = ids
            .iter()
            .map(|&id| IndustryNode::new(id, format!("R{id}"), None))
            .collect();
        build_forest(&records)
    }

    #[test]
    fn given_saved_order_when_reconciling_then_drops_missing_and_appends_new() {
        let mut order = MainCategoryOrder::new();
        order.reconcile(&roots(&[1, 2, 3]));
        assert!(order.move_before(NodeId(3), NodeId(1)));
        assert_eq!(order.ids(), &[NodeId(3), NodeId(1), NodeId(2)]);

        order.reconcile(&roots(&[1, 3, 4]));
        assert_eq!(order.ids(), &[NodeId(3), NodeId(1), NodeId(4)]);
    }

    #[test]
    fn given_forward_move_when_reordering_then_takes_target_slot() {
        let mut order = MainCategoryOrder::new();
        order.reconcile(&roots(&[1, 2, 3]));
        assert!(order.move_before(NodeId(1), NodeId(3)));
        assert_eq!(order.ids(), &[NodeId(2), NodeId(3), NodeId(1)]);
    }

    #[test]
    fn given_unknown_or_same_ids_when_reordering_then_nothing_changes() {
        let mut order = MainCategoryOrder::new();
        order.reconcile(&roots(&[1, 2]));
        assert!(!order.move_before(NodeId(1), NodeId(1)));
        assert!(!order.move_before(NodeId(5), NodeId(1)));
        assert_eq!(order.ids(), &[NodeId(1), NodeId(2)]);
    }
}
