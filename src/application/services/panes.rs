//! Comparison panes and per-pane expansion state
//!
//! Each selected main category renders as its own pane. Expansion is keyed
//! by pane so expand state never leaks between panes.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::domain::{Forest, NodeId};

/// Result of the global expand/collapse toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalToggle {
    Collapsed,
    Expanded,
}

#[derive(Debug, Default, Clone)]
pub struct Panes {
    /// Open panes in the order they were opened
    selection: Vec<NodeId>,
    /// Expanded node ids per pane root
    expansion: HashMap<NodeId, BTreeSet<NodeId>>,
}

impl Panes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    pub fn is_open(&self, root: NodeId) -> bool {
        self.selection.contains(&root)
    }

    /// Open the pane if closed, close it if open. Returns true when now open.
    pub fn toggle_root(&mut self, root: NodeId) -> bool {
        if self.close(root) {
            false
        } else {
            self.open(root);
            true
        }
    }

    pub fn open(&mut self, root: NodeId) {
        if !self.is_open(root) {
            debug!("pane {} opened", root);
            self.selection.push(root);
        }
    }

    /// Close the pane and drop its expansion state. Returns false if it was not open.
    pub fn close(&mut self, root: NodeId) -> bool {
        let was_open = self.is_open(root);
        self.selection.retain(|&r| r != root);
        self.expansion.remove(&root);
        if was_open {
            debug!("pane {} closed", root);
        }
        was_open
    }

    pub fn clear_all(&mut self) {
        debug!("all panes cleared");
        self.selection.clear();
        self.expansion.clear();
    }

    pub fn expanded(&self, root: NodeId) -> Option<&BTreeSet<NodeId>> {
        self.expansion.get(&root)
    }

    pub fn is_expanded(&self, root: NodeId, id: NodeId) -> bool {
        self.expansion
            .get(&root)
            .is_some_and(|set| set.contains(&id))
    }

    /// Flip one node in one pane. Returns true when now expanded.
    ///
    /// Ignored unless the pane is open and `id` sits under its root.
    pub fn toggle_node(&mut self, forest: &Forest, root: NodeId, id: NodeId) -> bool {
        if !self.is_open(root) || !forest.is_descendant(root, id) {
            debug!("pane {}: toggle of {} ignored", root, id);
            return false;
        }
        let set = self.expansion.entry(root).or_default();
        if set.remove(&id) {
            false
        } else {
            set.insert(id);
            true
        }
    }

    pub fn expand(&mut self, root: NodeId, id: NodeId) {
        self.expansion.entry(root).or_default().insert(id);
    }

    pub fn expand_all(&mut self, root: NodeId, forest: &Forest) {
        if !self.is_open(root) {
            return;
        }
        let all: BTreeSet<NodeId> = forest.descendants_of(root).into_iter().collect();
        debug!("pane {}: expanded {} nodes", root, all.len());
        self.expansion.insert(root, all);
    }

    pub fn collapse_all(&mut self, root: NodeId) {
        if !self.is_open(root) {
            return;
        }
        self.expansion.insert(root, BTreeSet::new());
    }

    /// Whether any open pane has any expanded node.
    pub fn any_expanded(&self) -> bool {
        self.selection
            .iter()
            .any(|root| self.expansion.get(root).is_some_and(|s| !s.is_empty()))
    }

    /// Collapse every pane if anything is expanded, otherwise expand every pane fully.
    pub fn toggle_global(&mut self, forest: &Forest) -> GlobalToggle {
        let roots = self.selection.clone();
        if self.any_expanded() {
            roots.into_iter().for_each(|root| self.collapse_all(root));
            GlobalToggle::Collapsed
        } else {
            roots
                .into_iter()
                .for_each(|root| self.expand_all(root, forest));
            GlobalToggle::Expanded
        }
    }

    /// Remove ids from the selection and from every pane's expansion set.
    ///
    /// Returns the panes that were closed.
    pub fn prune_nodes(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        let closed: Vec<NodeId> = self
            .selection
            .iter()
            .copied()
            .filter(|root| ids.contains(root))
            .collect();
        for &root in &closed {
            self.close(root);
        }
        for set in self.expansion.values_mut() {
            set.retain(|id| !ids.contains(id));
        }
        closed
    }

    /// Align with a freshly built forest.
    ///
    /// Panes whose root is no longer a main category are closed. Expansion
    /// is kept only for open panes and only for ids still under their root.
    /// Returns the panes that were closed.
    pub fn reconcile(&mut self, forest: &Forest) -> Vec<NodeId> {
        let closed: Vec<NodeId> = self
            .selection
            .iter()
            .copied()
            .filter(|&root| !forest.is_root(root))
            .collect();
        for &root in &closed {
            self.close(root);
        }
        let selection = &self.selection;
        self.expansion.retain(|root, _| selection.contains(root));
        for (root, set) in self.expansion.iter_mut() {
            set.retain(|&id| forest.is_descendant(*root, id));
        }
        closed
    }
}
