//! Tree builder turning the flat backend record list into a forest.

use std::collections::{HashMap, HashSet};

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::domain::arena::Forest;
use crate::domain::{IndustryNode, NodeId};

/// Constructs the forest from parent-referencing records.
///
/// Records without a resolvable `parent_id` become roots. Children keep
/// source order. Building never fails: dangling references and cycles
/// left behind by the backend are broken by promoting a record to root.
pub struct TreeBuilder {
    relationship_cache: HashMap<NodeId, Vec<usize>>,
    visited: HashSet<NodeId>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a forest from `records` with a fresh builder.
pub fn build_forest(records: &[IndustryNode]) -> Forest {
    TreeBuilder::new().build(records)
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            relationship_cache: HashMap::new(),
            visited: HashSet::new(),
        }
    }

    #[instrument(level = "debug", skip_all, fields(records = records.len()))]
    pub fn build(&mut self, records: &[IndustryNode]) -> Forest {
        // Reset state for a fresh build
        self.relationship_cache.clear();
        self.visited.clear();

        let mut forest = Forest::new();
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            if seen.insert(record.id) {
                unique.push(pos);
            } else {
                warn!("duplicate industry id {} ignored", record.id);
            }
        }

        let mut root_positions = Vec::new();
        for &pos in &unique {
            let record = &records[pos];
            match record.parent_id {
                Some(parent) if parent != record.id && seen.contains(&parent) => {
                    self.relationship_cache.entry(parent).or_default().push(pos);
                }
                Some(parent) => {
                    debug!("industry {} has dangling parent {}", record.id, parent);
                    forest.record_orphan(record.id);
                    root_positions.push(pos);
                }
                None => root_positions.push(pos),
            }
        }

        for pos in root_positions {
            self.attach_subtree(&mut forest, records, pos);
        }

        // Whatever is still unvisited sits on a cycle with no root above it
        for &pos in &unique {
            if !self.visited.contains(&records[pos].id) {
                warn!("industry {} is part of a parent cycle", records[pos].id);
                forest.record_orphan(records[pos].id);
                self.attach_subtree(&mut forest, records, pos);
            }
        }

        debug!(
            "built forest: {} nodes, {} roots",
            forest.len(),
            forest.roots().len()
        );
        forest
    }

    fn attach_subtree(&mut self, forest: &mut Forest, records: &[IndustryNode], root: usize) {
        let mut stack: Vec<(usize, Option<Index>)> = vec![(root, None)];

        while let Some((pos, parent_idx)) = stack.pop() {
            let record = &records[pos];
            if !self.visited.insert(record.id) {
                continue;
            }
            let current_idx = forest.insert_node(record.clone(), parent_idx);

            // Reverse push keeps children in source order
            if let Some(children) = self.relationship_cache.get(&record.id) {
                for &child in children.iter().rev() {
                    stack.push((child, Some(current_idx)));
                }
            }
        }
    }
}
