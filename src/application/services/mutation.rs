//! Mutation gateway: user intents to backend writes
//!
//! Every write is validated against the current forest first, then sent to
//! the backend, then followed by a full relist and rebuild. The previous
//! forest is never patched; callers replace it with the returned one.

use std::cell::Cell;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{
    build_forest, category_label_for_level, validate_name, DomainError, DomainResult, Forest,
    NewIndustry, NodeId,
};
use crate::infrastructure::traits::{BackendError, IndustryBackend, Prompter};

/// Renames never go below this length, whatever the policy says.
pub const RENAME_MIN_LEN: usize = 2;

/// Validation and confirmation policy for writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayPolicy {
    pub min_name_len: usize,
    pub rename_fallback: bool,
    pub confirm_cross_category: bool,
}

impl Default for GatewayPolicy {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for GatewayPolicy {
    fn from(settings: &Settings) -> Self {
        Self {
            min_name_len: settings.editor.min_name_len,
            rename_fallback: settings.api.rename_fallback,
            confirm_cross_category: settings.editor.confirm_cross_category,
        }
    }
}

/// Single in-flight flag guarding writes.
///
/// The flag is cleared when the guard drops, on success and failure alike.
#[derive(Debug, Default)]
pub struct InFlight {
    busy: Cell<bool>,
}

pub struct InFlightGuard<'a> {
    flag: &'a Cell<bool>,
}

impl InFlight {
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        if self.busy.replace(true) {
            return None;
        }
        Some(InFlightGuard { flag: &self.busy })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// A validated reparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReparentPlan {
    pub child: NodeId,
    /// None promotes the child to a main category
    pub new_parent: Option<NodeId>,
    /// The child ends up under a different main category
    pub crosses_category: bool,
    /// The child already sits under `new_parent`
    pub unchanged: bool,
}

/// Check that moving `child` under `new_parent` keeps the structure a forest.
pub fn plan_reparent(
    forest: &Forest,
    child: NodeId,
    new_parent: Option<NodeId>,
) -> DomainResult<ReparentPlan> {
    if !forest.contains(child) {
        return Err(DomainError::NodeNotFound(child));
    }
    // Compare against the stored parent: orphans are roots in the forest
    // but still carry a dangling parent on the backend.
    let unchanged = forest
        .find_by_id(child)
        .is_some_and(|node| node.parent_id == new_parent);
    let crosses_category = match new_parent {
        None => !forest.is_root(child),
        Some(parent) if parent == child => return Err(DomainError::SelfDrop(child)),
        Some(parent) if !forest.contains(parent) => {
            return Err(DomainError::NodeNotFound(parent))
        }
        Some(parent) if forest.is_descendant(child, parent) => {
            return Err(DomainError::CycleDetected {
                child,
                new_parent: parent,
            })
        }
        Some(parent) => forest.root_of(child) != forest.root_of(parent),
    };
    Ok(ReparentPlan {
        child,
        new_parent,
        crosses_category,
        unchanged,
    })
}

pub struct MutationGateway {
    backend: Arc<dyn IndustryBackend>,
    policy: GatewayPolicy,
    in_flight: InFlight,
}

impl MutationGateway {
    pub fn new(backend: Arc<dyn IndustryBackend>, policy: GatewayPolicy) -> Self {
        Self {
            backend,
            policy,
            in_flight: InFlight::default(),
        }
    }

    pub fn policy(&self) -> &GatewayPolicy {
        &self.policy
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Fetch every record and rebuild the forest from scratch.
    #[instrument(level = "debug", skip(self))]
    pub fn reload(&self) -> ApplicationResult<Forest> {
        let records = self.backend.list_industries()?;
        let forest = build_forest(&records);
        if !forest.orphans().is_empty() {
            warn!(
                "{} industries have an unresolvable parent and are shown as main categories",
                forest.orphans().len()
            );
        }
        Ok(forest)
    }

    fn begin(&self, operation: &'static str) -> ApplicationResult<InFlightGuard<'_>> {
        self.in_flight.try_begin().ok_or_else(|| {
            warn!("{} refused: another write is in flight", operation);
            ApplicationError::Busy { operation }
        })
    }

    /// Send a write, then reload. Errors leave the caller's forest untouched.
    fn write_then_reload(
        &self,
        operation: &'static str,
        write: impl FnOnce() -> Result<(), BackendError>,
    ) -> ApplicationResult<Forest> {
        let _guard = self.begin(operation)?;
        if let Err(e) = write() {
            warn!("{} failed: {}", operation, e);
            return Err(e.into());
        }
        info!("{} succeeded", operation);
        self.reload()
    }

    pub fn add_root(&self, name: &str) -> ApplicationResult<Forest> {
        debug!("add_root: name={:?}", name);
        let name = validate_name(name, 1)?;
        let new = NewIndustry {
            name,
            category: category_label_for_level(0),
            parent_id: None,
        };
        self.write_then_reload("add main category", || {
            self.backend.create_industry(&new).map(|_| ())
        })
    }

    pub fn add_child(
        &self,
        forest: &Forest,
        parent: NodeId,
        name: &str,
    ) -> ApplicationResult<Forest> {
        debug!("add_child: parent={}, name={:?}", parent, name);
        let level = forest
            .level_of(parent)
            .ok_or(DomainError::NodeNotFound(parent))?;
        let name = validate_name(name, self.policy.min_name_len)?;
        let new = NewIndustry {
            name,
            category: category_label_for_level(level + 1),
            parent_id: Some(parent),
        };
        self.write_then_reload("add sub-industry", || {
            self.backend.create_industry(&new).map(|_| ())
        })
    }

    /// Rename through the canonical endpoint; on not-found, optionally try
    /// the legacy endpoint once.
    pub fn rename(&self, forest: &Forest, id: NodeId, name: &str) -> ApplicationResult<Forest> {
        debug!("rename: id={}, name={:?}", id, name);
        if !forest.contains(id) {
            return Err(DomainError::NodeNotFound(id).into());
        }
        let name = validate_name(name, self.policy.min_name_len.max(RENAME_MIN_LEN))?;
        self.write_then_reload("rename", || {
            let renamed = match self.backend.rename_industry(id, &name) {
                Err(BackendError::NotFound { what }) if self.policy.rename_fallback => {
                    warn!("rename: {} not found, trying legacy endpoint", what);
                    self.backend.rename_industry_legacy(id, &name)
                }
                other => other,
            };
            renamed.map(|_| ())
        })
    }

    /// Delete a node and its whole subtree after confirmation.
    pub fn delete_subtree(
        &self,
        forest: &Forest,
        id: NodeId,
        prompter: &dyn Prompter,
    ) -> ApplicationResult<Forest> {
        debug!("delete_subtree: id={}", id);
        let node = forest
            .find_by_id(id)
            .ok_or(DomainError::NodeNotFound(id))?;
        let below = forest.descendants_of(id).len();
        let message = if below == 0 {
            format!("Delete '{}'?", node.name)
        } else {
            format!("Delete '{}' and its {} sub-industries?", node.name, below)
        };
        if !prompter.confirm(&message) {
            debug!("delete_subtree: declined");
            return Err(ApplicationError::Cancelled);
        }
        self.write_then_reload("delete", || self.backend.delete_industry(id))
    }

    /// Move `child` under `new_parent`, or promote it when `new_parent` is None.
    ///
    /// Promotion always asks; moves across main categories ask when the
    /// policy says so. An unchanged parent skips the write.
    pub fn reparent(
        &self,
        forest: &Forest,
        child: NodeId,
        new_parent: Option<NodeId>,
        prompter: &dyn Prompter,
    ) -> ApplicationResult<Forest> {
        debug!("reparent: child={}, new_parent={:?}", child, new_parent);
        let plan = plan_reparent(forest, child, new_parent)?;
        if plan.unchanged {
            debug!("reparent: parent unchanged, nothing to send");
            return self.reload();
        }

        let child_name = forest
            .find_by_id(child)
            .map(|n| n.name.clone())
            .unwrap_or_default();
        let question = match new_parent {
            None => Some(format!("Make '{}' a main category?", child_name)),
            Some(parent) if plan.crosses_category && self.policy.confirm_cross_category => {
                let target = forest
                    .find_by_id(parent)
                    .map(|n| n.name.clone())
                    .unwrap_or_default();
                Some(format!(
                    "Move '{}' into another main category under '{}'?",
                    child_name, target
                ))
            }
            Some(_) => None,
        };
        if let Some(question) = question {
            if !prompter.confirm(&question) {
                debug!("reparent: declined");
                return Err(ApplicationError::Cancelled);
            }
        }

        self.write_then_reload("move", || {
            self.backend.reparent_industry(child, new_parent)
        })
    }
}
