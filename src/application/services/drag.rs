//! Drag and drop controller
//!
//! One gesture at a time: `Idle -> Dragging -> (dropped | cancelled) -> Idle`.
//! The transfer payload is re-parsed and re-validated at every consumption
//! site; hover verdicts are advisory and the drop checks everything again.

use tracing::{debug, trace};

use crate::application::services::mutation::{plan_reparent, ReparentPlan};
use crate::domain::{DomainError, DomainResult, DragPayload, Forest, NodeId};

/// Where a payload may be released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// A descendant row inside a pane
    Row(NodeId),
    /// The header of a pane, i.e. its main category
    PaneHeader(NodeId),
    /// A slot in the main category reordering track
    RootSlot(NodeId),
}

impl DropTarget {
    pub fn id(&self) -> NodeId {
        match self {
            DropTarget::Row(id) | DropTarget::PaneHeader(id) | DropTarget::RootSlot(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Malformed,
    UnknownNode,
    /// The payload no longer matches the node's place in the forest
    Stale,
    SelfDrop,
    Cycle { child: NodeId, new_parent: NodeId },
    /// Main categories only move within the reordering track
    RootOutsideTrack,
    DescendantOnTrack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropVerdict {
    Accept,
    Reject(RejectReason),
}

impl DropVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, DropVerdict::Accept)
    }
}

/// What a drop asks the editor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropResolution {
    NoOp,
    /// Visual reorder of main categories; never sent to the backend
    ReorderRoots { moved: NodeId, before: NodeId },
    Reparent(ReparentPlan),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging {
        payload: DragPayload,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEnd {
    Dropped,
    Cancelled,
}

#[derive(Debug, Default)]
pub struct DragController {
    phase: DragPhase,
    last_end: Option<DragEnd>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn last_end(&self) -> Option<DragEnd> {
        self.last_end
    }

    /// Begin dragging `id` and return the encoded transfer payload.
    ///
    /// Returns None for unknown nodes and for the node being renamed inline.
    pub fn drag_start(
        &mut self,
        forest: &Forest,
        id: NodeId,
        editing: Option<NodeId>,
    ) -> Option<String> {
        if editing == Some(id) {
            debug!("drag_start: {} is being renamed, drag refused", id);
            return None;
        }
        let level = forest.level_of(id)?;
        let payload = if level == 0 {
            DragPayload::Root { id }
        } else {
            DragPayload::Descendant { id, level }
        };
        debug!("drag_start: {:?}", payload);
        self.phase = DragPhase::Dragging { payload };
        Some(payload.encode())
    }

    /// Hover check, so the cursor reflects legality before the drop.
    pub fn drag_over(&self, forest: &Forest, raw: &str, target: DropTarget) -> DropVerdict {
        match evaluate(forest, raw, target) {
            Ok(_) => DropVerdict::Accept,
            Err(reason) => {
                trace!("drag_over {:?}: rejected ({:?})", target, reason);
                DropVerdict::Reject(reason)
            }
        }
    }

    /// Resolve a drop. Missing or malformed data and self-drops are no-ops;
    /// a drop that would create a cycle is an explicit error.
    pub fn drop(
        &mut self,
        forest: &Forest,
        raw: Option<&str>,
        target: DropTarget,
    ) -> DomainResult<DropResolution> {
        self.phase = DragPhase::Idle;
        self.last_end = Some(DragEnd::Dropped);

        let Some(raw) = raw else {
            debug!("drop on {:?}: no transfer data", target);
            return Ok(DropResolution::NoOp);
        };
        match evaluate(forest, raw, target) {
            Ok(resolution) => {
                debug!("drop on {:?}: {:?}", target, resolution);
                Ok(resolution)
            }
            Err(RejectReason::Cycle { child, new_parent }) => {
                Err(DomainError::CycleDetected { child, new_parent })
            }
            Err(reason) => {
                debug!("drop on {:?}: ignored ({:?})", target, reason);
                Ok(DropResolution::NoOp)
            }
        }
    }

    pub fn cancel(&mut self) {
        if matches!(self.phase, DragPhase::Dragging { .. }) {
            debug!("drag cancelled");
            self.last_end = Some(DragEnd::Cancelled);
        }
        self.phase = DragPhase::Idle;
    }
}

fn evaluate(
    forest: &Forest,
    raw: &str,
    target: DropTarget,
) -> Result<DropResolution, RejectReason> {
    let payload = DragPayload::decode(raw).map_err(|_| RejectReason::Malformed)?;
    let id = payload.id();
    if !forest.contains(id) || !forest.contains(target.id()) {
        return Err(RejectReason::UnknownNode);
    }

    match (payload, target) {
        (DragPayload::Root { .. }, DropTarget::RootSlot(slot)) => {
            if !forest.is_root(id) || !forest.is_root(slot) {
                return Err(RejectReason::Stale);
            }
            if slot == id {
                return Err(RejectReason::SelfDrop);
            }
            Ok(DropResolution::ReorderRoots {
                moved: id,
                before: slot,
            })
        }
        (DragPayload::Root { .. }, _) => Err(RejectReason::RootOutsideTrack),
        (DragPayload::Descendant { .. }, DropTarget::RootSlot(_)) => {
            Err(RejectReason::DescendantOnTrack)
        }
        (
            DragPayload::Descendant { .. },
            DropTarget::Row(parent) | DropTarget::PaneHeader(parent),
        ) => {
            if forest.level_of(id) != Some(payload.source_level()) {
                return Err(RejectReason::Stale);
            }
            if matches!(target, DropTarget::PaneHeader(_)) && !forest.is_root(parent) {
                return Err(RejectReason::Stale);
            }
            let plan = plan_reparent(forest, id, Some(parent)).map_err(|e| match e {
                DomainError::SelfDrop(_) => RejectReason::SelfDrop,
                DomainError::CycleDetected { child, new_parent } => {
                    RejectReason::Cycle { child, new_parent }
                }
                _ => RejectReason::UnknownNode,
            })?;
            if plan.unchanged {
                return Ok(DropResolution::NoOp);
            }
            Ok(DropResolution::Reparent(plan))
        }
    }
}
