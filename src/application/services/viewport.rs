//! Scroll continuity across reloads
//!
//! Every mutation rebuilds the forest, which resets scroll positions. The
//! window offset and each open pane's offset are captured before the write
//! and replayed after the reload, in up to [`RESTORE_ATTEMPTS`] passes so a
//! pane that is not laid out yet on the first pass still gets its offset.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::domain::NodeId;
use crate::infrastructure::traits::ScrollSurface;

pub const RESTORE_ATTEMPTS: u8 = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollSnapshot {
    pub window: u32,
    pub panes: BTreeMap<NodeId, u32>,
}

/// Outcome of one restore pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// 1-based pass number
    pub attempt: u8,
    pub panes_restored: Vec<NodeId>,
    /// Saved offsets discarded because their pane is gone
    pub dropped: Vec<NodeId>,
}

#[derive(Debug, Default)]
pub struct ViewportContinuity {
    pending: Option<ScrollSnapshot>,
    attempts_left: u8,
}

impl ViewportContinuity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current offsets and arm the restore.
    pub fn capture(&mut self, surface: &dyn ScrollSurface, open_panes: &[NodeId]) {
        let panes = open_panes
            .iter()
            .filter_map(|&root| surface.pane_offset(root).map(|offset| (root, offset)))
            .collect();
        let snapshot = ScrollSnapshot {
            window: surface.window_offset(),
            panes,
        };
        trace!("captured {:?}", snapshot);
        self.pending = Some(snapshot);
        self.attempts_left = RESTORE_ATTEMPTS;
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&ScrollSnapshot> {
        self.pending.as_ref()
    }

    /// Drop a pending restore, e.g. after a failed mutation.
    pub fn disarm(&mut self) {
        if self.pending.take().is_some() {
            debug!("scroll restore disarmed");
        }
        self.attempts_left = 0;
    }

    pub fn forget_pane(&mut self, root: NodeId) {
        if let Some(snapshot) = self.pending.as_mut() {
            snapshot.panes.remove(&root);
        }
    }

    pub fn forget_all_panes(&mut self) {
        if let Some(snapshot) = self.pending.as_mut() {
            snapshot.panes.clear();
        }
    }

    /// Replay the captured offsets once. Returns None when nothing is armed.
    ///
    /// Offsets for panes not in `live_panes` are discarded. After the last
    /// pass the snapshot is released.
    pub fn restore_pass(
        &mut self,
        surface: &dyn ScrollSurface,
        live_panes: &[NodeId],
    ) -> Option<RestoreReport> {
        let snapshot = self.pending.as_mut()?;
        let mut report = RestoreReport {
            attempt: RESTORE_ATTEMPTS - self.attempts_left + 1,
            ..RestoreReport::default()
        };

        surface.set_window_offset(snapshot.window);

        let dropped: Vec<NodeId> = snapshot
            .panes
            .keys()
            .copied()
            .filter(|root| !live_panes.contains(root))
            .collect();
        for root in &dropped {
            snapshot.panes.remove(root);
        }
        report.dropped = dropped;

        for (&root, &offset) in &snapshot.panes {
            if surface.set_pane_offset(root, offset) {
                report.panes_restored.push(root);
            }
        }

        self.attempts_left = self.attempts_left.saturating_sub(1);
        if self.attempts_left == 0 {
            self.pending = None;
        }
        debug!("scroll restore pass {}: {:?}", report.attempt, report);
        Some(report)
    }
}
