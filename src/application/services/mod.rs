//! Application services

pub mod drag;
pub mod editor;
pub mod mutation;
pub mod panes;
pub mod viewport;

pub use drag::{DragController, DragPhase, DropResolution, DropTarget, DropVerdict, RejectReason};
pub use editor::HierarchyEditor;
pub use mutation::{
    plan_reparent, GatewayPolicy, InFlight, MutationGateway, ReparentPlan, RENAME_MIN_LEN,
};
pub use panes::{GlobalToggle, Panes};
pub use viewport::{RestoreReport, ScrollSnapshot, ViewportContinuity, RESTORE_ATTEMPTS};
