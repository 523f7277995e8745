//! Hierarchy editor session
//!
//! Owns everything a mounted editor holds between gestures: the current
//! forest, main category order, open panes, drag state and the pending
//! scroll restore. Every mutation runs through [`HierarchyEditor::commit`],
//! which captures scroll offsets, performs the write and reload, installs
//! the new forest and replays the offsets.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::application::render::{pane_rows, PaneRow};
use crate::application::services::drag::{DragController, DropResolution, DropTarget, DropVerdict};
use crate::application::services::mutation::MutationGateway;
use crate::application::services::panes::{GlobalToggle, Panes};
use crate::application::services::viewport::{RestoreReport, ViewportContinuity};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DomainError, Forest, MainCategoryOrder, NodeId};
use crate::infrastructure::traits::{Prompter, ScrollSurface};

pub struct HierarchyEditor {
    gateway: MutationGateway,
    prompter: Arc<dyn Prompter>,
    surface: Arc<dyn ScrollSurface>,
    forest: Forest,
    order: MainCategoryOrder,
    panes: Panes,
    viewport: ViewportContinuity,
    drag: DragController,
    /// Node currently in inline-rename mode
    editing: Option<NodeId>,
    /// Node the editor was mounted for
    selected: Option<NodeId>,
    restore_delay: Duration,
    last_restore: Vec<RestoreReport>,
}

impl HierarchyEditor {
    pub fn new(
        gateway: MutationGateway,
        prompter: Arc<dyn Prompter>,
        surface: Arc<dyn ScrollSurface>,
        restore_delay: Duration,
    ) -> Self {
        Self {
            gateway,
            prompter,
            surface,
            forest: Forest::new(),
            order: MainCategoryOrder::new(),
            panes: Panes::new(),
            viewport: ViewportContinuity::new(),
            drag: DragController::new(),
            editing: None,
            selected: None,
            restore_delay,
            last_restore: Vec::new(),
        }
    }

    /// Load the forest and show `hint`, if given and known.
    ///
    /// The pane of the hint's main category is opened and its ancestors
    /// are expanded so the node is visible.
    #[instrument(level = "debug", skip(self))]
    pub fn mount(&mut self, hint: Option<NodeId>) -> ApplicationResult<()> {
        let forest = self.gateway.reload()?;
        self.install(forest);

        if let Some(id) = hint {
            match self.forest.root_of(id) {
                Some(root) => {
                    self.panes.open(root);
                    for ancestor in self.forest.ancestors_of(id) {
                        if ancestor != root {
                            self.panes.expand(root, ancestor);
                        }
                    }
                    self.selected = Some(id);
                    debug!("mounted with {} selected in pane {}", id, root);
                }
                None => debug!("selection hint {} not in forest, ignored", id),
            }
        }
        self.render(false);
        Ok(())
    }

    /// Relist without a write, e.g. to pick up edits from another session.
    pub fn reload(&mut self) -> ApplicationResult<()> {
        let forest = self.gateway.reload()?;
        self.install(forest);
        Ok(())
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn order(&self) -> &MainCategoryOrder {
        &self.order
    }

    /// Main categories in display order.
    pub fn main_categories(&self) -> &[NodeId] {
        self.order.ids()
    }

    pub fn panes(&self) -> &Panes {
        &self.panes
    }

    pub fn viewport(&self) -> &ViewportContinuity {
        &self.viewport
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn editing(&self) -> Option<NodeId> {
        self.editing
    }

    /// Reports from the restore passes of the last committed mutation.
    pub fn last_restore(&self) -> &[RestoreReport] {
        &self.last_restore
    }

    /// Visible rows of an open pane.
    pub fn rows(&self, root: NodeId) -> Vec<PaneRow> {
        if !self.panes.is_open(root) {
            return Vec::new();
        }
        pane_rows(&self.forest, root, self.panes.expanded(root))
    }

    fn render(&self, rebuilt: bool) {
        self.surface.render(self.panes.selection(), rebuilt);
    }

    // ---- panes ----

    pub fn toggle_root(&mut self, root: NodeId) -> ApplicationResult<bool> {
        if !self.forest.is_root(root) {
            return Err(DomainError::NodeNotFound(root).into());
        }
        let open = self.panes.toggle_root(root);
        if !open {
            self.viewport.forget_pane(root);
        }
        self.render(false);
        Ok(open)
    }

    pub fn close_pane(&mut self, root: NodeId) {
        if self.panes.close(root) {
            self.viewport.forget_pane(root);
            self.render(false);
        }
    }

    pub fn clear_all(&mut self) {
        self.panes.clear_all();
        self.viewport.forget_all_panes();
        self.render(false);
    }

    pub fn toggle_node(&mut self, root: NodeId, id: NodeId) -> bool {
        self.panes.toggle_node(&self.forest, root, id)
    }

    pub fn expand_all_in(&mut self, root: NodeId) {
        self.panes.expand_all(root, &self.forest);
    }

    pub fn collapse_all_in(&mut self, root: NodeId) {
        self.panes.collapse_all(root);
    }

    pub fn toggle_all(&mut self) -> GlobalToggle {
        self.panes.toggle_global(&self.forest)
    }

    // ---- inline rename mode ----

    pub fn begin_edit(&mut self, id: NodeId) -> ApplicationResult<()> {
        if !self.forest.contains(id) {
            return Err(DomainError::NodeNotFound(id).into());
        }
        self.editing = Some(id);
        Ok(())
    }

    pub fn end_edit(&mut self) {
        self.editing = None;
    }

    // ---- mutations ----

    pub fn add_root(&mut self, name: &str) -> ApplicationResult<()> {
        self.commit(|gateway, _, _| gateway.add_root(name))
    }

    pub fn add_child(&mut self, parent: NodeId, name: &str) -> ApplicationResult<()> {
        self.commit(|gateway, forest, _| gateway.add_child(forest, parent, name))
    }

    pub fn rename(&mut self, id: NodeId, name: &str) -> ApplicationResult<()> {
        let result = self.commit(|gateway, forest, _| gateway.rename(forest, id, name));
        if result.is_ok() {
            self.end_edit();
        }
        result
    }

    /// Ask for a new name, pre-filled with the current one.
    pub fn prompt_rename(&mut self, id: NodeId) -> ApplicationResult<()> {
        let current = self
            .forest
            .find_by_id(id)
            .map(|n| n.name.clone())
            .ok_or(DomainError::NodeNotFound(id))?;
        let name = self
            .prompter
            .ask_text("New name", &current)
            .ok_or(ApplicationError::Cancelled)?;
        self.rename(id, &name)
    }

    pub fn prompt_add_child(&mut self, parent: NodeId) -> ApplicationResult<()> {
        if !self.forest.contains(parent) {
            return Err(DomainError::NodeNotFound(parent).into());
        }
        let name = self
            .prompter
            .ask_text("Sub-industry name", "")
            .ok_or(ApplicationError::Cancelled)?;
        self.add_child(parent, &name)
    }

    /// Delete a subtree. Local references to it are dropped whatever the outcome.
    pub fn delete(&mut self, id: NodeId) -> ApplicationResult<()> {
        let mut doomed = vec![id];
        doomed.extend(self.forest.descendants_of(id));
        for root in self.panes.prune_nodes(&doomed) {
            self.viewport.forget_pane(root);
        }
        if self.selected.is_some_and(|s| doomed.contains(&s)) {
            self.selected = None;
        }
        if self.editing.is_some_and(|e| doomed.contains(&e)) {
            self.editing = None;
        }
        self.commit(|gateway, forest, prompter| gateway.delete_subtree(forest, id, prompter))
    }

    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId) -> ApplicationResult<()> {
        self.commit(|gateway, forest, prompter| {
            gateway.reparent(forest, child, Some(new_parent), prompter)
        })
    }

    /// Make `id` a main category.
    pub fn promote(&mut self, id: NodeId) -> ApplicationResult<()> {
        self.commit(|gateway, forest, prompter| gateway.reparent(forest, id, None, prompter))
    }

    // ---- drag and drop ----

    pub fn drag_start(&mut self, id: NodeId) -> Option<String> {
        self.drag.drag_start(&self.forest, id, self.editing)
    }

    pub fn drag_over(&self, raw: &str, target: DropTarget) -> DropVerdict {
        self.drag.drag_over(&self.forest, raw, target)
    }

    /// Resolve and carry out a drop.
    pub fn drop(&mut self, raw: Option<&str>, target: DropTarget) -> ApplicationResult<DropResolution> {
        let resolution = self.drag.drop(&self.forest, raw, target)?;
        match resolution {
            DropResolution::NoOp => {}
            DropResolution::ReorderRoots { moved, before } => {
                self.order.move_before(moved, before);
            }
            DropResolution::Reparent(plan) => match plan.new_parent {
                Some(parent) => self.reparent(plan.child, parent)?,
                None => self.promote(plan.child)?,
            },
        }
        Ok(resolution)
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    /// Run one write-and-reload with scroll continuity.
    ///
    /// On failure the current forest stays in place and the pending restore
    /// is disarmed.
    fn commit<F>(&mut self, op: F) -> ApplicationResult<()>
    where
        F: FnOnce(&MutationGateway, &Forest, &dyn Prompter) -> ApplicationResult<Forest>,
    {
        self.viewport
            .capture(self.surface.as_ref(), self.panes.selection());
        self.last_restore.clear();

        match op(&self.gateway, &self.forest, self.prompter.as_ref()) {
            Ok(forest) => {
                self.install(forest);
                self.render(true);
                self.replay();
                Ok(())
            }
            Err(e) => {
                self.viewport.disarm();
                if e.is_client_side() {
                    debug!("mutation not sent: {}", e);
                } else {
                    warn!("mutation failed, keeping current tree: {}", e);
                }
                Err(e)
            }
        }
    }

    /// Swap in a freshly built forest and align session state with it.
    fn install(&mut self, forest: Forest) {
        self.forest = forest;
        self.order.reconcile(&self.forest);
        for root in self.panes.reconcile(&self.forest) {
            info!("pane {} closed: no longer a main category", root);
            self.viewport.forget_pane(root);
        }
        if self.selected.is_some_and(|id| !self.forest.contains(id)) {
            self.selected = None;
        }
        if self.editing.is_some_and(|id| !self.forest.contains(id)) {
            self.editing = None;
        }
    }

    fn replay(&mut self) {
        let live = self.panes.selection().to_vec();
        if let Some(report) = self.viewport.restore_pass(self.surface.as_ref(), &live) {
            self.last_restore.push(report);
        }
        if self.viewport.is_armed() {
            thread::sleep(self.restore_delay);
            if let Some(report) = self.viewport.restore_pass(self.surface.as_ref(), &live) {
                self.last_restore.push(report);
            }
        }
    }
}
