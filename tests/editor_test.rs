//! Tests for the hierarchy editor against the in-memory backend

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use industree::application::services::{
    DropResolution, DropTarget, DropVerdict, GatewayPolicy, HierarchyEditor, MutationGateway,
    RejectReason,
};
use industree::application::ApplicationError;
use industree::domain::{DomainError, IndustryNode, NodeId};
use industree::infrastructure::memory::{BackendCall, MemoryBackend};
use industree::infrastructure::traits::{BackendError, HeadlessViewport, Prompter, ScrollSurface};
use industree::util::testing;

/// Prompter answering from a script; records every question.
#[derive(Default)]
struct ScriptedPrompter {
    confirms: Mutex<VecDeque<bool>>,
    texts: Mutex<VecDeque<Option<String>>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    fn confirming(answers: &[bool]) -> Self {
        Self {
            confirms: Mutex::new(answers.iter().copied().collect()),
            ..Self::default()
        }
    }

    fn answering(texts: Vec<Option<&str>>) -> Self {
        Self {
            texts: Mutex::new(texts.into_iter().map(|t| t.map(String::from)).collect()),
            ..Self::default()
        }
    }

    fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str) -> bool {
        self.asked.lock().unwrap().push(message.to_string());
        self.confirms.lock().unwrap().pop_front().unwrap_or(false)
    }

    fn ask_text(&self, prompt: &str, initial: &str) -> Option<String> {
        self.asked
            .lock()
            .unwrap()
            .push(format!("{} [{}]", prompt, initial));
        self.texts.lock().unwrap().pop_front().flatten()
    }
}

fn records() -> Vec<IndustryNode> {
    vec![
        IndustryNode::new(1, "Manufacturing", None),
        IndustryNode::new(2, "Textiles", Some(1)),
        IndustryNode::new(3, "Automotive", Some(1)),
        IndustryNode::new(7, "Electric Vehicles", Some(3)),
        IndustryNode::new(9, "Services", None),
    ]
}

struct Harness {
    editor: HierarchyEditor,
    backend: Arc<MemoryBackend>,
    surface: Arc<HeadlessViewport>,
    prompter: Arc<ScriptedPrompter>,
}

fn harness(prompter: ScriptedPrompter) -> Harness {
    harness_with(prompter, records(), GatewayPolicy::default())
}

fn harness_with(
    prompter: ScriptedPrompter,
    records: Vec<IndustryNode>,
    policy: GatewayPolicy,
) -> Harness {
    testing::init_test_setup();
    let backend = Arc::new(MemoryBackend::with_records(records));
    let surface = Arc::new(HeadlessViewport::new());
    let prompter = Arc::new(prompter);
    let gateway = MutationGateway::new(backend.clone(), policy);
    let mut editor = HierarchyEditor::new(
        gateway,
        prompter.clone(),
        surface.clone(),
        Duration::ZERO,
    );
    editor.mount(None).expect("mount");
    Harness {
        editor,
        backend,
        surface,
        prompter,
    }
}

#[test]
fn given_cycle_target_when_reparenting_then_rejected_without_backend_call() {
    let mut h = harness(ScriptedPrompter::confirming(&[true]));

    let result = h.editor.reparent(NodeId(1), NodeId(7));

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::CycleDetected { .. }))
    ));
    assert!(h.backend.writes().is_empty());
    assert!(h.prompter.asked().is_empty());
}

#[test]
fn given_self_target_when_reparenting_then_rejected_without_backend_call() {
    let mut h = harness(ScriptedPrompter::confirming(&[true]));
    let result = h.editor.reparent(NodeId(3), NodeId(3));
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::SelfDrop(_)))
    ));
    assert!(h.backend.writes().is_empty());
}

#[test]
fn given_confirmed_promotion_when_promoting_then_node_becomes_root() {
    let mut h = harness(ScriptedPrompter::confirming(&[true]));

    h.editor.promote(NodeId(7)).unwrap();

    let forest = h.editor.forest();
    assert!(forest.is_root(NodeId(7)));
    assert!(forest.children_of(NodeId(7)).is_empty());
    assert_eq!(forest.children_of(NodeId(3)), Vec::<NodeId>::new());
    assert_eq!(
        h.backend.writes(),
        vec![BackendCall::Reparent {
            id: NodeId(7),
            parent: None
        }]
    );
    assert_eq!(
        h.editor.main_categories(),
        &[NodeId(1), NodeId(9), NodeId(7)]
    );
}

#[test]
fn given_orphan_with_dangling_parent_when_promoting_then_parent_cleared_on_backend() {
    let mut records = records();
    records.push(IndustryNode::new(12, "Retail", Some(99)));
    let mut h = harness_with(
        ScriptedPrompter::confirming(&[true]),
        records,
        GatewayPolicy::default(),
    );
    assert_eq!(h.editor.forest().orphans(), &[NodeId(12)]);

    h.editor.promote(NodeId(12)).unwrap();

    assert_eq!(h.prompter.asked().len(), 1);
    assert_eq!(
        h.backend.writes(),
        vec![BackendCall::Reparent {
            id: NodeId(12),
            parent: None
        }]
    );
    assert!(h.editor.forest().orphans().is_empty());
    assert!(h.editor.forest().is_root(NodeId(12)));
}

#[test]
fn given_declined_promotion_when_promoting_then_cancelled_and_nothing_sent() {
    let mut h = harness(ScriptedPrompter::confirming(&[false]));
    let result = h.editor.promote(NodeId(7));
    assert!(matches!(result, Err(ApplicationError::Cancelled)));
    assert!(h.backend.writes().is_empty());
    assert!(!h.editor.viewport().is_armed());
}

#[test]
fn given_two_panes_when_dragging_child_onto_other_pane_header_then_moved_across() {
    let mut h = harness(ScriptedPrompter::confirming(&[true]));
    h.editor.toggle_root(NodeId(1)).unwrap();
    h.editor.toggle_root(NodeId(9)).unwrap();
    h.editor.toggle_node(NodeId(1), NodeId(3));

    let raw = h.editor.drag_start(NodeId(3)).unwrap();
    assert_eq!(
        h.editor.drag_over(&raw, DropTarget::PaneHeader(NodeId(9))),
        DropVerdict::Accept
    );
    let resolution = h
        .editor
        .drop(Some(&raw), DropTarget::PaneHeader(NodeId(9)))
        .unwrap();

    assert!(matches!(resolution, DropResolution::Reparent(_)));
    assert_eq!(
        h.backend.writes(),
        vec![BackendCall::Reparent {
            id: NodeId(3),
            parent: Some(NodeId(9))
        }]
    );
    let forest = h.editor.forest();
    assert!(!forest.descendants_of(NodeId(1)).contains(&NodeId(3)));
    assert_eq!(forest.children_of(NodeId(9)), vec![NodeId(3)]);
    assert_eq!(forest.level_of(NodeId(7)), Some(2));
    // expansion of 3 no longer belongs to pane 1
    assert!(!h.editor.panes().is_expanded(NodeId(1), NodeId(3)));
    assert!(h.prompter.asked()[0].contains("another main category"));
}

#[test]
fn given_drag_into_own_subtree_when_hovering_then_silently_rejected() {
    let mut h = harness(ScriptedPrompter::default());
    let raw = h.editor.drag_start(NodeId(3)).unwrap();

    assert_eq!(
        h.editor.drag_over(&raw, DropTarget::Row(NodeId(7))),
        DropVerdict::Reject(RejectReason::Cycle {
            child: NodeId(3),
            new_parent: NodeId(7)
        })
    );
    assert!(h.prompter.asked().is_empty());
    assert!(h
        .editor
        .drop(Some(&raw), DropTarget::Row(NodeId(7)))
        .is_err());
    assert!(h.backend.writes().is_empty());
}

#[test]
fn given_self_drop_when_dropping_then_no_op_without_call() {
    let mut h = harness(ScriptedPrompter::default());
    let raw = h.editor.drag_start(NodeId(3)).unwrap();
    let resolution = h.editor.drop(Some(&raw), DropTarget::Row(NodeId(3))).unwrap();
    assert_eq!(resolution, DropResolution::NoOp);
    assert!(h.backend.writes().is_empty());
}

#[test]
fn given_node_open_in_panes_when_deleted_then_references_pruned_everywhere() {
    let mut h = harness(ScriptedPrompter::confirming(&[true]));
    h.editor.toggle_root(NodeId(1)).unwrap();
    h.editor.toggle_root(NodeId(9)).unwrap();
    h.editor.toggle_node(NodeId(1), NodeId(3));
    h.editor.toggle_node(NodeId(1), NodeId(7));

    h.editor.delete(NodeId(3)).unwrap();

    assert!(!h.editor.forest().contains(NodeId(3)));
    assert!(!h.editor.forest().contains(NodeId(7)));
    assert!(!h.editor.panes().is_expanded(NodeId(1), NodeId(3)));
    assert!(!h.editor.panes().is_expanded(NodeId(1), NodeId(7)));
    assert_eq!(h.editor.panes().selection(), &[NodeId(1), NodeId(9)]);
    assert!(h.prompter.asked()[0].contains("1 sub-industries"));
}

#[test]
fn given_declined_delete_when_deleting_then_local_state_still_pruned() {
    let mut h = harness(ScriptedPrompter::confirming(&[false]));
    h.editor.toggle_root(NodeId(1)).unwrap();
    h.editor.toggle_node(NodeId(1), NodeId(3));

    let result = h.editor.delete(NodeId(3));

    assert!(matches!(result, Err(ApplicationError::Cancelled)));
    assert!(h.backend.writes().is_empty());
    assert!(h.editor.forest().contains(NodeId(3)));
    assert!(!h.editor.panes().is_expanded(NodeId(1), NodeId(3)));
}

#[test]
fn given_canonical_rename_missing_when_renaming_then_legacy_endpoint_used() {
    let mut h = harness(ScriptedPrompter::default());
    h.backend.disable_canonical_rename();

    h.editor.rename(NodeId(3), "  Automotive & Mobility ").unwrap();

    assert_eq!(
        h.backend.writes(),
        vec![
            BackendCall::Rename {
                id: NodeId(3),
                name: "Automotive & Mobility".into()
            },
            BackendCall::RenameLegacy {
                id: NodeId(3),
                name: "Automotive & Mobility".into()
            },
        ]
    );
    assert_eq!(
        h.editor.forest().find_by_id(NodeId(3)).unwrap().name,
        "Automotive & Mobility"
    );
}

#[test]
fn given_both_rename_endpoints_missing_when_renaming_then_error_and_tree_unchanged() {
    let mut h = harness(ScriptedPrompter::default());
    h.backend.disable_canonical_rename();
    h.backend.disable_legacy_rename();
    let before = h.editor.forest().shape();

    let result = h.editor.rename(NodeId(3), "Mobility");

    assert!(matches!(
        result,
        Err(ApplicationError::Backend(BackendError::NotFound { .. }))
    ));
    assert_eq!(h.editor.forest().shape(), before);
    assert_eq!(
        h.editor.forest().find_by_id(NodeId(3)).unwrap().name,
        "Automotive"
    );
}

#[test]
fn given_lenient_policy_when_renaming_to_one_char_then_rejected_before_network() {
    let policy = GatewayPolicy {
        min_name_len: 1,
        ..GatewayPolicy::default()
    };
    let mut h = harness_with(ScriptedPrompter::default(), records(), policy);

    let result = h.editor.rename(NodeId(3), " A ");

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidName { .. }))
    ));
    assert!(h.backend.writes().is_empty());
    assert_eq!(
        h.editor.forest().find_by_id(NodeId(3)).unwrap().name,
        "Automotive"
    );

    // the same policy still lets a one-char sub-industry through
    h.editor.add_child(NodeId(3), "X").unwrap();
    assert_eq!(h.backend.writes().len(), 1);
}

#[test]
fn given_too_short_name_when_adding_child_then_rejected_before_network() {
    let mut h = harness(ScriptedPrompter::default());
    let result = h.editor.add_child(NodeId(1), " x ");
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidName { .. }))
    ));
    assert!(h.backend.writes().is_empty());
}

#[test]
fn given_child_of_sub_industry_when_added_then_category_follows_level() {
    let mut h = harness(ScriptedPrompter::default());
    h.editor.add_child(NodeId(3), "Trucks").unwrap();
    assert_eq!(
        h.backend.writes(),
        vec![BackendCall::Create {
            name: "Trucks".into(),
            category: "Sub-Sub Industry".into(),
            parent: Some(NodeId(3))
        }]
    );
    let trucks = h
        .editor
        .forest()
        .children_of(NodeId(3))
        .into_iter()
        .find(|&id| id != NodeId(7))
        .unwrap();
    assert_eq!(h.editor.forest().level_of(trucks), Some(2));
}

#[test]
fn given_cancelled_prompt_when_renaming_interactively_then_nothing_sent() {
    let mut h = harness(ScriptedPrompter::answering(vec![None]));
    let result = h.editor.prompt_rename(NodeId(2));
    assert!(matches!(result, Err(ApplicationError::Cancelled)));
    assert_eq!(h.prompter.asked(), vec!["New name [Textiles]".to_string()]);
    assert!(h.backend.writes().is_empty());
}

#[test]
fn given_network_failure_when_mutating_then_tree_kept_and_restore_disarmed() {
    let mut h = harness(ScriptedPrompter::default());
    h.editor.toggle_root(NodeId(1)).unwrap();
    h.surface.set_window_offset(500);
    h.surface.set_pane_offset(NodeId(1), 42);
    let before = h.editor.forest().shape();
    h.backend.fail_next(BackendError::Transport {
        message: "connection refused".into(),
    });

    let result = h.editor.add_child(NodeId(1), "Chemicals");

    assert!(matches!(
        result,
        Err(ApplicationError::Backend(BackendError::Transport { .. }))
    ));
    assert_eq!(h.editor.forest().shape(), before);
    assert!(!h.editor.viewport().is_armed());
    assert_eq!(h.surface.pane_offset(NodeId(1)), Some(42));

    // guard was released, the next write goes through
    h.editor.add_child(NodeId(1), "Chemicals").unwrap();
    assert!(h.editor.forest().children_of(NodeId(1)).len() == 3);
}

#[test]
fn given_write_in_flight_when_another_write_starts_then_busy() {
    testing::init_test_setup();
    let backend = Arc::new(MemoryBackend::with_records(records()));
    let gateway = MutationGateway::new(backend.clone(), GatewayPolicy::default());
    let forest = gateway.reload().unwrap();

    let _guard = gateway.in_flight().try_begin();
    let result = gateway.rename(&forest, NodeId(3), "Mobility");

    assert!(matches!(result, Err(ApplicationError::Busy { .. })));
    assert!(backend.writes().is_empty());
}

#[test]
fn given_scrolled_panes_when_mutation_reloads_then_offsets_replayed() {
    let mut h = harness(ScriptedPrompter::confirming(&[true]));
    h.editor.toggle_root(NodeId(1)).unwrap();
    h.editor.toggle_root(NodeId(9)).unwrap();
    h.surface.set_window_offset(320);
    h.surface.set_pane_offset(NodeId(1), 12);
    h.surface.set_pane_offset(NodeId(9), 30);

    h.editor.reparent(NodeId(7), NodeId(2)).unwrap();

    assert_eq!(h.surface.window_offset(), 320);
    assert_eq!(h.surface.pane_offset(NodeId(1)), Some(12));
    assert_eq!(h.surface.pane_offset(NodeId(9)), Some(30));
    assert_eq!(h.editor.last_restore().len(), 2);
}

#[test]
fn given_pane_root_demoted_when_reloading_then_pane_closed_and_offset_dropped() {
    let mut h = harness(ScriptedPrompter::confirming(&[true]));
    h.editor.toggle_root(NodeId(1)).unwrap();
    h.editor.toggle_root(NodeId(9)).unwrap();
    h.surface.set_pane_offset(NodeId(9), 30);

    h.editor.reparent(NodeId(9), NodeId(2)).unwrap();

    assert_eq!(h.editor.panes().selection(), &[NodeId(1)]);
    assert_eq!(h.surface.pane_offset(NodeId(9)), None);
    let first = &h.editor.last_restore()[0];
    assert!(first.panes_restored.contains(&NodeId(1)));
    assert!(!first.panes_restored.contains(&NodeId(9)));
}

#[test]
fn given_external_edit_when_reloading_then_last_reload_wins() {
    let mut h = harness(ScriptedPrompter::default());
    h.backend.external_edit(|records| {
        records.retain(|r| r.id != NodeId(2));
    });
    h.editor.reload().unwrap();
    assert!(!h.editor.forest().contains(NodeId(2)));
}

#[test]
fn given_hint_when_mounting_then_path_to_node_visible() {
    let mut h = harness(ScriptedPrompter::default());
    h.editor.mount(Some(NodeId(7))).unwrap();
    let visible: Vec<NodeId> = h.editor.rows(NodeId(1)).iter().map(|r| r.id).collect();
    assert_eq!(visible, vec![NodeId(2), NodeId(3), NodeId(7)]);
    assert_eq!(h.editor.selected(), Some(NodeId(7)));
}

#[test]
fn given_clear_all_when_panes_open_then_selection_and_mounts_reset() {
    let mut h = harness(ScriptedPrompter::default());
    h.editor.toggle_root(NodeId(1)).unwrap();
    h.editor.toggle_root(NodeId(9)).unwrap();
    h.editor.clear_all();
    assert!(h.editor.panes().selection().is_empty());
    assert!(h.surface.mounted_panes().is_empty());
}

#[test]
fn given_open_pane_when_closed_then_expansion_and_mount_dropped() {
    let mut h = harness(ScriptedPrompter::default());
    h.editor.toggle_root(NodeId(1)).unwrap();
    h.editor.toggle_root(NodeId(9)).unwrap();
    h.editor.expand_all_in(NodeId(9));

    h.editor.close_pane(NodeId(9));

    assert_eq!(h.editor.panes().selection(), &[NodeId(1)]);
    assert!(h.editor.panes().expanded(NodeId(9)).is_none());
    assert_eq!(h.surface.mounted_panes(), vec![NodeId(1)]);
}

#[test]
fn given_closed_pane_when_toggling_node_then_reopened_pane_starts_collapsed() {
    let mut h = harness(ScriptedPrompter::default());

    assert!(!h.editor.toggle_node(NodeId(1), NodeId(3)));
    h.editor.toggle_root(NodeId(1)).unwrap();
    assert!(!h.editor.toggle_node(NodeId(1), NodeId(9)));

    assert!(h.editor.panes().expanded(NodeId(1)).is_none());
    assert_eq!(h.editor.rows(NodeId(1)).len(), 2);
}

#[test]
fn given_open_panes_when_toggling_all_then_expands_then_collapses() {
    use industree::application::services::GlobalToggle;

    let mut h = harness(ScriptedPrompter::default());
    h.editor.toggle_root(NodeId(1)).unwrap();

    assert_eq!(h.editor.toggle_all(), GlobalToggle::Expanded);
    assert_eq!(h.editor.rows(NodeId(1)).len(), 3);

    h.editor.collapse_all_in(NodeId(1));
    assert_eq!(h.editor.rows(NodeId(1)).len(), 2);
    assert_eq!(h.editor.toggle_all(), GlobalToggle::Expanded);
    assert_eq!(h.editor.toggle_all(), GlobalToggle::Collapsed);
}

#[test]
fn given_prompted_name_when_adding_child_then_created_under_parent() {
    let mut h = harness(ScriptedPrompter::answering(vec![Some("Hybrid Vehicles")]));
    h.editor.prompt_add_child(NodeId(3)).unwrap();
    assert_eq!(
        h.backend.writes(),
        vec![BackendCall::Create {
            name: "Hybrid Vehicles".into(),
            category: "Sub-Sub Industry".into(),
            parent: Some(NodeId(3))
        }]
    );
}

#[test]
fn given_active_drag_when_cancelled_then_nothing_sent() {
    use industree::application::services::DragPhase;

    let mut h = harness(ScriptedPrompter::default());
    h.editor.drag_start(NodeId(7)).unwrap();
    assert!(matches!(h.editor.drag().phase(), DragPhase::Dragging { .. }));

    h.editor.cancel_drag();

    assert_eq!(h.editor.drag().phase(), DragPhase::Idle);
    assert!(h.backend.writes().is_empty());
}
