//! In-memory backend
//!
//! Behaves like the REST backend (ids assigned on create, cascading delete,
//! server-side cycle refusal) and records every call it receives.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::domain::{IndustryNode, NewIndustry, NodeId};
use crate::infrastructure::traits::{BackendError, BackendResult, IndustryBackend};

/// One call received by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    List,
    Create {
        name: String,
        category: String,
        parent: Option<NodeId>,
    },
    Rename {
        id: NodeId,
        name: String,
    },
    RenameLegacy {
        id: NodeId,
        name: String,
    },
    Delete {
        id: NodeId,
    },
    Reparent {
        id: NodeId,
        parent: Option<NodeId>,
    },
}

impl BackendCall {
    pub fn is_write(&self) -> bool {
        !matches!(self, BackendCall::List)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<IndustryNode>,
    next_id: i64,
    calls: Vec<BackendCall>,
    failures: VecDeque<BackendError>,
    canonical_rename_missing: bool,
    legacy_rename_available: bool,
}

#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<IndustryNode>) -> Self {
        let next_id = records.iter().map(|r| r.id.0).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(MemoryState {
                records,
                next_id,
                legacy_rename_available: true,
                ..MemoryState::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fail the next call (of any kind) with `error`.
    pub fn fail_next(&self, error: BackendError) {
        self.lock().failures.push_back(error);
    }

    /// Make the canonical rename endpoint answer not-found, like an older server.
    pub fn disable_canonical_rename(&self) {
        self.lock().canonical_rename_missing = true;
    }

    pub fn disable_legacy_rename(&self) {
        self.lock().legacy_rename_available = false;
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn writes(&self) -> Vec<BackendCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.is_write())
            .cloned()
            .collect()
    }

    pub fn records(&self) -> Vec<IndustryNode> {
        self.lock().records.clone()
    }

    /// Edit a record behind the client's back, like another session would.
    pub fn external_edit(&self, edit: impl FnOnce(&mut Vec<IndustryNode>)) {
        edit(&mut self.lock().records);
    }

    fn begin(&self, call: BackendCall) -> BackendResult<std::sync::MutexGuard<'_, MemoryState>> {
        let mut state = self.lock();
        state.calls.push(call);
        match state.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

fn not_found(id: NodeId) -> BackendError {
    BackendError::NotFound {
        what: format!("industry {}", id),
    }
}

fn rename_in(state: &mut MemoryState, id: NodeId, name: &str) -> BackendResult<IndustryNode> {
    let record = state
        .records
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| not_found(id))?;
    record.name = name.to_string();
    Ok(record.clone())
}

/// True when `candidate` is `id` or lies below it.
fn in_subtree(records: &[IndustryNode], id: NodeId, candidate: NodeId) -> bool {
    let mut current = Some(candidate);
    let mut hops = 0;
    while let Some(node) = current {
        if node == id {
            return true;
        }
        hops += 1;
        if hops > records.len() {
            return false;
        }
        current = records
            .iter()
            .find(|r| r.id == node)
            .and_then(|r| r.parent_id);
    }
    false
}

impl IndustryBackend for MemoryBackend {
    fn list_industries(&self) -> BackendResult<Vec<IndustryNode>> {
        let state = self.begin(BackendCall::List)?;
        Ok(state.records.clone())
    }

    fn create_industry(&self, new: &NewIndustry) -> BackendResult<IndustryNode> {
        let mut state = self.begin(BackendCall::Create {
            name: new.name.clone(),
            category: new.category.clone(),
            parent: new.parent_id,
        })?;
        if let Some(parent) = new.parent_id {
            if !state.records.iter().any(|r| r.id == parent) {
                return Err(BackendError::Status {
                    status: 400,
                    detail: Some(format!("parent {} does not exist", parent)),
                });
            }
        }
        let record = IndustryNode {
            id: NodeId(state.next_id),
            name: new.name.clone(),
            category: new.category.clone(),
            parent_id: new.parent_id,
        };
        state.next_id += 1;
        state.records.push(record.clone());
        Ok(record)
    }

    fn rename_industry(&self, id: NodeId, name: &str) -> BackendResult<IndustryNode> {
        let mut state = self.begin(BackendCall::Rename {
            id,
            name: name.to_string(),
        })?;
        if state.canonical_rename_missing {
            return Err(BackendError::NotFound {
                what: "rename endpoint".to_string(),
            });
        }
        rename_in(&mut state, id, name)
    }

    fn rename_industry_legacy(&self, id: NodeId, name: &str) -> BackendResult<IndustryNode> {
        let mut state = self.begin(BackendCall::RenameLegacy {
            id,
            name: name.to_string(),
        })?;
        if !state.legacy_rename_available {
            return Err(BackendError::NotFound {
                what: "legacy rename endpoint".to_string(),
            });
        }
        rename_in(&mut state, id, name)
    }

    fn delete_industry(&self, id: NodeId) -> BackendResult<()> {
        let mut state = self.begin(BackendCall::Delete { id })?;
        if !state.records.iter().any(|r| r.id == id) {
            return Err(not_found(id));
        }
        let snapshot = state.records.clone();
        state
            .records
            .retain(|r| !in_subtree(&snapshot, id, r.id));
        Ok(())
    }

    fn reparent_industry(&self, id: NodeId, new_parent: Option<NodeId>) -> BackendResult<()> {
        let mut state = self.begin(BackendCall::Reparent {
            id,
            parent: new_parent,
        })?;
        if !state.records.iter().any(|r| r.id == id) {
            return Err(not_found(id));
        }
        if let Some(parent) = new_parent {
            if !state.records.iter().any(|r| r.id == parent) {
                return Err(not_found(parent));
            }
            if in_subtree(&state.records, id, parent) {
                return Err(BackendError::Status {
                    status: 400,
                    detail: Some("An industry cannot be moved below itself".to_string()),
                });
            }
        }
        if let Some(record) = state.records.iter_mut().find(|r| r.id == id) {
            record.parent_id = new_parent;
        }
        Ok(())
    }
}
