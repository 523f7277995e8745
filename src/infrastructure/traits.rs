//! I/O boundary traits for testability
//!
//! These traits abstract the backend, user dialogs and the scrollable
//! surface, allowing the editor services to be tested with in-memory
//! implementations.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

use colored::Colorize;
use thiserror::Error;

use crate::domain::{IndustryNode, NewIndustry, NodeId};

/// Failure reported by a backend call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("network error: {message}")]
    Transport { message: String },

    #[error("backend rejected request ({status}): {}", detail.as_deref().unwrap_or("no detail"))]
    Status { status: u16, detail: Option<String> },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("unexpected response: {message}")]
    Decode { message: String },
}

impl BackendError {
    /// Message suitable for showing to the user: the server's detail when
    /// one was parsed, otherwise a generic status-based text.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Transport { .. } => {
                "Could not reach the server. Please try again.".to_string()
            }
            BackendError::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            BackendError::Status {
                status,
                detail: None,
            } => format!("Request failed with status {}", status),
            BackendError::NotFound { what } => format!("{} no longer exists", what),
            BackendError::Decode { .. } => "The server sent an unexpected response".to_string(),
        }
    }
}

/// Result type for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Industry persistence owned by the backend.
pub trait IndustryBackend: Send + Sync {
    /// Fetch every industry record.
    fn list_industries(&self) -> BackendResult<Vec<IndustryNode>>;

    /// Create a record; the backend assigns the id.
    fn create_industry(&self, new: &NewIndustry) -> BackendResult<IndustryNode>;

    /// Rename through the canonical endpoint.
    fn rename_industry(&self, id: NodeId, name: &str) -> BackendResult<IndustryNode>;

    /// Rename through the legacy endpoint.
    ///
    /// Only attempted after the canonical endpoint reported not-found.
    fn rename_industry_legacy(&self, id: NodeId, name: &str) -> BackendResult<IndustryNode> {
        let _ = name;
        Err(BackendError::NotFound {
            what: format!("legacy rename endpoint for industry {}", id),
        })
    }

    /// Delete a record and its entire subtree.
    fn delete_industry(&self, id: NodeId) -> BackendResult<()>;

    /// Point a record at a new parent, or make it a main category.
    fn reparent_industry(&self, id: NodeId, new_parent: Option<NodeId>) -> BackendResult<()>;
}

/// Yes/no and free-text dialogs.
pub trait Prompter: Send + Sync {
    /// Ask for confirmation. False means the user declined.
    fn confirm(&self, message: &str) -> bool;

    /// Ask for a string, pre-filled with `initial`.
    /// Returns None if the user cancels.
    fn ask_text(&self, prompt: &str, initial: &str) -> Option<String>;
}

/// Scrollable surface the editor renders into.
///
/// Offsets are vertical, in rows.
pub trait ScrollSurface: Send + Sync {
    fn window_offset(&self) -> u32;

    fn set_window_offset(&self, offset: u32);

    /// Offset of a mounted pane, None if the pane is not mounted.
    fn pane_offset(&self, root: NodeId) -> Option<u32>;

    /// Returns false when the pane is not mounted.
    fn set_pane_offset(&self, root: NodeId, offset: u32) -> bool;

    /// Re-render with exactly `open_panes` mounted.
    ///
    /// `rebuilt` is set after a reload replaced the forest; a real surface
    /// loses its scroll positions then.
    fn render(&self, open_panes: &[NodeId], rebuilt: bool);
}

/// Item for FZF-style selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionItem {
    /// Display text shown in selector
    pub display: String,
    /// Selected industry
    pub value: NodeId,
}

/// Interactive FZF-style selector abstraction.
pub trait Selector: Send + Sync {
    /// Present items to user and return selected one.
    /// Returns None if user cancels (Esc/Ctrl-C).
    fn select_one(
        &self,
        items: &[SelectionItem],
        prompt: &str,
    ) -> Result<Option<SelectionItem>, String>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Terminal dialogs on stdin/stdout.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_line() -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> bool {
        print!("{} ", format!("{} [y/N]", message).cyan());
        io::stdout().flush().ok();
        Self::read_line()
            .map(|answer| matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
            .unwrap_or(false)
    }

    fn ask_text(&self, prompt: &str, initial: &str) -> Option<String> {
        if initial.is_empty() {
            print!("{} ", format!("{}:", prompt).cyan());
        } else {
            print!("{} ", format!("{} [{}]:", prompt, initial).cyan());
        }
        io::stdout().flush().ok();
        let answer = Self::read_line()?;
        if answer.trim().is_empty() {
            Some(initial.to_string())
        } else {
            Some(answer)
        }
    }
}

/// Accepts every confirmation; text prompts return the initial value.
#[derive(Debug, Default)]
pub struct AssumeYes;

impl Prompter for AssumeYes {
    fn confirm(&self, _message: &str) -> bool {
        true
    }

    fn ask_text(&self, _prompt: &str, initial: &str) -> Option<String> {
        Some(initial.to_string())
    }
}

/// Scroll surface without a display, holding offsets in memory.
///
/// Panes are mounted by `render`; offsets of unmounted panes cannot be set.
#[derive(Debug, Default)]
pub struct HeadlessViewport {
    state: Mutex<ViewportState>,
}

#[derive(Debug, Default)]
struct ViewportState {
    window: u32,
    panes: HashMap<NodeId, u32>,
}

impl HeadlessViewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mounted_panes(&self) -> Vec<NodeId> {
        let mut panes: Vec<NodeId> = self
            .state
            .lock()
            .map(|s| s.panes.keys().copied().collect())
            .unwrap_or_default();
        panes.sort();
        panes
    }
}

impl ScrollSurface for HeadlessViewport {
    fn window_offset(&self) -> u32 {
        self.state.lock().map(|s| s.window).unwrap_or(0)
    }

    fn set_window_offset(&self, offset: u32) {
        if let Ok(mut state) = self.state.lock() {
            state.window = offset;
        }
    }

    fn pane_offset(&self, root: NodeId) -> Option<u32> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.panes.get(&root).copied())
    }

    fn set_pane_offset(&self, root: NodeId, offset: u32) -> bool {
        match self.state.lock() {
            Ok(mut state) => match state.panes.get_mut(&root) {
                Some(slot) => {
                    *slot = offset;
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    fn render(&self, open_panes: &[NodeId], rebuilt: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.panes.retain(|root, _| open_panes.contains(root));
            for &root in open_panes {
                state.panes.entry(root).or_insert(0);
            }
            if rebuilt {
                state.window = 0;
                state.panes.values_mut().for_each(|offset| *offset = 0);
            }
        }
    }
}

/// Real selector implementation using skim (FZF-like).
#[derive(Debug, Default)]
pub struct SkimSelector;

impl Selector for SkimSelector {
    fn select_one(
        &self,
        items: &[SelectionItem],
        prompt: &str,
    ) -> Result<Option<SelectionItem>, String> {
        use skim::prelude::*;
        use std::io::Cursor;

        if items.is_empty() {
            return Ok(None);
        }

        let input = items
            .iter()
            .map(|i| i.display.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let options = SkimOptionsBuilder::default()
            .prompt(Some(prompt))
            .height(Some("50%"))
            .multi(false)
            .build()
            .map_err(|e| format!("failed to build skim options: {e}"))?;

        let item_reader = SkimItemReader::default();
        let items_arc = item_reader.of_bufread(Cursor::new(input));

        match Skim::run_with(&options, Some(items_arc)) {
            Some(out) if out.is_abort => Ok(None),
            Some(out) => Ok(out.selected_items.first().and_then(|selected| {
                let display = selected.output().to_string();
                items.iter().find(|i| i.display == display).cloned()
            })),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_unmounted_pane_when_setting_offset_then_refused() {
        let viewport = HeadlessViewport::new();
        assert!(!viewport.set_pane_offset(NodeId(1), 40));
        viewport.render(&[NodeId(1)], false);
        assert!(viewport.set_pane_offset(NodeId(1), 40));
        viewport.render(&[NodeId(1), NodeId(2)], false);
        assert_eq!(viewport.pane_offset(NodeId(1)), Some(40));
        viewport.set_window_offset(300);
        viewport.render(&[NodeId(2)], true);
        assert_eq!(viewport.pane_offset(NodeId(1)), None);
        assert_eq!(viewport.pane_offset(NodeId(2)), Some(0));
        assert_eq!(viewport.window_offset(), 0);
        assert_eq!(viewport.mounted_panes(), vec![NodeId(2)]);
    }

    #[test]
    fn given_status_error_when_rendering_then_prefers_server_detail() {
        let with_detail = BackendError::Status {
            status: 400,
            detail: Some("Name already taken".into()),
        };
        assert_eq!(with_detail.user_message(), "Name already taken");
        let bare = BackendError::Status {
            status: 502,
            detail: None,
        };
        assert_eq!(bare.user_message(), "Request failed with status 502");
    }
}
