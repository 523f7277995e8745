//! Service container for dependency injection
//!
//! Wires up the editor with its backend, dialogs and render surface.

use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{GatewayPolicy, HierarchyEditor, MutationGateway};
use crate::config::Settings;
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::rest::RestBackend;
use crate::infrastructure::traits::{
    AssumeYes, HeadlessViewport, IndustryBackend, Prompter, ScrollSurface, Selector,
    SkimSelector, TerminalPrompter,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Industry persistence
    pub backend: Arc<dyn IndustryBackend>,

    /// Confirmation and text dialogs
    pub prompter: Arc<dyn Prompter>,

    /// Where panes are rendered and scrolled
    pub surface: Arc<dyn ScrollSurface>,

    /// Fuzzy node picker
    pub selector: Arc<dyn Selector>,
}

impl ServiceContainer {
    /// Create a container talking to the configured REST API.
    ///
    /// With `assume_yes` every confirmation is accepted without asking.
    pub fn new(settings: Settings, assume_yes: bool) -> InfraResult<Self> {
        let backend = Arc::new(RestBackend::new(&settings.api)?);
        let prompter: Arc<dyn Prompter> = if assume_yes {
            Arc::new(AssumeYes)
        } else {
            Arc::new(TerminalPrompter)
        };
        Ok(Self::with_deps(
            settings,
            backend,
            prompter,
            Arc::new(HeadlessViewport::new()),
            Arc::new(SkimSelector),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        backend: Arc<dyn IndustryBackend>,
        prompter: Arc<dyn Prompter>,
        surface: Arc<dyn ScrollSurface>,
        selector: Arc<dyn Selector>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            backend,
            prompter,
            surface,
            selector,
        }
    }

    /// A fresh, unmounted editor session.
    pub fn editor(&self) -> HierarchyEditor {
        let gateway = MutationGateway::new(
            self.backend.clone(),
            GatewayPolicy::from(self.settings.as_ref()),
        );
        HierarchyEditor::new(
            gateway,
            self.prompter.clone(),
            self.surface.clone(),
            Duration::from_millis(self.settings.editor.restore_delay_ms),
        )
    }
}
