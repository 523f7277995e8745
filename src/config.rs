//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/industree/industree.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `INDUSTREE_*` prefix (`__` separates sections)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `http://localhost:8000/api`
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Attempts for idempotent reads (1 = no retry)
    pub retry_attempts: u32,
    /// Delay before the first retry, doubled afterwards
    pub retry_backoff_ms: u64,
    /// Try the legacy rename endpoint when the canonical one answers 404
    pub rename_fallback: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".into(),
            timeout_secs: 10,
            retry_attempts: 3,
            retry_backoff_ms: 200,
            rename_fallback: true,
        }
    }
}

/// Hierarchy editor policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EditorConfig {
    /// Minimum trimmed length for child and rename names
    pub min_name_len: usize,
    /// Delay before the second scroll restore pass
    pub restore_delay_ms: u64,
    /// Ask before moving a node into another main category
    pub confirm_cross_category: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_name_len: 2,
            restore_delay_ms: 50,
            confirm_cross_category: true,
        }
    }
}

/// Raw API config for intermediate parsing (fields are Option to detect "not specified").
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawApiConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub rename_fallback: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawEditorConfig {
    pub min_name_len: Option<usize>,
    pub restore_delay_ms: Option<u64>,
    pub confirm_cross_category: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSettings {
    pub api: RawApiConfig,
    pub editor: RawEditorConfig,
}

/// Unified configuration for industree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub api: ApiConfig,
    pub editor: EditorConfig,
}

/// Get the XDG config directory for industree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "industree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("industree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let api = &overlay.api;
        let editor = &overlay.editor;
        Self {
            api: ApiConfig {
                base_url: api
                    .base_url
                    .clone()
                    .unwrap_or_else(|| self.api.base_url.clone()),
                timeout_secs: api.timeout_secs.unwrap_or(self.api.timeout_secs),
                retry_attempts: api.retry_attempts.unwrap_or(self.api.retry_attempts),
                retry_backoff_ms: api.retry_backoff_ms.unwrap_or(self.api.retry_backoff_ms),
                rename_fallback: api.rename_fallback.unwrap_or(self.api.rename_fallback),
            },
            editor: EditorConfig {
                min_name_len: editor.min_name_len.unwrap_or(self.editor.min_name_len),
                restore_delay_ms: editor
                    .restore_delay_ms
                    .unwrap_or(self.editor.restore_delay_ms),
                confirm_cross_category: editor
                    .confirm_cross_category
                    .unwrap_or(self.editor.confirm_cross_category),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `explicit` - Optional config file given on the command line; it must exist
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(path) = explicit {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Apply INDUSTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("INDUSTREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("api.base_url") {
            settings.api.base_url = val;
        }
        if let Ok(val) = config.get::<u64>("api.timeout_secs") {
            settings.api.timeout_secs = val;
        }
        if let Ok(val) = config.get::<u32>("api.retry_attempts") {
            settings.api.retry_attempts = val;
        }
        if let Ok(val) = config.get::<u64>("api.retry_backoff_ms") {
            settings.api.retry_backoff_ms = val;
        }
        if let Ok(val) = config.get_bool("api.rename_fallback") {
            settings.api.rename_fallback = val;
        }
        if let Ok(val) = config.get::<usize>("editor.min_name_len") {
            settings.editor.min_name_len = val;
        }
        if let Ok(val) = config.get::<u64>("editor.restore_delay_ms") {
            settings.editor.restore_delay_ms = val;
        }
        if let Ok(val) = config.get_bool("editor.confirm_cross_category") {
            settings.editor.confirm_cross_category = val;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "api.base_url must not be empty".to_string(),
            });
        }
        if self.editor.min_name_len == 0 {
            return Err(ApplicationError::Config {
                message: "editor.min_name_len must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# industree configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/industree/industree.toml
#   Explicit: --config <file>
#   Env:      INDUSTREE_* environment variables, e.g. INDUSTREE_API__BASE_URL

[api]
# base_url = "http://localhost:8000/api"
# timeout_secs = 10

# Retries apply to listing only; writes are never retried
# retry_attempts = 3
# retry_backoff_ms = 200

# Fall back to POST industries/<id>/rename/ when PATCH answers 404
# rename_fallback = true

[editor]
# Minimum name length for new sub-industries; renames need at least 2
# min_name_len = 2
# restore_delay_ms = 50
# confirm_cross_category = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
