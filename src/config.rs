//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/checktree/checktree.toml`
//! 3. Local config: an explicit file, e.g. `--config ./checktree.toml`
//! 4. Environment variables: `CHECKTREE_*` prefix

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::TreeBuilder;

/// Unified configuration for checktree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Propagate check/uncheck down to descendants (default: true)
    pub cascade: bool,
    /// Record field holding the initial boolean state (default: "checked")
    pub checked_field: String,
    /// Record field holding the node id (default: "id")
    pub id_field: String,
    /// Record field holding nested child records (default: "children")
    pub children_field: String,
    /// Record field naming the parent id in flat input (default: "parentId")
    pub parent_field: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cascade: true,
            checked_field: "checked".into(),
            id_field: "id".into(),
            children_field: "children".into(),
            parent_field: "parentId".into(),
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub cascade: Option<bool>,
    pub checked_field: Option<String>,
    pub id_field: Option<String>,
    pub children_field: Option<String>,
    pub parent_field: Option<String>,
}

/// Get the XDG config directory for checktree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "checktree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("checktree.toml"))
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
    /// Overlay wins where it specifies a value.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            cascade: overlay.cascade.unwrap_or(self.cascade),
            checked_field: overlay
                .checked_field
                .clone()
                .unwrap_or_else(|| self.checked_field.clone()),
            id_field: overlay
                .id_field
                .clone()
                .unwrap_or_else(|| self.id_field.clone()),
            children_field: overlay
                .children_field
                .clone()
                .unwrap_or_else(|| self.children_field.clone()),
            parent_field: overlay
                .parent_field
                .clone()
                .unwrap_or_else(|| self.parent_field.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_config` - Optional config file; unlike the global file it must exist
    pub fn load(local_config: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("load: global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        // 3. Explicit local config
        if let Some(local_path) = local_config {
            debug!("load: local config {}", local_path.display());
            current = current.merge_with(&load_raw_settings(local_path)?);
        }

        // 4. Environment variables (explicit override)
        current = current.apply_env_overrides(None)?;

        current.validate()?;
        Ok(current)
    }

    /// Apply CHECKTREE_* environment variables as explicit overrides.
    ///
    /// `source` replaces the process environment, which keeps tests hermetic.
    pub fn apply_env_overrides(
        mut self,
        source: Option<HashMap<String, String>>,
    ) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("CHECKTREE")
                    .prefix_separator("_")
                    .separator("__")
                    .source(source),
            )
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value(config.get_bool("cascade"))? {
            self.cascade = val;
        }
        if let Some(val) = env_value(config.get_string("checked_field"))? {
            self.checked_field = val;
        }
        if let Some(val) = env_value(config.get_string("id_field"))? {
            self.id_field = val;
        }
        if let Some(val) = env_value(config.get_string("children_field"))? {
            self.children_field = val;
        }
        if let Some(val) = env_value(config.get_string("parent_field"))? {
            self.parent_field = val;
        }

        Ok(self)
    }

    /// Reject settings that cannot describe a record layout.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        let fields = [
            ("checked_field", &self.checked_field),
            ("id_field", &self.id_field),
            ("children_field", &self.children_field),
            ("parent_field", &self.parent_field),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ApplicationError::Config {
                message: format!("{name} must not be empty"),
            });
        }
        if self.id_field == self.children_field {
            return Err(ApplicationError::Config {
                message: "id_field and children_field must differ".to_string(),
            });
        }
        Ok(())
    }

    /// A builder reading records with the configured field names.
    pub fn tree_builder(&self) -> TreeBuilder {
        TreeBuilder::new()
            .with_id_field(&self.id_field)
            .with_checked_field(&self.checked_field)
            .with_children_field(&self.children_field)
            .with_parent_field(&self.parent_field)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# checktree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/checktree/checktree.toml
#   Local:  file passed with --config
#   Env:    CHECKTREE_* environment variables (e.g. CHECKTREE_CASCADE=false)

# Propagate check/uncheck to all descendants
# cascade = true

# Record field holding the initial checked state
# checked_field = "checked"

# Record field holding the node id
# id_field = "id"

# Record field holding nested children
# children_field = "children"

# Record field naming the parent id (flat input only)
# parent_field = "parentId"
"#
        .to_string()
    }
}

/// An unset variable inherits; a set but unparseable one is an error.
fn env_value<T>(result: Result<T, ConfigError>) -> Result<Option<T>, ApplicationError> {
    match result {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
