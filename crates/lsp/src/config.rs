//! Workspace configuration read from an optional `vero.toml`.
//!
//! ```toml
//! [workspace]
//! extensions = ["vero"]
//! exclude = ["node_modules", "target"]
//!
//! [diagnostics]
//! max_errors = 100
//! ```
//!
//! Every key is optional; a missing file means defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the workspace root when no path is given.
pub const CONFIG_FILE_NAME: &str = "vero.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration in '{path}': {message}")]
    Invalid { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VeroConfig {
    pub workspace: WorkspaceConfig,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Script file extensions, without the dot.
    pub extensions: Vec<String>,
    /// Directory names skipped while walking the workspace.
    pub exclude: Vec<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        WorkspaceConfig {
            extensions: vec!["vero".to_owned()],
            exclude: vec![
                ".git".to_owned(),
                "node_modules".to_owned(),
                "target".to_owned(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Parse errors reported per file.
    pub max_errors: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        DiagnosticsConfig {
            max_errors: vero_core::parser::DEFAULT_MAX_ERRORS,
        }
    }
}

impl VeroConfig {
    pub fn parse_options(&self) -> vero_core::ParseOptions {
        vero_core::ParseOptions {
            max_errors: self.diagnostics.max_errors,
        }
    }

    /// Does `path` carry one of the configured script extensions?
    pub fn is_script(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.workspace.extensions.iter().any(|x| x == ext))
    }

    pub fn is_excluded(&self, dir_name: &str) -> bool {
        self.workspace.exclude.iter().any(|x| x == dir_name)
    }
}

/// Read and validate the config file at `path`.
pub fn load(path: &Path) -> Result<VeroConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: VeroConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate(&config).map_err(|message| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(config)
}

/// Load `root/vero.toml` if it exists, defaults otherwise.
pub fn discover(root: &Path) -> Result<VeroConfig, ConfigError> {
    let candidate = root.join(CONFIG_FILE_NAME);
    if candidate.is_file() {
        tracing::debug!(path = %candidate.display(), "loading workspace config");
        load(&candidate)
    } else {
        Ok(VeroConfig::default())
    }
}

fn validate(config: &VeroConfig) -> Result<(), String> {
    if config.workspace.extensions.is_empty() {
        return Err("workspace.extensions must list at least one extension".to_owned());
    }
    if let Some(bad) = config
        .workspace
        .extensions
        .iter()
        .find(|e| e.is_empty() || e.starts_with('.'))
    {
        return Err(format!(
            "workspace.extensions entry '{}' must be a bare extension like \"vero\"",
            bad
        ));
    }
    if config.diagnostics.max_errors == 0 {
        return Err("diagnostics.max_errors must be at least 1".to_owned());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_means_defaults() {
        let config: VeroConfig = toml::from_str("").unwrap();
        assert_eq!(config, VeroConfig::default());
        assert_eq!(config.diagnostics.max_errors, 100);
        assert!(config.is_script(Path::new("a/login.vero")));
        assert!(!config.is_script(Path::new("a/login.txt")));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: VeroConfig = toml::from_str("[diagnostics]\nmax_errors = 5\n").unwrap();
        assert_eq!(config.diagnostics.max_errors, 5);
        assert_eq!(config.workspace, WorkspaceConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<VeroConfig>("[workspace]\nextension = [\"vero\"]\n").is_err());
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut config = VeroConfig::default();
        config.workspace.extensions = vec![".vero".to_owned()];
        assert!(validate(&config).is_err());
        config.workspace.extensions = vec!["vero".to_owned()];
        config.diagnostics.max_errors = 0;
        assert!(validate(&config).is_err());
    }
}
