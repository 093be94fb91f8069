//! Configuration loading for dcg
//!
//! Supports TOML configuration with embedded defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::engine::SafePaths;
use crate::rules::{PackError, PatternRegistry, RegistryBuilder};

/// Errors raised while reading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// General configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable audit logging
    pub audit_log: bool,

    /// Path to audit log file
    pub audit_path: Option<String>,

    /// Default tracing filter when `DCG_LOG` is unset
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            audit_log: true,
            audit_path: Some("~/.config/dcg/audit.jsonl".to_string()),
            log_level: "warn".to_string(),
        }
    }
}

/// Safe-path configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Anchor for relative safe paths and operands
    pub project_root: Option<String>,

    /// Disposable directories where filesystem deletion is not flagged
    pub safe_paths: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            project_root: None,
            safe_paths: DEFAULT_SAFE_PATHS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Default safe paths; relative entries are anchored to the project root.
pub const DEFAULT_SAFE_PATHS: &[&str] = &[
    "/tmp",
    "/var/tmp",
    "$TMPDIR",
    "node_modules",
    "target",
    "dist",
    "build",
    ".cache",
    "__pycache__",
    ".pytest_cache",
    "coverage",
];

/// Pack selection
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PacksConfig {
    /// Built-in extension packs to enable
    pub enabled: Vec<String>,

    /// Pack definition files
    pub files: Vec<String>,
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub paths: PathsConfig,
    pub packs: PacksConfig,
}

impl Config {
    /// Candidate config locations, most specific first
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("dcg/config.toml"));
        }
        paths.push(PathBuf::from("/etc/dcg/config.toml"));
        paths
    }

    /// Load configuration from the first existing standard location, or
    /// use defaults when there is none
    pub fn load() -> Result<Self, ConfigError> {
        match Self::search_paths().into_iter().find(|p| p.exists()) {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Expand ~ in path strings
    pub fn expand_path(path: &str) -> PathBuf {
        if path == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get the audit log path (expanded), `None` when auditing is off
    pub fn audit_path(&self) -> Option<PathBuf> {
        if !self.general.audit_log {
            return None;
        }
        self.general.audit_path.as_deref().map(Self::expand_path)
    }

    /// Configured project root (expanded)
    pub fn project_root(&self) -> Option<PathBuf> {
        self.paths.project_root.as_deref().map(Self::expand_path)
    }

    /// Core set plus enabled built-in packs plus pack files.
    pub fn build_registry(&self) -> Result<PatternRegistry, PackError> {
        let mut builder = RegistryBuilder::new().with_core();
        for name in &self.packs.enabled {
            builder = builder.add_builtin(name)?;
        }
        for file in &self.packs.files {
            builder = builder.add_pack_file(&Self::expand_path(file))?;
        }
        builder.build()
    }

    /// Safe-path set anchored at `project_root`, falling back to the
    /// configured root.
    pub fn safe_paths(&self, project_root: Option<&Path>) -> SafePaths {
        let configured = self.project_root();
        let root = configured.as_deref().or(project_root);
        SafePaths::new(&self.paths.safe_paths, root)
    }
}

/// Embedded default configuration
pub const DEFAULT_CONFIG_TOML: &str = r#"
[general]
audit_log = true
audit_path = "~/.config/dcg/audit.jsonl"
log_level = "warn"

[paths]
safe_paths = [
    "/tmp",
    "/var/tmp",
    "$TMPDIR",
    "node_modules",
    "target",
    "dist",
    "build",
    ".cache",
    "__pycache__",
    ".pytest_cache",
    "coverage",
]

[packs]
enabled = []
files = []
"#;
