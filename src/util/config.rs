//! Configuration file support for capbridge.
//!
//! capbridge supports two configuration file locations:
//! - Global: `~/.capbridge/config.toml` - User-wide defaults
//! - Project: `.capbridge/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Environment variables
//! override both, and command-line flags override everything.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::backend::selector::{BackendMode, BackendModeParseError};

/// Environment variable selecting the deployment mode.
pub const ENV_MODE: &str = "CAPBRIDGE_MODE";

/// Environment variable naming the native library file.
pub const ENV_NATIVE_LIB: &str = "CAPBRIDGE_NATIVE_LIB";

/// Environment variable enabling (`1`) or disabling (`0`) native linking.
pub const ENV_NATIVE: &str = "CAPBRIDGE_NATIVE";

/// Capability probed for when none is configured.
pub const DEFAULT_CAPABILITY: &str = "corebridge";

/// capbridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend selection settings
    pub backend: BackendConfig,

    /// Native library settings
    pub native: NativeConfig,
}

/// Backend selection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Deployment mode (fail-loud, fallback). Unset means fail-loud.
    pub mode: Option<String>,
}

/// Native library configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeConfig {
    /// Whether native linking is attempted at all. Unset means enabled.
    pub enabled: Option<bool>,

    /// Explicit path to the native library
    pub library: Option<PathBuf>,

    /// Capability (library base name) to probe for
    pub capability: Option<String>,

    /// Extra directories searched for the platform library name
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Per-operation native symbol overrides
    #[serde(default)]
    pub symbols: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Backend settings
        if other.backend.mode.is_some() {
            self.backend.mode = other.backend.mode;
        }

        // Native settings
        if other.native.enabled.is_some() {
            self.native.enabled = other.native.enabled;
        }
        if other.native.library.is_some() {
            self.native.library = other.native.library;
        }
        if other.native.capability.is_some() {
            self.native.capability = other.native.capability;
        }
        if !other.native.search_paths.is_empty() {
            self.native.search_paths = other.native.search_paths;
        }
        // Symbol overrides are merged per operation
        self.native.symbols.extend(other.native.symbols);
    }

    /// Apply `CAPBRIDGE_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENV_MODE).filter(|v| !v.is_empty()) {
            self.backend.mode = Some(mode);
        }
        if let Some(lib) = lookup(ENV_NATIVE_LIB).filter(|v| !v.is_empty()) {
            self.native.library = Some(PathBuf::from(lib));
        }
        if let Some(flag) = lookup(ENV_NATIVE).filter(|v| !v.is_empty()) {
            let enabled = parse_flag(&flag)
                .with_context(|| format!("invalid value for {}: '{}'", ENV_NATIVE, flag))?;
            self.native.enabled = Some(enabled);
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Parse the configured deployment mode.
    pub fn mode(&self) -> Result<BackendMode, BackendModeParseError> {
        match &self.backend.mode {
            Some(mode) => mode.parse(),
            None => Ok(BackendMode::default()),
        }
    }

    /// Whether native linking is enabled.
    pub fn native_enabled(&self) -> bool {
        self.native.enabled.unwrap_or(true)
    }

    /// Capability to probe for.
    pub fn capability(&self) -> &str {
        self.native
            .capability
            .as_deref()
            .unwrap_or(DEFAULT_CAPABILITY)
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("expected one of: 1, 0, true, false, yes, no, on, off"),
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.capbridge/config.toml)
/// 2. Global config (~/.capbridge/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    // Project config overrides global
    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global capbridge config directory (~/.capbridge).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".capbridge"))
}

/// Get the global config path (~/.capbridge/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.capbridge/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".capbridge").join("config.toml")
}
