//! Command implementations

pub mod call;
pub mod completions;
pub mod doctor;
pub mod info;
pub mod list;
pub mod verify;

use anyhow::{Context, Result};

use capbridge::util::config::{self, Config};
use capbridge::{BackendSelector, SelectorSettings};

use crate::cli::BackendArgs;

/// Merge config files, environment and flags, in increasing precedence.
pub fn load_settings(overrides: &BackendArgs) -> Result<SelectorSettings> {
    let global = config::global_config_path().unwrap_or_default();

    let mut config = match &overrides.config {
        Some(path) => {
            let mut config = Config::load_or_default(&global);
            config.merge(Config::load(path)?);
            config
        }
        None => {
            let cwd = std::env::current_dir().context("failed to get current directory")?;
            config::load_config(&global, &config::project_config_path(&cwd))
        }
    };

    config.apply_process_env()?;

    if let Some(mode) = overrides.mode {
        config.backend.mode = Some(mode.to_string());
    }
    if let Some(library) = &overrides.native_lib {
        config.native.library = Some(library.clone());
    }
    if overrides.no_native {
        config.native.enabled = Some(false);
    }

    SelectorSettings::from_config(&config)
}

/// Selector for the merged settings.
pub fn selector(overrides: &BackendArgs) -> Result<BackendSelector> {
    Ok(BackendSelector::new(load_settings(overrides)?))
}
