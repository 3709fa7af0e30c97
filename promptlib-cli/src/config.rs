//! Configuration management for promptlib
//!
//! Settings come from, in order of precedence: command-line flags (or their environment variables), the JSON config
//! file, built-in defaults.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "promptlib";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prompt library file
    pub library_path: Option<PathBuf>,

    /// Clipboard command line, e.g. `xclip -selection clipboard`. Guessed per platform if unset.
    pub clipboard_command: Option<String>,

    /// Model whose tokenizer is used by `fill --tokens`
    pub token_model: Option<String>,
}

impl Config {
    /// Load the config file at `path`, or the default config file when `path` is `None`.
    /// A missing default config file gives the default config; a missing explicit one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from_file(&path),
                _ => {
                    debug!("no config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
    }

    /// The library to use: `flag` if given, then the config file, then the platform data directory.
    pub fn library_path(&self, flag: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = flag.map(Path::to_path_buf).or_else(|| self.library_path.clone()) {
            return Ok(path);
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR).join("library.json"))
            .context("cannot determine a data directory, pass --library")
    }

    pub fn token_model(&self) -> &str {
        self.token_model.as_deref().unwrap_or("gpt-4")
    }
}
