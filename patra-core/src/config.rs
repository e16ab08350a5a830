//! Configuration for Patra.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment. The user file lives at
//! `~/.config/patra/config.toml` (platform equivalent), the workspace file at
//! `.patra/config.toml`.

use crate::error::CardError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatraConfig {
    /// Model registry the `submit` command posts to.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Python environment the analyzers run in.
    #[serde(default)]
    pub python: PythonConfig,
}

/// Registry endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Submission endpoint, e.g. `https://patra.example.org/upload_mc`.
    #[serde(default)]
    pub url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

/// Python runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonConfig {
    /// Path to Python executable (`python3` if not set).
    #[serde(default)]
    pub python_path: Option<PathBuf>,
    /// Virtual environment whose interpreter should be used instead.
    #[serde(default)]
    pub venv_path: Option<PathBuf>,
    /// Timeout for a single analyzer script (seconds).
    #[serde(default = "default_python_timeout")]
    pub timeout_secs: u64,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            python_path: None,
            venv_path: None,
            timeout_secs: default_python_timeout(),
        }
    }
}

fn default_python_timeout() -> u64 {
    300
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (`PATRA_REGISTRY__URL`, `PATRA_PYTHON__TIMEOUT_SECS`, ...)
/// 2. Workspace-local config (`.patra/config.toml`)
/// 3. User config (`~/.config/patra/config.toml`)
/// 4. Built-in defaults
///
/// A malformed file or an env var of the wrong type is a [`CardError::Config`].
pub fn load_config(workspace: Option<&Path>) -> Result<PatraConfig, CardError> {
    let mut figment = Figment::from(Serialized::defaults(PatraConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    figment = figment.merge(Env::prefixed("PATRA_").split("__"));

    Ok(figment.extract()?)
}

/// `~/.config/patra/config.toml` or the platform equivalent.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("edu", "d2i", "patra")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".patra").join("config.toml")
}
