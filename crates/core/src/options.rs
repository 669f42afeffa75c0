//! Project options: the seed data bag supplied by the command layer
//!
//! Options are loaded from a `forgeline.json` found by walking up from the
//! invocation directory, then validated before any phase runs.

use crate::{
    error::{Error, Result},
    plugin::PluginRequest,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Build mode selected by the command layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

/// Raw project options as declared in `forgeline.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProjectOptions {
    /// Project root directory
    pub root: PathBuf,

    #[serde(default)]
    pub mode: Mode,

    /// Target platform label (e.g. "node", "browser")
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Entry-point modules, relative to the project root
    #[serde(default)]
    pub entries: Vec<String>,

    /// Module-resolution alias table (prefix -> replacement)
    #[serde(default)]
    pub alias: BTreeMap<String, String>,

    /// Module specifiers forced into the bundle
    #[serde(default)]
    pub include: Vec<String>,

    /// Module specifiers kept out of the bundle
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Plugin requests to resolve at engine construction
    #[serde(default)]
    pub plugins: Vec<PluginRequest>,
}

fn default_platform() -> String {
    "node".to_string()
}

impl ProjectOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            platform: default_platform(),
            ..Self::default()
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::Configuration(format!("Failed to parse options: {e}")))?;
        Ok(options)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("Failed to serialize options: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Walk up from `start_path` looking for a `forgeline.json`
    pub fn find_options_file(start_path: &Path) -> Option<PathBuf> {
        let mut current = start_path;

        loop {
            let candidate = current.join("forgeline.json");
            if candidate.exists() {
                return Some(candidate);
            }

            current = current.parent()?;
        }
    }

    /// Validate before any phase runs; violations are fatal.
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(Error::Configuration("project root is not set".to_string()));
        }
        if !self.root.exists() {
            return Err(Error::Configuration(format!(
                "project root does not exist: {}",
                self.root.display()
            )));
        }
        for (prefix, _) in &self.alias {
            if prefix.is_empty() {
                return Err(Error::Configuration(
                    "alias table contains an empty prefix".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Path configuration resolved from validated options
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub root: PathBuf,
    /// Where the artifact writer flushes generated sources
    pub generated_dir: PathBuf,
}

impl ResolvedPaths {
    pub fn from_options(options: &ProjectOptions) -> Self {
        Self {
            root: options.root.clone(),
            generated_dir: options.root.join(".forgeline").join("generated"),
        }
    }
}
