//! The repository index (`problems.json`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ConfigError, Result};

pub const INDEX_FILE: &str = "problems.json";

#[derive(Debug, Clone, Deserialize)]
pub struct IndexEntry {
    /// Directory relative to the repository root.
    pub path: PathBuf,
    pub title: String,
    #[serde(default)]
    pub disabled: bool,
}

/// Every problem and contest declared in the repository.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryIndex {
    #[serde(default)]
    pub problems: Vec<IndexEntry>,
    #[serde(default)]
    pub contests: Vec<IndexEntry>,
}

impl RepositoryIndex {
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(INDEX_FILE);
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::io(&path, e))?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Json { path, source })
    }

    /// Enabled problem directories, resolved against `root`.
    pub fn problem_dirs(&self, root: &Path) -> Vec<PathBuf> {
        enabled(&self.problems, root, "Problem")
    }

    /// Enabled contest directories, resolved against `root`.
    pub fn contest_dirs(&self, root: &Path) -> Vec<PathBuf> {
        enabled(&self.contests, root, "Contest")
    }
}

fn enabled(entries: &[IndexEntry], root: &Path, label: &str) -> Vec<PathBuf> {
    entries
        .iter()
        .filter(|entry| {
            if entry.disabled {
                tracing::warn!(title = %entry.title, "{label} disabled, skipping");
            }
            !entry.disabled
        })
        .map(|entry| root.join(&entry.path))
        .collect()
}
