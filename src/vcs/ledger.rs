/// Creation order of branches and tags
///
/// Ref timestamps only have one-second resolution, so the order in which this
/// crate created branches and tags is recorded in a small YAML file inside
/// the backend metadata directory. Refs created by other tools are not in the
/// ledger and keep the position the backend listed them at.
use crate::errors::{RepoError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const LEDGER_FILE_NAME: &str = "repokit-order.yml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreationLedger {
    pub branches: Vec<String>,
    pub tags: Vec<String>,
}

impl CreationLedger {
    pub fn ledger_path(git_dir: &Path) -> PathBuf {
        git_dir.join(LEDGER_FILE_NAME)
    }

    /// Load the ledger, or an empty one if none was written yet
    pub fn load(git_dir: &Path) -> Result<Self> {
        let path = Self::ledger_path(git_dir);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yml::from_str(&content).map_err(|e| {
            RepoError::Backend(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn save(&self, git_dir: &Path) -> Result<()> {
        let yaml = serde_yml::to_string(self)
            .map_err(|e| RepoError::Backend(format!("Failed to serialize ledger: {}", e)))?;
        fs::write(Self::ledger_path(git_dir), yaml)?;
        Ok(())
    }

    /// Record `name` as the newest branch; a re-created branch moves to the end
    pub fn record_branch(&mut self, name: &str) {
        self.forget_branch(name);
        self.branches.push(name.to_string());
    }

    pub fn forget_branch(&mut self, name: &str) {
        self.branches.retain(|b| b != name);
    }

    pub fn record_tag(&mut self, name: &str) {
        self.tags.retain(|t| t != name);
        self.tags.push(name.to_string());
    }
}

/// Reorder `listed` so recorded names follow the recorded order
///
/// Recorded names take over the slots recorded names occupied in `listed`;
/// unrecorded names stay where they were. Recorded names missing from
/// `listed` are ignored.
pub fn apply_recorded_order(listed: &[String], recorded: &[String]) -> Vec<String> {
    let listed_set: HashSet<&str> = listed.iter().map(String::as_str).collect();
    let recorded_set: HashSet<&str> = recorded.iter().map(String::as_str).collect();
    let mut in_order = recorded
        .iter()
        .filter(|name| listed_set.contains(name.as_str()));

    listed
        .iter()
        .map(|name| {
            if recorded_set.contains(name.as_str()) {
                in_order.next().unwrap_or(name).clone()
            } else {
                name.clone()
            }
        })
        .collect()
}
