use crate::errors::{RepoError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the branch created by `init`
pub const DEFAULT_BRANCH: &str = "master";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepoConfig {
    /// Branch that `init` makes current and that listings always put first
    pub default_branch: String,
    /// Program invoked for backend primitives
    pub git_binary: String,
    /// Whether `commit` may create a commit with nothing staged
    pub allow_empty_commits: bool,
    /// Serialize mutating operations across processes with an advisory lock
    pub process_lock: bool,
    /// Author identity applied to every backend invocation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            default_branch: DEFAULT_BRANCH.to_string(),
            git_binary: "git".to_string(),
            allow_empty_commits: true,
            process_lock: true,
            identity: None,
        }
    }
}

impl RepoConfig {
    /// Load config from a YAML file, falling back to defaults when it is absent
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(RepoConfig::default());
        }

        let content = fs::read_to_string(config_path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: RepoConfig = serde_yml::from_str(content)
            .map_err(|e| RepoError::ConfigError(format!("Failed to parse config: {}", e)))?;

        if config.default_branch.trim().is_empty() {
            return Err(RepoError::ConfigError(
                "default_branch must not be empty".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn with_identity(mut self, name: &str, email: &str) -> Self {
        self.identity = Some(Identity {
            name: name.to_string(),
            email: email.to_string(),
        });
        self
    }
}
