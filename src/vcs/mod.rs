pub mod factory;
pub mod git;
pub mod history;
pub mod ledger;
pub mod lock;
pub mod repo;
pub mod status;
pub mod traits;

use serde::{Deserialize, Serialize};

/// How a single file changed relative to a reference point
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    #[default]
    Add,
    Modify,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Add => "ADD",
            Action::Modify => "MODIFY",
            Action::Delete => "DELETE",
        }
    }
}

/// A classified per-file delta
///
/// `commit_id` is `None` for working-tree changes that are not committed yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileChange {
    pub filename: String,
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
}

impl FileChange {
    pub fn new(filename: impl Into<String>, action: Action) -> Self {
        Self {
            filename: filename.into(),
            action,
            commit_id: None,
        }
    }

    pub fn in_commit(mut self, commit_id: &str) -> Self {
        self.commit_id = Some(commit_id.to_string());
        self
    }
}

/// An immutable commit with the files it touched relative to its first parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub files: Vec<FileChange>,
}

impl Commit {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Result of merging another branch into the current one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Nothing to merge, the branch is already contained in HEAD
    UpToDate,
    FastForward,
    /// A merge commit was created
    Merged,
    /// The merge stopped with conflicts; the repository is left mid-merge
    Conflicted { files: Vec<String> },
}

impl MergeOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, MergeOutcome::Conflicted { .. })
    }
}

/// Safely shorten a commit hash to 7 characters
/// Returns the shortened hash, or the full hash if it's shorter than 7 chars
pub fn short_commit(hash: &str) -> String {
    hash.chars().take(7).collect()
}
