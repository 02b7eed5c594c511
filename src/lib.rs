// Library interface for repokit
// A repository facade over git: branches, commits, history, status, tags, reset and merge

pub mod config;
pub mod errors;
pub mod vcs;

pub use config::{Identity, RepoConfig};
pub use errors::{ObjectKind, RepoError, Result};
pub use vcs::factory::{create_repo_at_path, RepoFactory};
pub use vcs::repo::GitRepo;
pub use vcs::traits::Repo;
pub use vcs::{Action, Commit, FileChange, MergeOutcome};
