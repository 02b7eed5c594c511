/// Repository construction keyed by storage location
///
/// Every handle carries its own root path; nothing here touches the
/// process-global current directory.
use crate::config::RepoConfig;
use crate::errors::{ObjectKind, RepoError, Result};
use crate::vcs::repo::GitRepo;
use crate::vcs::traits::Repo;
use std::path::Path;

/// Check whether `path` holds a repository
pub fn is_repository(path: &Path) -> bool {
    path.join(".git").exists()
}

#[derive(Debug, Clone, Default)]
pub struct RepoFactory {
    config: RepoConfig,
}

impl RepoFactory {
    pub fn new(config: RepoConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Handle for `root`, which may not be initialized yet
    pub fn create<P: AsRef<Path>>(&self, root: P) -> GitRepo {
        GitRepo::new(root, self.config.clone())
    }

    /// Handle for an existing repository
    pub fn open<P: AsRef<Path>>(&self, root: P) -> Result<GitRepo> {
        let root = root.as_ref();
        if !is_repository(root) {
            return Err(RepoError::not_found(
                ObjectKind::Repository,
                root.display().to_string(),
            ));
        }
        Ok(self.create(root))
    }

    /// Initialize a new repository at `root` and return its handle
    pub fn init<P: AsRef<Path>>(&self, root: P) -> Result<GitRepo> {
        let mut repo = self.create(root);
        repo.init()?;
        Ok(repo)
    }
}

/// Open an existing repository at a specific path as a trait object
pub fn create_repo_at_path(path: &Path, config: &RepoConfig) -> Result<Box<dyn Repo>> {
    let repo = RepoFactory::new(config.clone()).open(path)?;
    Ok(Box::new(repo))
}
