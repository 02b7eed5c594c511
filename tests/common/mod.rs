/// Common test utilities for repokit integration tests
use repokit::{GitRepo, Repo, RepoConfig, RepoFactory};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub const TEST_BRANCH: &str = "test_branch";
pub const TEST_FILE: &str = "test_file.txt";
pub const TEST_FILE_CONTENTS: &str = "Some test file contents\n";
pub const COMMIT_MESSAGE: &str = "Some commit message";

/// An initialized repository with one commit, in a temporary directory
#[allow(dead_code)]
pub struct TestRepo {
    pub temp_dir: TempDir,
    pub repo_path: PathBuf,
    pub repo: GitRepo,
    pub initial_commit: String,
}

impl TestRepo {
    /// Create a new test repository with one commit on master
    pub fn new() -> Self {
        Self::with_config(RepoConfig::default())
    }

    pub fn with_config(config: RepoConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let repo_path = temp_dir.path().join("repo");

        let config = config.with_identity("Test User", "test@example.com");
        let mut repo = RepoFactory::new(config)
            .init(&repo_path)
            .expect("Failed to init repository");

        // One commit so the default branch exists
        std::fs::write(repo_path.join("initial_commit.txt"), "initial commit")
            .expect("Failed to write initial file");
        let files = repo.uncommitted_files().expect("Failed to read status");
        let initial_commit = repo
            .commit(&files, "Initial commit")
            .expect("Failed to create initial commit")
            .id;

        TestRepo {
            temp_dir,
            repo_path,
            repo,
            initial_commit,
        }
    }

    /// Get the repository path
    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.repo_path
    }

    #[allow(dead_code)]
    pub fn write_file(&self, name: &str, content: &str) {
        let path = self.repo_path.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    #[allow(dead_code)]
    pub fn delete_file(&self, name: &str) {
        std::fs::remove_file(self.repo_path.join(name)).expect("Failed to delete file");
    }

    #[allow(dead_code)]
    pub fn file_exists(&self, name: &str) -> bool {
        self.repo_path.join(name).exists()
    }

    #[allow(dead_code)]
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.repo_path.join(name)).expect("Failed to read file")
    }

    /// Commit everything currently uncommitted
    #[allow(dead_code)]
    pub fn commit_all(&mut self, message: &str) -> String {
        let files = self.repo.uncommitted_files().expect("Failed to read status");
        self.repo.commit(&files, message).expect("Failed to commit").id
    }

    /// Run git directly, bypassing the facade
    #[allow(dead_code)]
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_path)
            .args(args)
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}
