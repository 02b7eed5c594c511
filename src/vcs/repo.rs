use crate::config::RepoConfig;
use crate::errors::{ObjectKind, RepoError, Result};
use crate::vcs::git::{BranchEntry, GitAdapter};
use crate::vcs::history::{parse_rev_list, CommitGraph, HistoryBuilder};
use crate::vcs::ledger::{apply_recorded_order, CreationLedger};
use crate::vcs::lock::RepoLock;
use crate::vcs::status::{classify, parse_porcelain};
use crate::vcs::traits::Repo;
use crate::vcs::{short_commit, Commit, FileChange, MergeOutcome};
use std::path::Path;
use tracing::{info, warn};

/// Order branch names: the default branch first, the rest in creation order
///
/// `recorded` is the creation order kept by the ledger. Branches missing from
/// it are placed by the start of their reflog, branches without a reflog last.
pub fn order_branches(
    mut entries: Vec<BranchEntry>,
    recorded: &[String],
    default_branch: &str,
) -> Vec<String> {
    // Stable: equal timestamps keep the backend's listing order
    entries.sort_by_key(|e| (e.created.is_none(), e.created));
    let names: Vec<String> = entries.into_iter().map(|e| e.name).collect();

    let mut ordered = apply_recorded_order(&names, recorded);
    if let Some(pos) = ordered.iter().position(|n| n == default_branch) {
        let default = ordered.remove(pos);
        ordered.insert(0, default);
    }
    ordered
}

/// Git-backed repository
///
/// Keeps only the name of the branch it last saw checked out. That pointer is
/// re-read from the backend before every operation that depends on the
/// working tree, since another process may have moved it.
#[derive(Debug)]
pub struct GitRepo {
    adapter: GitAdapter,
    config: RepoConfig,
    current: Option<String>,
}

impl GitRepo {
    pub fn new<P: AsRef<Path>>(root: P, config: RepoConfig) -> Self {
        Self {
            adapter: GitAdapter::new(root, &config),
            config,
            current: None,
        }
    }

    fn ensure_initialized(&self) -> Result<()> {
        if !self.adapter.is_initialized() {
            return Err(RepoError::not_found(
                ObjectKind::Repository,
                self.adapter.root().display().to_string(),
            ));
        }
        Ok(())
    }

    fn lock(&self) -> Result<Option<RepoLock>> {
        if !self.config.process_lock {
            return Ok(None);
        }
        RepoLock::acquire(&self.adapter.git_dir()).map(Some)
    }

    fn refresh_current_branch(&mut self) -> Result<String> {
        let actual = self.adapter.current_branch_name()?;
        if let Some(cached) = &self.current {
            if cached != &actual {
                warn!(
                    cached = %cached,
                    actual = %actual,
                    "current branch changed outside this handle"
                );
            }
        }
        self.current = Some(actual.clone());
        Ok(actual)
    }

    fn update_ledger(&self, update: impl FnOnce(&mut CreationLedger)) -> Result<()> {
        let git_dir = self.adapter.git_dir();
        let mut ledger = CreationLedger::load(&git_dir)?;
        update(&mut ledger);
        ledger.save(&git_dir)
    }

    /// Stage one path (new, modified or deleted) without committing
    pub fn add_file(&mut self, path: &str) -> Result<()> {
        self.ensure_initialized()?;
        let _lock = self.lock()?;
        self.adapter.stage_paths(&[path])
    }

    /// Commit ids of `branch`, oldest first
    pub fn commit_ids(&self, branch: &str) -> Result<Vec<String>> {
        self.ensure_initialized()?;
        self.adapter.commit_ids_for_branch(branch)
    }

    pub fn head_commit_id(&self) -> Result<String> {
        self.ensure_initialized()?;
        self.adapter.head_commit_id()
    }

    /// Tag names in creation order
    pub fn tag_list(&self) -> Result<Vec<String>> {
        self.ensure_initialized()?;
        let listed = self.adapter.list_tag_names()?;
        let ledger = CreationLedger::load(&self.adapter.git_dir())?;
        Ok(apply_recorded_order(&listed, &ledger.tags))
    }

    /// Store the author identity in the repository's own configuration
    pub fn set_identity(&mut self, name: &str, email: &str) -> Result<()> {
        self.ensure_initialized()?;
        self.adapter.set_identity(name, email)?;
        self.config = self.config.clone().with_identity(name, email);
        self.adapter = GitAdapter::new(self.adapter.root().to_path_buf(), &self.config);
        Ok(())
    }

    /// Give up on a conflicted merge and restore the pre-merge state
    pub fn abort_merge(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        let _lock = self.lock()?;
        self.adapter.abort_merge()?;
        info!("aborted merge");
        Ok(())
    }

    /// Raw bytes of `path` at `commit_id`; works for binary content
    pub fn file_bytes(&self, commit_id: &str, path: &str) -> Result<Vec<u8>> {
        self.ensure_initialized()?;
        self.adapter.file_content_at(commit_id, path)
    }

    pub fn branch_exists(&self, name: &str) -> Result<bool> {
        self.ensure_initialized()?;
        self.adapter.branch_exists(name)
    }

    pub fn is_clean(&self) -> Result<bool> {
        Ok(!self.has_uncommitted_changes()?)
    }
}

impl Repo for GitRepo {
    fn root(&self) -> &Path {
        self.adapter.root()
    }

    fn init(&mut self) -> Result<()> {
        let default_branch = self.config.default_branch.clone();
        self.adapter.initialize(&default_branch)?;
        info!(root = %self.adapter.root().display(), branch = %default_branch, "initialized repository");
        self.current = Some(default_branch);
        Ok(())
    }

    fn switch_branch(&mut self, name: &str) -> Result<()> {
        self.ensure_initialized()?;
        let _lock = self.lock()?;
        let current = self.refresh_current_branch()?;
        if current == name {
            return Ok(());
        }

        if self.adapter.branch_exists(name)? {
            self.adapter.switch_to_branch(name)?;
        } else {
            self.adapter.create_and_switch_branch(name)?;
            self.update_ledger(|ledger| ledger.record_branch(name))?;
        }

        info!(from = %current, to = %name, "switched branch");
        self.current = Some(name.to_string());
        Ok(())
    }

    fn remove_branch(&mut self, name: &str) -> Result<()> {
        self.ensure_initialized()?;
        let _lock = self.lock()?;
        let current = self.refresh_current_branch()?;
        if current == name {
            return Err(RepoError::InvalidState(format!(
                "Cannot remove branch '{}' while it is checked out",
                name
            )));
        }
        if !self.adapter.branch_exists(name)? {
            return Err(RepoError::not_found(ObjectKind::Branch, name));
        }

        self.adapter.delete_branch(name)?;
        self.update_ledger(|ledger| ledger.forget_branch(name))?;
        info!(branch = %name, "removed branch");
        Ok(())
    }

    fn list_branches(&self) -> Result<Vec<String>> {
        self.ensure_initialized()?;
        let entries = self.adapter.list_branch_names()?;
        let ledger = CreationLedger::load(&self.adapter.git_dir())?;
        Ok(order_branches(
            entries,
            &ledger.branches,
            &self.config.default_branch,
        ))
    }

    fn uncommitted_files(&self) -> Result<Vec<FileChange>> {
        self.ensure_initialized()?;
        let raw = self.adapter.status_lines()?;
        let entries = parse_porcelain(&raw)?;
        Ok(classify(&entries))
    }

    fn commit(&mut self, files: &[FileChange], message: &str) -> Result<Commit> {
        self.ensure_initialized()?;
        let _lock = self.lock()?;
        let branch = self.refresh_current_branch()?;

        let paths: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
        if !paths.is_empty() {
            self.adapter.stage_paths(&paths)?;
        }

        let allow_empty = self.config.allow_empty_commits;
        if !allow_empty && (paths.is_empty() || !self.adapter.has_staged_changes(&paths)?) {
            return Err(RepoError::InvalidState(
                "Nothing to commit and empty commits are disabled".to_string(),
            ));
        }

        self.adapter.commit_staged(&paths, message, allow_empty)?;
        let id = self.adapter.head_commit_id()?;
        info!(commit = %short_commit(&id), branch = %branch, files = files.len(), "created commit");

        Ok(Commit {
            files: files.iter().cloned().map(|f| f.in_commit(&id)).collect(),
            id,
        })
    }

    fn commits(&self, branch: &str) -> Result<Vec<Commit>> {
        self.ensure_initialized()?;
        let raw = self.adapter.raw_log_for_branch(branch)?;
        let graph = CommitGraph::from_nodes(parse_rev_list(&raw)?);
        HistoryBuilder::new(&self.adapter).build(&graph)
    }

    fn file_contents(&self, commit_id: &str, path: &str) -> Result<String> {
        let bytes = self.file_bytes(commit_id, path)?;
        String::from_utf8(bytes).map_err(|_| {
            RepoError::Backend(format!(
                "File '{}' at {} is not valid UTF-8 text",
                path,
                short_commit(commit_id)
            ))
        })
    }

    fn tag_head(&mut self, name: &str) -> Result<()> {
        self.ensure_initialized()?;
        let _lock = self.lock()?;
        let head = self.adapter.head_commit_id()?;
        self.adapter.create_tag(name)?;
        self.update_ledger(|ledger| ledger.record_tag(name))?;
        info!(tag = %name, commit = %short_commit(&head), "tagged HEAD");
        Ok(())
    }

    fn reset(&mut self, commit_id: &str) -> Result<()> {
        self.ensure_initialized()?;
        let _lock = self.lock()?;
        if !self.adapter.commit_exists(commit_id) {
            return Err(RepoError::not_found(ObjectKind::Commit, commit_id));
        }
        let branch = self.refresh_current_branch()?;

        self.adapter.reset_hard_to(commit_id)?;
        info!(branch = %branch, commit = %short_commit(commit_id), "reset branch");
        Ok(())
    }

    fn merge_with_outcome(&mut self, branch: &str) -> Result<MergeOutcome> {
        self.ensure_initialized()?;
        let _lock = self.lock()?;
        let current = self.refresh_current_branch()?;
        if !self.adapter.branch_exists(branch)? {
            return Err(RepoError::not_found(ObjectKind::Branch, branch));
        }
        if !self.adapter.conflicted_files()?.is_empty() {
            return Err(RepoError::InvalidState(
                "Repository has unresolved merge conflicts".to_string(),
            ));
        }

        let outcome = self.adapter.merge_branch_into(branch)?;
        match &outcome {
            MergeOutcome::Conflicted { files } => {
                warn!(from = %branch, into = %current, conflicts = files.len(), "merge stopped with conflicts");
            }
            other => {
                info!(from = %branch, into = %current, outcome = ?other, "merged branch");
            }
        }
        Ok(outcome)
    }

    fn current_branch(&self) -> Result<String> {
        self.ensure_initialized()?;
        self.adapter.current_branch_name()
    }

    fn commit_exists(&self, id: &str) -> bool {
        self.adapter.commit_exists(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(name: &str, created: Option<i64>) -> BranchEntry {
        BranchEntry {
            name: name.to_string(),
            created,
        }
    }

    fn recorded(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_order_branches_unrecorded_by_reflog_start() {
        let ordered = order_branches(
            vec![
                entry("alpha", Some(300)),
                entry("zeta", Some(200)),
                entry("master", Some(100)),
            ],
            &[],
            "master",
        );
        assert_eq!(ordered, vec!["master", "zeta", "alpha"]);
    }

    #[test]
    fn test_order_branches_default_first_even_if_newer() {
        let ordered = order_branches(
            vec![entry("feature", Some(1)), entry("master", Some(50))],
            &recorded(&["feature"]),
            "master",
        );
        assert_eq!(ordered, vec!["master", "feature"]);
    }

    #[test]
    fn test_order_branches_same_second_follows_ledger() {
        let ordered = order_branches(
            vec![
                entry("alpha", Some(10)),
                entry("master", Some(5)),
                entry("zeta", Some(10)),
            ],
            &recorded(&["zeta", "alpha"]),
            "master",
        );
        assert_eq!(ordered, vec!["master", "zeta", "alpha"]);
    }

    #[test]
    fn test_order_branches_missing_reflog_last() {
        let ordered = order_branches(
            vec![entry("no-log", None), entry("b", Some(10))],
            &[],
            "master",
        );
        assert_eq!(ordered, vec!["b", "no-log"]);
    }

    #[test]
    fn test_operations_on_missing_repository_fail_with_not_found() {
        let temp = TempDir::new().unwrap();
        let repo = GitRepo::new(temp.path().join("absent"), RepoConfig::default());

        let err = repo.list_branches().unwrap_err();
        assert!(matches!(
            err,
            RepoError::NotFound {
                kind: ObjectKind::Repository,
                ..
            }
        ));
        assert!(!repo.commit_exists("0123456789abcdef0123456789abcdef01234567"));
    }

    #[test]
    fn test_handle_debug_output_names_root() {
        let temp = TempDir::new().unwrap();
        let repo = GitRepo::new(temp.path().join("dbg"), RepoConfig::default());
        let printed = format!("{:?}", repo);
        assert!(printed.contains("GitRepo"));
        assert!(printed.contains("dbg"));
    }
}
