use crate::config::{Identity, RepoConfig};
use crate::errors::{ObjectKind, RepoError, Result};
use crate::vcs::history::DiffSource;
use crate::vcs::MergeOutcome;
use git2::{BranchType, Oid, Repository};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Stderr fragments that mean the repository state forbids the operation
const INVALID_STATE_MARKERS: &[&str] = &[
    "would be overwritten",
    "nothing to commit",
    "nothing added to commit",
    "already exists",
    "cannot delete branch",
    "checked out at",
    "unmerged",
    "needs merge",
    "not concluded your merge",
    "no merge to abort",
    "resolve your current index first",
];

/// Stderr fragments that mean the referenced object does not exist
const NOT_FOUND_MARKERS: &[&str] = &[
    "did not match any",
    "unknown revision",
    "not a valid object name",
    "bad revision",
    "not something we can merge",
    "does not exist",
    "not found",
];

/// Helper to extract meaningful error message from git command output
fn message_from_output(output: &Output, context: &str) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let exit_code = output.status.code().unwrap_or(-1);

    if !stderr.trim().is_empty() {
        format!("{}: {}", context, stderr.trim())
    } else if !stdout.trim().is_empty() {
        format!("{}: {}", context, stdout.trim())
    } else {
        format!("{} (exit code: {})", context, exit_code)
    }
}

/// Classify a failed invocation into the error taxonomy
///
/// `target` names the object the primitive referred to, if any; it is only
/// used when the output says that object is missing.
fn git_error_from_output(
    output: &Output,
    context: &str,
    target: Option<(ObjectKind, &str)>,
) -> RepoError {
    let message = message_from_output(output, context);
    let lowered = message.to_lowercase();

    if let Some((kind, name)) = target {
        if NOT_FOUND_MARKERS.iter().any(|m| lowered.contains(m)) {
            return RepoError::not_found(kind, name);
        }
    }

    if INVALID_STATE_MARKERS.iter().any(|m| lowered.contains(m)) {
        return RepoError::InvalidState(message);
    }

    RepoError::Backend(message)
}

/// One entry of a branch listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchEntry {
    pub name: String,
    /// Seconds since epoch of the oldest reflog entry, when there is one
    pub created: Option<i64>,
}

/// Thin adapter over the git executable and libgit2
///
/// Every invocation runs against `root` explicitly (`git -C <root>`), so
/// several adapters can live in one process without sharing a working
/// directory. Mutating primitives shell out; read-only lookups go through
/// git2.
#[derive(Debug, Clone)]
pub struct GitAdapter {
    root: PathBuf,
    git_binary: String,
    identity: Option<Identity>,
}

impl GitAdapter {
    pub fn new<P: AsRef<Path>>(root: P, config: &RepoConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            git_binary: config.git_binary.clone(),
            identity: config.identity.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn git_dir(&self) -> PathBuf {
        self.root.join(".git")
    }

    pub fn is_initialized(&self) -> bool {
        self.git_dir().exists()
    }

    fn open(&self) -> Result<Repository> {
        Repository::open(&self.root).map_err(|e| {
            RepoError::Backend(format!(
                "Failed to open repository at {}: {}",
                self.root.display(),
                e.message()
            ))
        })
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.git_binary);
        cmd.arg("-C").arg(&self.root);

        if let Some(identity) = &self.identity {
            cmd.arg("-c")
                .arg(format!("user.name={}", identity.name))
                .arg("-c")
                .arg(format!("user.email={}", identity.email));
        }

        cmd.args(["-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"]);
        // Output is parsed, so keep messages untranslated
        cmd.env("LC_ALL", "C").env("GIT_TERMINAL_PROMPT", "0");
        cmd
    }

    /// Run a git command and return its output regardless of exit status
    fn output(&self, args: &[&str]) -> Result<Output> {
        debug!(root = %self.root.display(), ?args, "running git");
        let output = self.command().args(args).output()?;
        if !output.status.success() {
            debug!(
                status = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git exited with failure"
            );
        }
        Ok(output)
    }

    fn run(&self, args: &[&str], context: &str) -> Result<Output> {
        self.run_targeting(args, context, None)
    }

    fn run_targeting(
        &self,
        args: &[&str],
        context: &str,
        target: Option<(ObjectKind, &str)>,
    ) -> Result<Output> {
        let output = self.output(args)?;
        if !output.status.success() {
            return Err(git_error_from_output(&output, context, target));
        }
        Ok(output)
    }

    fn run_stdout(&self, args: &[&str], context: &str) -> Result<String> {
        let output = self.run(args, context)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    // ===== Repository lifecycle =====

    /// Create the repository with `default_branch` as the unborn HEAD
    pub fn initialize(&self, default_branch: &str) -> Result<()> {
        if self.is_initialized() {
            return Err(RepoError::InvalidState(format!(
                "Repository already exists at {}",
                self.root.display()
            )));
        }

        std::fs::create_dir_all(&self.root)?;
        self.run(&["init", "--quiet"], "Failed to initialize repository")?;

        let head_ref = format!("refs/heads/{}", default_branch);
        self.run(
            &["symbolic-ref", "HEAD", &head_ref],
            "Failed to set default branch",
        )?;
        Ok(())
    }

    /// Persist an author identity in the repository's local configuration
    pub fn set_identity(&self, name: &str, email: &str) -> Result<()> {
        self.run(&["config", "user.name", name], "Failed to set user name")?;
        self.run(&["config", "user.email", email], "Failed to set user email")?;
        Ok(())
    }

    // ===== Branches =====

    pub fn current_branch_name(&self) -> Result<String> {
        let output = self.output(&["symbolic-ref", "--quiet", "--short", "HEAD"])?;
        if !output.status.success() {
            if output.status.code() == Some(1) {
                return Err(RepoError::InvalidState(
                    "HEAD is detached, no branch is checked out".to_string(),
                ));
            }
            return Err(git_error_from_output(
                &output,
                "Failed to read current branch",
                None,
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn branch_exists(&self, name: &str) -> Result<bool> {
        let repo = self.open()?;
        let exists = repo.find_branch(name, BranchType::Local).is_ok();
        Ok(exists)
    }

    /// Local branches with the time their reflog starts
    pub fn list_branch_names(&self) -> Result<Vec<BranchEntry>> {
        let repo = self.open()?;
        let mut entries = Vec::new();

        for branch in repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            let Some(name) = branch.name()?.map(str::to_string) else {
                continue;
            };

            let created = repo
                .reflog(&format!("refs/heads/{}", name))
                .ok()
                .and_then(|reflog| {
                    // Entry 0 is the newest
                    let oldest = reflog.len().checked_sub(1)?;
                    reflog
                        .get(oldest)
                        .map(|entry| entry.committer().when().seconds())
                });

            entries.push(BranchEntry { name, created });
        }

        Ok(entries)
    }

    pub fn create_and_switch_branch(&self, name: &str) -> Result<()> {
        self.run(
            &["checkout", "--quiet", "-b", name],
            &format!("Failed to create branch '{}'", name),
        )?;
        Ok(())
    }

    pub fn switch_to_branch(&self, name: &str) -> Result<()> {
        self.run_targeting(
            &["checkout", "--quiet", name, "--"],
            &format!("Failed to switch to branch '{}'", name),
            Some((ObjectKind::Branch, name)),
        )?;
        Ok(())
    }

    pub fn delete_branch(&self, name: &str) -> Result<()> {
        self.run_targeting(
            &["branch", "-D", name],
            &format!("Failed to delete branch '{}'", name),
            Some((ObjectKind::Branch, name)),
        )?;
        Ok(())
    }

    // ===== Working tree and commits =====

    /// Raw `status --porcelain=v1 -z` output, untracked files listed individually
    pub fn status_lines(&self) -> Result<String> {
        self.run_stdout(
            &["status", "--porcelain=v1", "-z", "--untracked-files=all"],
            "Failed to get status",
        )
    }

    /// Stage paths so the index matches the working tree for each of them
    ///
    /// Paths present on disk are added; missing paths are removed from the
    /// index (a no-op when the removal is already staged).
    pub fn stage_paths(&self, paths: &[&str]) -> Result<()> {
        let (present, missing): (Vec<&str>, Vec<&str>) = paths
            .iter()
            .copied()
            .partition(|p| self.root.join(p).symlink_metadata().is_ok());

        if !present.is_empty() {
            let mut args = vec!["add", "--"];
            args.extend(present.iter().copied());
            let target = present.first().copied().unwrap_or_default();
            self.run_targeting(
                &args,
                "Failed to stage files",
                Some((ObjectKind::File, target)),
            )?;
        }

        if !missing.is_empty() {
            let mut args = vec!["rm", "--cached", "--quiet", "--ignore-unmatch", "--"];
            args.extend(missing.iter().copied());
            self.run(&args, "Failed to stage removed files")?;
        }

        Ok(())
    }

    /// Commit `paths` only, leaving anything else staged in the index
    ///
    /// With no paths the index is committed as it stands. A merge in progress
    /// cannot be committed partially, so the whole index is committed then.
    pub fn commit_staged(&self, paths: &[&str], message: &str, allow_empty: bool) -> Result<()> {
        let mut args = vec!["commit", "--quiet", "--no-verify", "-m", message];
        if allow_empty {
            args.push("--allow-empty");
        }
        if !paths.is_empty() && !self.is_merging() {
            args.extend(["--only", "--"]);
            args.extend(paths.iter().copied());
        }

        let target = paths.first().map(|path| (ObjectKind::File, *path));
        self.run_targeting(&args, "Failed to commit", target)?;
        Ok(())
    }

    /// Whether the index differs from HEAD, restricted to `paths` when given
    pub fn has_staged_changes(&self, paths: &[&str]) -> Result<bool> {
        let mut args = vec!["diff", "--cached", "--quiet"];
        if !paths.is_empty() {
            args.push("--");
            args.extend(paths.iter().copied());
        }

        let output = self.output(&args)?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(git_error_from_output(
                &output,
                "Failed to inspect staged changes",
                None,
            )),
        }
    }

    /// A merge stopped with conflicts and was neither committed nor aborted
    pub fn is_merging(&self) -> bool {
        self.git_dir().join("MERGE_HEAD").exists()
    }

    // ===== History =====

    /// `rev-list --parents` for a branch, oldest first, parents before children
    pub fn raw_log_for_branch(&self, name: &str) -> Result<String> {
        if !self.branch_exists(name)? {
            return Err(RepoError::not_found(ObjectKind::Branch, name));
        }
        let refname = format!("refs/heads/{}", name);
        self.run_stdout(
            &["rev-list", "--topo-order", "--reverse", "--parents", &refname],
            &format!("Failed to read history of '{}'", name),
        )
    }

    pub fn commit_ids_for_branch(&self, name: &str) -> Result<Vec<String>> {
        if !self.branch_exists(name)? {
            return Err(RepoError::not_found(ObjectKind::Branch, name));
        }
        let refname = format!("refs/heads/{}", name);
        let raw = self.run_stdout(
            &["rev-list", "--topo-order", "--reverse", &refname],
            &format!("Failed to list commits of '{}'", name),
        )?;
        Ok(raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Raw `diff-tree --name-status -z` between a commit and its parent
    pub fn diff_against_parent(&self, parent: &str, commit: &str) -> Result<String> {
        self.run_stdout(
            &[
                "diff-tree",
                "-r",
                "--no-commit-id",
                "--name-status",
                "-z",
                parent,
                commit,
            ],
            &format!("Failed to diff {}", commit),
        )
    }

    pub fn head_commit_id(&self) -> Result<String> {
        let repo = self.open()?;
        let head = repo
            .head()
            .map_err(|e| RepoError::from_git2(e, ObjectKind::Commit, "HEAD"))?;
        let commit = head
            .peel_to_commit()
            .map_err(|e| RepoError::from_git2(e, ObjectKind::Commit, "HEAD"))?;
        Ok(commit.id().to_string())
    }

    /// Whether `id` (full or abbreviated hex) names a commit
    pub fn commit_exists(&self, id: &str) -> bool {
        if id.len() < 4 || id.len() > 40 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }
        let Ok(repo) = self.open() else {
            return false;
        };

        if id.len() == 40 {
            Oid::from_str(id)
                .and_then(|oid| repo.find_commit(oid))
                .is_ok()
        } else {
            repo.find_commit_by_prefix(id).is_ok()
        }
    }

    /// Raw bytes of `path` as stored in `commit_id`
    pub fn file_content_at(&self, commit_id: &str, path: &str) -> Result<Vec<u8>> {
        if !self.commit_exists(commit_id) {
            return Err(RepoError::not_found(ObjectKind::Commit, commit_id));
        }

        let repo = self.open()?;
        let commit = repo
            .find_commit_by_prefix(commit_id)
            .map_err(|e| RepoError::from_git2(e, ObjectKind::Commit, commit_id))?;
        let tree = commit.tree()?;
        let entry = tree
            .get_path(Path::new(path))
            .map_err(|e| RepoError::from_git2(e, ObjectKind::File, path))?;
        let object = entry.to_object(&repo)?;
        let blob = object
            .peel_to_blob()
            .map_err(|e| RepoError::from_git2(e, ObjectKind::File, path))?;

        Ok(blob.content().to_vec())
    }

    // ===== Tags, reset, merge =====

    /// Create an annotated tag at HEAD
    pub fn create_tag(&self, name: &str) -> Result<()> {
        self.run(
            &["tag", "-a", name, "-m", name],
            &format!("Failed to create tag '{}'", name),
        )?;
        Ok(())
    }

    /// Tag names in creation order
    pub fn list_tag_names(&self) -> Result<Vec<String>> {
        let raw = self.run_stdout(
            &[
                "for-each-ref",
                "--sort=creatordate",
                "--format=%(refname:short)",
                "refs/tags",
            ],
            "Failed to list tags",
        )?;
        Ok(raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn reset_hard_to(&self, commit_id: &str) -> Result<()> {
        self.run_targeting(
            &["reset", "--hard", "--quiet", commit_id],
            &format!("Failed to reset to {}", commit_id),
            Some((ObjectKind::Commit, commit_id)),
        )?;
        Ok(())
    }

    /// Merge `name` into HEAD
    ///
    /// Conflicts are returned as an outcome; the repository is left in the
    /// conflicted state for external resolution.
    pub fn merge_branch_into(&self, name: &str) -> Result<MergeOutcome> {
        // A tag with the same short name would win over the branch
        let refname = format!("refs/heads/{}", name);
        let output = self.output(&["merge", "--no-edit", &refname])?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if output.status.success() {
            if stdout.contains("Already up to date") || stdout.contains("Already up-to-date") {
                return Ok(MergeOutcome::UpToDate);
            }
            if stdout.contains("Fast-forward") {
                return Ok(MergeOutcome::FastForward);
            }
            return Ok(MergeOutcome::Merged);
        }

        if stdout.contains("CONFLICT") || stdout.contains("Automatic merge failed") {
            let files = self.conflicted_files()?;
            return Ok(MergeOutcome::Conflicted { files });
        }

        Err(git_error_from_output(
            &output,
            &format!("Failed to merge '{}'", name),
            Some((ObjectKind::Branch, name)),
        ))
    }

    /// Paths with unresolved merge conflicts
    pub fn conflicted_files(&self) -> Result<Vec<String>> {
        let raw = self.run_stdout(
            &["diff", "--name-only", "--diff-filter=U", "-z"],
            "Failed to list conflicted files",
        )?;
        Ok(raw
            .split('\0')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn abort_merge(&self) -> Result<()> {
        self.run(&["merge", "--abort"], "Failed to abort merge")?;
        Ok(())
    }
}

impl DiffSource for GitAdapter {
    fn name_status(&self, parent: &str, commit: &str) -> Result<String> {
        self.diff_against_parent(parent, commit)
    }
}
