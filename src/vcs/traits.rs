/// Repository abstraction - the capability set every backend must provide
use crate::errors::Result;
use crate::vcs::{Commit, FileChange, MergeOutcome};
use std::path::Path;

/// Trait that all repository backends must implement
///
/// Operations that mutate the working tree take `&mut self`; one instance
/// per storage location must not be driven from two places at once.
pub trait Repo {
    /// Root directory holding the working tree
    fn root(&self) -> &Path;

    /// Create an empty repository whose current branch is the default branch
    fn init(&mut self) -> Result<()>;

    /// Switch to `name`, creating it from HEAD if it does not exist
    fn switch_branch(&mut self, name: &str) -> Result<()>;

    /// Delete a branch that exists and is not checked out
    fn remove_branch(&mut self, name: &str) -> Result<()>;

    /// Branch names, default branch first, then in creation order
    fn list_branches(&self) -> Result<Vec<String>>;

    /// Working-tree changes relative to the last commit
    fn uncommitted_files(&self) -> Result<Vec<FileChange>>;

    /// Commit `files` (a subset of `uncommitted_files`, possibly empty)
    ///
    /// Other staged paths stay staged. An empty `files` commits the index as
    /// it stands, and so does committing the resolution of a conflicted merge.
    ///
    /// # Returns
    /// The new commit, listing `files` with their commit id filled in
    fn commit(&mut self, files: &[FileChange], message: &str) -> Result<Commit>;

    /// History of `branch`, oldest first, each commit diffed against its parent
    fn commits(&self, branch: &str) -> Result<Vec<Commit>>;

    /// Text of `path` as stored in `commit_id`
    fn file_contents(&self, commit_id: &str, path: &str) -> Result<String>;

    /// Tag the current HEAD commit
    fn tag_head(&mut self, name: &str) -> Result<()>;

    /// Move the current branch and working tree to `commit_id`
    fn reset(&mut self, commit_id: &str) -> Result<()>;

    /// Merge `branch` into the current branch, reporting how it went
    fn merge_with_outcome(&mut self, branch: &str) -> Result<MergeOutcome>;

    /// Merge `branch` into the current branch
    ///
    /// Conflicts are not errors: they yield `Ok(false)` and leave the
    /// repository mid-merge.
    fn merge(&mut self, branch: &str) -> Result<bool> {
        Ok(self.merge_with_outcome(branch)?.is_success())
    }

    fn current_branch(&self) -> Result<String>;

    /// Never fails; unknown or malformed ids are simply absent
    fn commit_exists(&self, id: &str) -> bool;

    /// Check if the working tree has uncommitted changes
    fn has_uncommitted_changes(&self) -> Result<bool> {
        Ok(!self.uncommitted_files()?.is_empty())
    }
}
