/// Working-tree status classification
///
/// Parses `git status --porcelain=v1 -z` output into entries and maps each
/// entry onto ADD / MODIFY / DELETE. Entries are kept in the order the
/// backend reported them; nothing is merged or re-sorted.
use crate::errors::{RepoError, Result};
use crate::vcs::{Action, FileChange};

/// One raw status token: the two status letters plus the path(s)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Staged (index) status letter
    pub index: char,
    /// Unstaged (working tree) status letter
    pub worktree: char,
    pub path: String,
    /// Source path of a rename or copy
    pub orig_path: Option<String>,
}

impl StatusEntry {
    pub fn is_unmerged(&self) -> bool {
        self.index == 'U'
            || self.worktree == 'U'
            || (self.index == 'A' && self.worktree == 'A')
            || (self.index == 'D' && self.worktree == 'D')
    }
}

/// Parse NUL-separated porcelain v1 status output
pub fn parse_porcelain(raw: &str) -> Result<Vec<StatusEntry>> {
    let mut entries = Vec::new();
    let mut fields = raw.split('\0').filter(|f| !f.is_empty());

    while let Some(field) = fields.next() {
        let mut chars = field.chars();
        let (index, worktree) = match (chars.next(), chars.next(), chars.next()) {
            (Some(x), Some(y), Some(' ')) => (x, y),
            _ => {
                return Err(RepoError::Backend(format!(
                    "Malformed status entry: {:?}",
                    field
                )))
            }
        };

        let path = field.get(3..).unwrap_or_default();
        if path.is_empty() {
            return Err(RepoError::Backend(format!(
                "Status entry without a path: {:?}",
                field
            )));
        }

        // -z puts the rename/copy source in the following field
        let orig_path = if matches!(index, 'R' | 'C') || matches!(worktree, 'R' | 'C') {
            let orig = fields.next().ok_or_else(|| {
                RepoError::Backend(format!("Missing source path for entry: {:?}", field))
            })?;
            Some(orig.to_string())
        } else {
            None
        };

        entries.push(StatusEntry {
            index,
            worktree,
            path: path.to_string(),
            orig_path,
        });
    }

    Ok(entries)
}

/// Map status entries to uncommitted file changes
pub fn classify(entries: &[StatusEntry]) -> Vec<FileChange> {
    let mut changes = Vec::with_capacity(entries.len());

    for entry in entries {
        match (entry.index, entry.worktree) {
            ('!', '!') => {}
            ('?', '?') => changes.push(FileChange::new(&entry.path, Action::Add)),
            _ if entry.is_unmerged() => {
                changes.push(FileChange::new(&entry.path, Action::Modify))
            }
            ('R', y) => {
                if y != 'D' {
                    changes.push(FileChange::new(&entry.path, Action::Add));
                }
                if let Some(orig) = &entry.orig_path {
                    changes.push(FileChange::new(orig, Action::Delete));
                }
            }
            ('C', y) => {
                if y != 'D' {
                    changes.push(FileChange::new(&entry.path, Action::Add));
                }
            }
            // Rename of an intent-to-add file, seen only by the working tree
            (_, 'R') => {
                changes.push(FileChange::new(&entry.path, Action::Add));
                if let Some(orig) = &entry.orig_path {
                    changes.push(FileChange::new(orig, Action::Delete));
                }
            }
            (_, 'C') => changes.push(FileChange::new(&entry.path, Action::Add)),
            // Staged as new, then removed from disk: identical to the last commit
            ('A', 'D') => {}
            ('A', _) => changes.push(FileChange::new(&entry.path, Action::Add)),
            ('D', _) | (_, 'D') => changes.push(FileChange::new(&entry.path, Action::Delete)),
            ('M' | 'T', _) | (_, 'M' | 'T') => {
                changes.push(FileChange::new(&entry.path, Action::Modify))
            }
            _ => {}
        }
    }

    changes
}
