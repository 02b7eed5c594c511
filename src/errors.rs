use std::fmt;
use thiserror::Error;

/// Kind of repository object an operation referred to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Repository,
    Branch,
    Commit,
    File,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Repository => "Repository",
            ObjectKind::Branch => "Branch",
            ObjectKind::Commit => "Commit",
            ObjectKind::File => "File",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: ObjectKind, name: String },

    #[error("Invalid repository state: {0}")]
    InvalidState(String),

    /// A backend primitive failed; carries the captured diagnostic text
    #[error("Backend failure: {0}")]
    Backend(String),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepoError {
    pub fn not_found(kind: ObjectKind, name: impl Into<String>) -> Self {
        RepoError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Map a git2 error onto the taxonomy, using `kind`/`name` when the
    /// library reports a missing object
    pub fn from_git2(err: git2::Error, kind: ObjectKind, name: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::UnbornBranch => {
                RepoError::not_found(kind, name)
            }
            git2::ErrorCode::Ambiguous | git2::ErrorCode::InvalidSpec => {
                RepoError::not_found(kind, name)
            }
            _ => RepoError::Git(err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepoError::NotFound { .. })
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, RepoError::InvalidState(_))
    }
}

pub type Result<T> = std::result::Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = RepoError::not_found(ObjectKind::Branch, "feature");
        assert_eq!(err.to_string(), "Branch 'feature' not found");
        assert!(err.is_not_found());
        assert!(!err.is_invalid_state());
    }

    #[test]
    fn test_git2_not_found_maps_to_taxonomy() {
        let raw = git2::Error::new(
            git2::ErrorCode::NotFound,
            git2::ErrorClass::Odb,
            "object not found",
        );
        let err = RepoError::from_git2(raw, ObjectKind::Commit, "deadbeef");
        match err {
            RepoError::NotFound { kind, name } => {
                assert_eq!(kind, ObjectKind::Commit);
                assert_eq!(name, "deadbeef");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_git2_other_errors_pass_through() {
        let raw = git2::Error::new(
            git2::ErrorCode::Locked,
            git2::ErrorClass::Index,
            "index is locked",
        );
        let err = RepoError::from_git2(raw, ObjectKind::File, "a.txt");
        assert!(matches!(err, RepoError::Git(_)));
    }
}
