use std::path::PathBuf;

use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Destination already exists.
    #[error("Already exists: {}", .0.display())]
    Conflict(PathBuf),

    /// A directory was expected.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Blank name given to create/rename.
    #[error("Name must not be empty")]
    EmptyInput,

    /// Name that can't be a single path component.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Rename needs exactly one marked entry.
    #[error("Rename needs exactly one marked entry ({0} marked)")]
    SingleMarkRequired(usize),

    /// Copy or move of a directory into its own subtree.
    #[error("Can't place a directory inside itself: {}", .0.display())]
    IntoItself(PathBuf),

    /// Root directory had nothing to show at startup.
    #[error("Can't initialize on empty directory: {}", .0.display())]
    EmptyRoot(PathBuf),

    /// Filesystem notification errors.
    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("file not found"));
    }

    #[test]
    fn terminal_error_display() {
        let err = AppError::Terminal("failed to enter raw mode".into());
        assert_eq!(err.to_string(), "Terminal error: failed to enter raw mode");
    }

    #[test]
    fn conflict_error_display() {
        let err = AppError::Conflict(PathBuf::from("/tmp/a.txt"));
        assert_eq!(err.to_string(), "Already exists: /tmp/a.txt");
    }

    #[test]
    fn single_mark_error_display() {
        let err = AppError::SingleMarkRequired(3);
        assert_eq!(
            err.to_string(),
            "Rename needs exactly one marked entry (3 marked)"
        );
    }

    #[test]
    fn empty_input_display() {
        assert_eq!(AppError::EmptyInput.to_string(), "Name must not be empty");
    }
}
