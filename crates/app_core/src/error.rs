//! Application error types

use app_fs::FsError;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Recoverable Errors (report to the user, continue) =====
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("Cannot operate on the back navigation item")]
    BackEntry,

    #[error("No file name bound to this document")]
    Unnamed,

    #[error("No document is open")]
    NoDocument,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ipc_proto::ProtoError),

    // ===== Fatal Errors (application termination) =====
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Init(String),
}

impl AppError {
    /// Is this error recoverable?
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Fs(_)
                | AppError::BackEntry
                | AppError::Unnamed
                | AppError::NoDocument
                | AppError::Protocol(_)
        )
    }

    /// Is this a fatal error?
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Fs(FsError::NameConflict(path)) => {
                format!("A file or folder with the name '{}' already exists.", path)
            }
            AppError::Fs(FsError::StorageFull { .. }) => {
                "Cannot save file. Storage limit reached.".to_string()
            }
            AppError::Fs(FsError::PathNotFound(path)) => format!("Folder not found: {}", path),
            AppError::Fs(FsError::NotFound(path)) => format!("File not found: {}", path),
            AppError::Fs(FsError::TokenNotFound(token)) => {
                format!("Item '{}' is no longer in the Recycle Bin.", token)
            }
            AppError::Fs(FsError::ReservedName(_)) => {
                "The Recycle Bin folder cannot be modified directly.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_errors_are_recoverable() {
        let err = AppError::from(FsError::StorageFull { required: 11, limit: 10 });
        assert!(err.is_recoverable());
        assert_eq!(err.user_message(), "Cannot save file. Storage limit reached.");
    }

    #[test]
    fn test_init_is_fatal() {
        assert!(AppError::Init("boom".into()).is_fatal());
    }

    #[test]
    fn test_transparent_display() {
        let err = AppError::from(FsError::NotAFile("/D".into()));
        assert_eq!(err.to_string(), "Not a file: /D");
    }
}
