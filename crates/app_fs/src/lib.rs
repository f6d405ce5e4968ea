//! MemFiler In-Memory File System Engine
//!
//! Provides the hierarchical namespace that the desktop applications work on:
//! - Entry: File / Folder tagged variant
//! - VfsPath: Segment paths and the side-effect free resolver
//! - NamespaceTree: Create, rename, move, list and remove entries
//! - QuotaTracker: Storage limit checks and usage reports
//! - RecycleBin: Soft delete with restore and purge
//! - Entry name validation

mod entry;
mod path;
mod tree;
mod quota;
mod recycle_bin;
mod sanitize;

pub use entry::{Entry, EntryKind, FileNode, FolderNode};
pub use path::{resolve, resolve_folder, VfsPath};
pub use tree::{ListEntry, NamespaceTree, RECYCLE_BIN_NAME};
pub use quota::{QuotaTracker, Severity, UsageReport, DEFAULT_LIMIT_BYTES};
pub use recycle_bin::{ConflictPolicy, RecycleBin, RecycledSummary, RestoreOutcome, RESTORED_SUFFIX};
pub use sanitize::{is_valid_name, validate_name, BACK_ENTRY};

use thiserror::Error;

/// File system errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Recycle bin item not found: {0}")]
    TokenNotFound(String),

    #[error("Name already exists: {0}")]
    NameConflict(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Not a folder: {0}")]
    NotAFolder(String),

    #[error("Storage full: {required} bytes required, limit is {limit} bytes")]
    StorageFull { required: u64, limit: u64 },

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Reserved name: {0}")]
    ReservedName(String),

    #[error("Invalid move: {0}")]
    InvalidMove(String),
}

pub type Result<T> = std::result::Result<T, FsError>;
