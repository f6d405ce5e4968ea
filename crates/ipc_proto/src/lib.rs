//! IPC Protocol definitions for Front-end <-> Engine communication
//!
//! This crate defines the request/response records exchanged when the
//! filesystem engine runs behind a process boundary, plus the length-prefixed
//! bincode framing used on the wire.

use app_fs::{ConflictPolicy, EntryKind, FsError, ListEntry, RecycledSummary, UsageReport, VfsPath};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;
use uuid::Uuid;

/// Largest accepted frame: the default quota plus headroom for the envelope
pub const MAX_FRAME_LEN: u32 = 65 * 1024 * 1024;

/// Protocol errors
#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(u32),

    /// A complete frame was read but its payload does not decode; the
    /// stream is still aligned on the next frame
    #[error("Malformed frame ({len} bytes): {source}")]
    Malformed {
        len: u32,
        #[source]
        source: bincode::Error,
    },
}

pub type Result<T> = std::result::Result<T, ProtoError>;

/// Requests sent from a front-end to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    /// List a folder
    List { path: VfsPath },

    /// Resolve a path for navigation
    Resolve { path: VfsPath },

    /// Read a file's content
    ReadFile { path: VfsPath, name: String },

    /// Save from the editor
    Save {
        path: VfsPath,
        name: String,
        content: Vec<u8>,
        is_new_file: bool,
    },

    /// Create a file from the browser
    CreateFile { path: VfsPath, name: String, content: Vec<u8> },

    /// Create an empty folder
    CreateFolder { path: VfsPath, name: String },

    /// Rename within a folder
    Rename { path: VfsPath, old_name: String, new_name: String },

    /// Move into another folder
    Move { from: VfsPath, name: String, to: VfsPath },

    /// Move to the recycle bin
    Delete { path: VfsPath, name: String },

    /// Restore from the recycle bin
    Restore { token: String, on_conflict: ConflictPolicy },

    /// Permanently delete one recycled item
    Purge { token: String },

    /// Permanently delete every recycled item
    EmptyBin,

    /// Recycle bin contents
    ListBin,

    /// Storage usage
    Usage,

    /// Health check
    Ping,

    /// Graceful shutdown
    Shutdown,
}

/// Responses sent from the engine back to a front-end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    /// Folder contents, sorted by name
    Listing { entries: Vec<ListEntry> },

    /// Kind of the resolved entry
    Resolved { kind: EntryKind },

    /// File content
    Content { content: Vec<u8> },

    /// Mutation applied
    Done,

    /// Item moved to the recycle bin
    Deleted { token: String },

    /// Item restored
    Restored {
        final_name: String,
        path: VfsPath,
        fell_back_to_root: bool,
    },

    /// Recycle bin emptied
    Emptied { count: usize },

    /// Recycle bin contents
    BinListing { items: Vec<RecycledSummary> },

    /// Storage usage
    Usage { report: UsageReport },

    /// Pong response to Ping
    Pong,

    /// Engine is shutting down
    Bye,

    /// Error occurred
    Error { code: ErrorCode, message: String },
}

impl Response {
    /// Build an error response from an engine error
    pub fn from_error(err: &FsError) -> Self {
        Response::Error {
            code: ErrorCode::from(err),
            message: err.to_string(),
        }
    }

    /// Build the reply to a frame that could not be decoded
    pub fn protocol_error(err: &ProtoError) -> Self {
        Response::Error {
            code: ErrorCode::Protocol,
            message: err.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }
}

/// Error codes for IPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    PathNotFound,
    NotFound,
    NameConflict,
    NotAFile,
    NotAFolder,
    StorageFull,
    InvalidName,
    ReservedName,
    InvalidMove,
    Protocol,
}

impl From<&FsError> for ErrorCode {
    fn from(err: &FsError) -> Self {
        match err {
            FsError::PathNotFound(_) => ErrorCode::PathNotFound,
            FsError::NotFound(_) | FsError::TokenNotFound(_) => ErrorCode::NotFound,
            FsError::NameConflict(_) => ErrorCode::NameConflict,
            FsError::NotAFile(_) => ErrorCode::NotAFile,
            FsError::NotAFolder(_) => ErrorCode::NotAFolder,
            FsError::StorageFull { .. } => ErrorCode::StorageFull,
            FsError::InvalidName(_) => ErrorCode::InvalidName,
            FsError::ReservedName(_) => ErrorCode::ReservedName,
            FsError::InvalidMove(_) => ErrorCode::InvalidMove,
        }
    }
}

/// A message with its correlation id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub id: Uuid,
    pub body: T,
}

impl<T> Envelope<T> {
    /// Wrap a body under a fresh id
    pub fn new(body: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            body,
        }
    }

    /// Wrap a body under the nil id, for replies to unreadable requests
    pub fn unaddressed(body: T) -> Self {
        Self { id: Uuid::nil(), body }
    }

    /// Wrap a reply under the id of the message it answers
    pub fn reply_to<U>(&self, body: U) -> Envelope<U> {
        Envelope { id: self.id, body }
    }
}

/// Write one length-prefixed bincode frame
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<()> {
    let payload = bincode::serialize(message)?;
    let len = u32::try_from(payload.len()).map_err(|_| ProtoError::FrameTooLarge(u32::MAX))?;
    if len > MAX_FRAME_LEN {
        return Err(ProtoError::FrameTooLarge(len));
    }

    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one length-prefixed bincode frame; `Ok(None)` on clean end of stream
pub fn read_frame<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> Result<Option<T>> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_bytes);
    if len > MAX_FRAME_LEN {
        return Err(ProtoError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    bincode::deserialize(&payload)
        .map(Some)
        .map_err(|source| ProtoError::Malformed { len, source })
}
