//! VfsPath - Segment paths from the namespace root, and the resolver

use crate::{Entry, FolderNode};
use serde::{Deserialize, Serialize};

/// An ordered sequence of names from the root (exclusive) to a target entry
///
/// Features:
/// - Empty sequence denotes the root
/// - Parses slash-separated strings, ignoring empty segments
/// - Renders as `/a/b` for the UI (`/` for the root)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VfsPath {
    segments: Vec<String>,
}

impl VfsPath {
    /// The root path
    pub fn root() -> Self {
        Self::default()
    }

    /// Create from owned segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a slash-separated path such as `/Documents/notes`
    pub fn parse(path: &str) -> Self {
        Self::new(path.split('/').filter(|s| !s.is_empty()))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Last segment, `None` for the root
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Parent path, `None` for the root
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Join with one more segment
    pub fn join(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self { segments }
    }

    /// Append a segment in place
    pub fn push(&mut self, name: impl Into<String>) {
        self.segments.push(name.into());
    }

    /// Remove the last segment in place
    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    /// Is `prefix` an ancestor of (or equal to) this path?
    pub fn starts_with(&self, prefix: &VfsPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// First segment, used to detect paths inside the recycle bin container
    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }
}

impl From<&str> for VfsPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for VfsPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<Vec<String>> for VfsPath {
    fn from(segments: Vec<String>) -> Self {
        Self { segments }
    }
}

impl std::fmt::Display for VfsPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

/// Resolve a path against a root entry
///
/// Total and side-effect free: a missing segment or a file in the middle of
/// the path yields `None`.
pub fn resolve<'a>(root: &'a Entry, path: &VfsPath) -> Option<&'a Entry> {
    path.segments()
        .iter()
        .try_fold(root, |current, segment| current.as_folder()?.get(segment))
}

/// Resolve a path that must end on a folder
pub fn resolve_folder<'a>(root: &'a Entry, path: &VfsPath) -> Option<&'a FolderNode> {
    resolve(root, path)?.as_folder()
}

pub(crate) fn resolve_folder_mut<'a>(root: &'a mut Entry, path: &VfsPath) -> Option<&'a mut FolderNode> {
    let mut current = root;
    for segment in path.segments() {
        current = current.as_folder_mut()?.get_mut(segment)?;
    }
    current.as_folder_mut()
}
