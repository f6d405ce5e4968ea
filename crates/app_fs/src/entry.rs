//! Namespace entries: files with opaque byte content and folders of named children

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of an entry, as shown by the explorer (`[F]` / `[D]`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    #[serde(rename = "file")]
    File,
    #[serde(rename = "folder")]
    Folder,
}

impl EntryKind {
    /// Explorer marker for this kind
    pub fn marker(&self) -> &'static str {
        match self {
            EntryKind::File => "[F]",
            EntryKind::Folder => "[D]",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Folder => write!(f, "folder"),
        }
    }
}

/// File payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub content: Vec<u8>,
}

impl FileNode {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Folder with children keyed by exact, case-sensitive name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    pub children: BTreeMap<String, Entry>,
}

impl FolderNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.children.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.children.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Recursive byte total of every file below this folder
    pub fn size(&self) -> u64 {
        self.children.values().map(Entry::size).sum()
    }
}

/// A node in the namespace
///
/// Entries are plain values: cloning one yields a structural deep copy that
/// shares nothing with the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entry {
    File(FileNode),
    Folder(FolderNode),
}

impl Entry {
    /// Create a file entry
    pub fn file(content: impl Into<Vec<u8>>) -> Self {
        Entry::File(FileNode::new(content))
    }

    /// Create an empty folder entry
    pub fn folder() -> Self {
        Entry::Folder(FolderNode::new())
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::File(_) => EntryKind::File,
            Entry::Folder(_) => EntryKind::Folder,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Entry::File(_))
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Entry::Folder(_))
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            Entry::File(file) => Some(file),
            Entry::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&FolderNode> {
        match self {
            Entry::Folder(folder) => Some(folder),
            Entry::File(_) => None,
        }
    }

    pub fn as_folder_mut(&mut self) -> Option<&mut FolderNode> {
        match self {
            Entry::Folder(folder) => Some(folder),
            Entry::File(_) => None,
        }
    }

    /// Byte length for files, recursive total for folders. Not cached.
    pub fn size(&self) -> u64 {
        match self {
            Entry::File(file) => file.size(),
            Entry::Folder(folder) => folder.size(),
        }
    }

    /// Number of entries in this subtree, including itself
    pub fn count(&self) -> usize {
        match self {
            Entry::File(_) => 1,
            Entry::Folder(folder) => 1 + folder.children.values().map(Entry::count).sum::<usize>(),
        }
    }
}
