//! Namespace tree - the hierarchical store of folders and files
//!
//! All mutating operations take the path of the parent folder plus a target
//! name. The root owns one hidden folder, [`RECYCLE_BIN_NAME`], that holds
//! recycled payloads; it is skipped when listing the root and can only be
//! mutated through [`crate::RecycleBin`].

use crate::path::resolve_folder_mut;
use crate::{resolve, sanitize, Entry, EntryKind, FolderNode, FsError, Result, VfsPath};
use serde::{Deserialize, Serialize};

/// Reserved name of the hidden recycle bin folder under the root
pub const RECYCLE_BIN_NAME: &str = ".recyclebin";

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
}

/// In-memory namespace rooted at a folder that is never deleted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceTree {
    root: Entry,
}

impl NamespaceTree {
    /// Create an empty namespace (root plus the hidden recycle bin folder)
    pub fn new() -> Self {
        Self::from_folder(FolderNode::new())
    }

    /// Create a namespace from prepared root contents
    ///
    /// The recycle bin folder always starts empty: payloads without a bin
    /// record could never be listed, restored or purged.
    pub fn from_folder(mut root: FolderNode) -> Self {
        if let Some(stale) = root.children.insert(RECYCLE_BIN_NAME.to_string(), Entry::folder()) {
            if stale.count() > 1 || stale.is_file() {
                tracing::warn!("Discarding {} bytes of unrecorded recycle bin content", stale.size());
            }
        }
        Self {
            root: Entry::Folder(root),
        }
    }

    /// The root entry (always a folder)
    pub fn root(&self) -> &Entry {
        &self.root
    }

    /// Resolve a path to an entry
    pub fn resolve(&self, path: &VfsPath) -> Option<&Entry> {
        resolve(&self.root, path)
    }

    /// Kind of the entry at `path`
    pub fn kind_at(&self, path: &VfsPath) -> Result<EntryKind> {
        self.resolve(path)
            .map(Entry::kind)
            .ok_or_else(|| FsError::PathNotFound(path.to_string()))
    }

    /// List a folder, sorted by name
    pub fn list(&self, path: &VfsPath) -> Result<Vec<ListEntry>> {
        let folder = self.folder(path)?;
        Ok(folder
            .children
            .iter()
            .filter(|(name, _)| !(path.is_root() && name.as_str() == RECYCLE_BIN_NAME))
            .map(|(name, entry)| ListEntry {
                name: name.clone(),
                kind: entry.kind(),
                size: entry.size(),
            })
            .collect())
    }

    /// Get an entry in a folder
    pub fn get(&self, path: &VfsPath, name: &str) -> Result<&Entry> {
        self.folder(path)?
            .get(name)
            .ok_or_else(|| FsError::NotFound(path.join(name).to_string()))
    }

    /// Does `name` exist in the folder at `path`?
    pub fn contains(&self, path: &VfsPath, name: &str) -> Result<bool> {
        Ok(self.folder(path)?.contains(name))
    }

    /// Create a new file; an existing name is a conflict
    pub fn create_file(&mut self, path: &VfsPath, name: &str, content: impl Into<Vec<u8>>) -> Result<()> {
        self.insert(path, name, Entry::file(content))
    }

    /// Create a new empty folder; an existing name is a conflict
    pub fn create_folder(&mut self, path: &VfsPath, name: &str) -> Result<()> {
        self.insert(path, name, Entry::folder())
    }

    /// Read a file's content
    pub fn read_file(&self, path: &VfsPath, name: &str) -> Result<&[u8]> {
        match self.get(path, name)? {
            Entry::File(file) => Ok(&file.content),
            Entry::Folder(_) => Err(FsError::NotAFile(path.join(name).to_string())),
        }
    }

    /// Create or overwrite a file
    pub fn write_file(&mut self, path: &VfsPath, name: &str, content: impl Into<Vec<u8>>) -> Result<()> {
        Self::check_name(path, name)?;
        let folder = self.folder_mut(path)?;

        match folder.get_mut(name) {
            Some(Entry::File(file)) => {
                file.content = content.into();
            }
            Some(Entry::Folder(_)) => {
                return Err(FsError::NotAFile(path.join(name).to_string()));
            }
            None => {
                folder.children.insert(name.to_string(), Entry::file(content));
            }
        }
        Ok(())
    }

    /// Rename an entry in place, keeping its subtree
    pub fn rename(&mut self, path: &VfsPath, old_name: &str, new_name: &str) -> Result<()> {
        Self::check_name(path, old_name)?;
        Self::check_name(path, new_name)?;
        let folder = self.folder_mut(path)?;

        if !folder.contains(old_name) {
            return Err(FsError::NotFound(path.join(old_name).to_string()));
        }
        if old_name == new_name {
            return Ok(());
        }
        if folder.contains(new_name) {
            return Err(FsError::NameConflict(path.join(new_name).to_string()));
        }

        if let Some(entry) = folder.children.remove(old_name) {
            folder.children.insert(new_name.to_string(), entry);
        }
        Ok(())
    }

    /// Detach an entry and hand its subtree to the caller
    pub fn remove(&mut self, path: &VfsPath, name: &str) -> Result<Entry> {
        Self::check_name(path, name)?;
        self.folder_mut(path)?
            .children
            .remove(name)
            .ok_or_else(|| FsError::NotFound(path.join(name).to_string()))
    }

    /// Attach an entry under `name`; an occupied name is a conflict
    pub fn insert(&mut self, path: &VfsPath, name: &str, entry: Entry) -> Result<()> {
        Self::check_name(path, name)?;
        let folder = self.folder_mut(path)?;

        if folder.contains(name) {
            return Err(FsError::NameConflict(path.join(name).to_string()));
        }
        folder.children.insert(name.to_string(), entry);
        Ok(())
    }

    /// Move an entry into another folder under the same name
    pub fn move_entry(&mut self, from: &VfsPath, name: &str, to: &VfsPath) -> Result<()> {
        Self::check_name(from, name)?;
        Self::check_path(to)?;

        let source = self.get(from, name)?;
        let target = self.folder(to)?;

        if from == to {
            return Ok(());
        }
        if source.is_folder() && to.starts_with(&from.join(name)) {
            return Err(FsError::InvalidMove(format!(
                "cannot move {} into itself",
                from.join(name)
            )));
        }
        if target.contains(name) {
            return Err(FsError::NameConflict(to.join(name).to_string()));
        }

        let entry = self.remove(from, name)?;
        self.insert(to, name, entry)
    }

    /// Total bytes of every file reachable from the root, recycle bin included
    pub fn total_size(&self) -> u64 {
        self.root.size()
    }

    /// Number of entries below the root (recycle bin folder included)
    pub fn entry_count(&self) -> usize {
        self.root.count() - 1
    }

    pub(crate) fn recycle_folder(&self) -> &FolderNode {
        self.root
            .as_folder()
            .and_then(|root| root.get(RECYCLE_BIN_NAME))
            .and_then(Entry::as_folder)
            .unwrap_or_else(|| unreachable!("recycle bin folder is created with the tree"))
    }

    pub(crate) fn recycle_folder_mut(&mut self) -> &mut FolderNode {
        self.root
            .as_folder_mut()
            .and_then(|root| root.get_mut(RECYCLE_BIN_NAME))
            .and_then(Entry::as_folder_mut)
            .unwrap_or_else(|| unreachable!("recycle bin folder is created with the tree"))
    }

    fn folder(&self, path: &VfsPath) -> Result<&FolderNode> {
        crate::resolve_folder(&self.root, path).ok_or_else(|| FsError::PathNotFound(path.to_string()))
    }

    fn folder_mut(&mut self, path: &VfsPath) -> Result<&mut FolderNode> {
        resolve_folder_mut(&mut self.root, path).ok_or_else(|| FsError::PathNotFound(path.to_string()))
    }

    /// Reject mutations inside the recycle bin folder
    fn check_path(path: &VfsPath) -> Result<()> {
        if path.first() == Some(RECYCLE_BIN_NAME) {
            return Err(FsError::ReservedName(RECYCLE_BIN_NAME.to_string()));
        }
        Ok(())
    }

    fn check_name(path: &VfsPath, name: &str) -> Result<()> {
        Self::check_path(path)?;
        if path.is_root() && name == RECYCLE_BIN_NAME {
            return Err(FsError::ReservedName(name.to_string()));
        }
        sanitize::validate_name(name)
    }
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> VfsPath {
        VfsPath::root()
    }

    #[test]
    fn test_new_tree_has_hidden_recycle_folder() {
        let tree = NamespaceTree::new();
        assert!(tree.list(&root()).unwrap().is_empty());
        assert_eq!(tree.kind_at(&VfsPath::parse(RECYCLE_BIN_NAME)).unwrap(), EntryKind::Folder);
        assert_eq!(tree.total_size(), 0);
    }

    #[test]
    fn test_from_folder_starts_with_empty_recycle_folder() {
        let mut bin = FolderNode::new();
        bin.children.insert("orphan_DELETED_20240501123000".to_string(), Entry::file("lost"));
        let mut root = FolderNode::new();
        root.children.insert(RECYCLE_BIN_NAME.to_string(), Entry::Folder(bin));
        root.children.insert("keep.txt".to_string(), Entry::file("kept"));

        let tree = NamespaceTree::from_folder(root);
        assert!(tree.recycle_folder().is_empty());
        assert_eq!(tree.total_size(), 4);
        assert_eq!(tree.entry_count(), 2);
    }

    #[test]
    fn test_create_and_list_sorted() {
        let mut tree = NamespaceTree::new();
        tree.create_folder(&root(), "b").unwrap();
        tree.create_file(&root(), "a.txt", "12345").unwrap();
        tree.create_folder(&root(), "C").unwrap();

        let names: Vec<_> = tree.list(&root()).unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["C", "a.txt", "b"]);
    }

    #[test]
    fn test_create_folder_twice_conflicts() {
        let mut tree = NamespaceTree::new();
        tree.create_folder(&root(), "X").unwrap();
        let before = tree.clone();

        let err = tree.create_folder(&root(), "X").unwrap_err();
        assert!(matches!(err, FsError::NameConflict(_)));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut tree = NamespaceTree::new();
        tree.create_file(&root(), "a.txt", "x").unwrap();
        tree.create_file(&root(), "A.txt", "y").unwrap();
        assert_eq!(tree.list(&root()).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_parent_is_path_not_found() {
        let mut tree = NamespaceTree::new();
        let missing = VfsPath::parse("/nope");
        assert!(matches!(tree.list(&missing), Err(FsError::PathNotFound(_))));
        assert!(matches!(tree.create_file(&missing, "a", "x"), Err(FsError::PathNotFound(_))));

        tree.create_file(&root(), "f", "x").unwrap();
        assert!(matches!(tree.list(&VfsPath::parse("/f")), Err(FsError::PathNotFound(_))));
    }

    #[test]
    fn test_read_and_write_file() {
        let mut tree = NamespaceTree::new();
        tree.write_file(&root(), "a.txt", "first").unwrap();
        tree.write_file(&root(), "a.txt", "second!").unwrap();
        assert_eq!(tree.read_file(&root(), "a.txt").unwrap(), b"second!");

        tree.create_folder(&root(), "D").unwrap();
        assert!(matches!(tree.read_file(&root(), "D"), Err(FsError::NotAFile(_))));
        assert!(matches!(tree.write_file(&root(), "D", "x"), Err(FsError::NotAFile(_))));
        assert!(matches!(tree.read_file(&root(), "zzz"), Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_rename_keeps_subtree() {
        let mut tree = NamespaceTree::new();
        tree.create_folder(&root(), "D").unwrap();
        tree.create_file(&VfsPath::parse("/D"), "n.txt", "nested").unwrap();

        tree.rename(&root(), "D", "E").unwrap();
        assert_eq!(tree.read_file(&VfsPath::parse("/E"), "n.txt").unwrap(), b"nested");
        assert!(tree.resolve(&VfsPath::parse("/D")).is_none());
    }

    #[test]
    fn test_rename_errors() {
        let mut tree = NamespaceTree::new();
        tree.create_file(&root(), "a", "1").unwrap();
        tree.create_file(&root(), "b", "2").unwrap();

        assert!(matches!(tree.rename(&root(), "a", "b"), Err(FsError::NameConflict(_))));
        assert!(matches!(tree.rename(&root(), "zzz", "c"), Err(FsError::NotFound(_))));
        assert!(tree.rename(&root(), "a", "a").is_ok());
        assert!(matches!(tree.rename(&root(), "a", ".."), Err(FsError::InvalidName(_))));
    }

    #[test]
    fn test_remove_and_insert() {
        let mut tree = NamespaceTree::new();
        tree.create_file(&root(), "a.txt", "abc").unwrap();

        let entry = tree.remove(&root(), "a.txt").unwrap();
        assert_eq!(entry, Entry::file("abc"));
        assert!(matches!(tree.remove(&root(), "a.txt"), Err(FsError::NotFound(_))));

        tree.insert(&root(), "a.txt", entry.clone()).unwrap();
        assert!(matches!(tree.insert(&root(), "a.txt", entry), Err(FsError::NameConflict(_))));
    }

    #[test]
    fn test_recycle_folder_is_protected() {
        let mut tree = NamespaceTree::new();
        let bin = VfsPath::parse(RECYCLE_BIN_NAME);

        assert!(matches!(tree.remove(&root(), RECYCLE_BIN_NAME), Err(FsError::ReservedName(_))));
        assert!(matches!(tree.create_folder(&root(), RECYCLE_BIN_NAME), Err(FsError::ReservedName(_))));
        assert!(matches!(tree.create_file(&bin, "x", "y"), Err(FsError::ReservedName(_))));
        assert!(tree.list(&bin).unwrap().is_empty());
    }

    #[test]
    fn test_move_entry() {
        let mut tree = NamespaceTree::new();
        tree.create_folder(&root(), "src").unwrap();
        tree.create_folder(&root(), "dst").unwrap();
        tree.create_file(&VfsPath::parse("/src"), "a.txt", "abc").unwrap();

        tree.move_entry(&VfsPath::parse("/src"), "a.txt", &VfsPath::parse("/dst")).unwrap();
        assert_eq!(tree.read_file(&VfsPath::parse("/dst"), "a.txt").unwrap(), b"abc");
        assert!(tree.list(&VfsPath::parse("/src")).unwrap().is_empty());
    }

    #[test]
    fn test_move_folder_into_itself_fails() {
        let mut tree = NamespaceTree::new();
        tree.create_folder(&root(), "D").unwrap();
        tree.create_folder(&VfsPath::parse("/D"), "inner").unwrap();

        let err = tree.move_entry(&root(), "D", &VfsPath::parse("/D/inner")).unwrap_err();
        assert!(matches!(err, FsError::InvalidMove(_)));
        let err = tree.move_entry(&root(), "D", &VfsPath::parse("/D")).unwrap_err();
        assert!(matches!(err, FsError::InvalidMove(_)));
    }

    #[test]
    fn test_move_conflict() {
        let mut tree = NamespaceTree::new();
        tree.create_folder(&root(), "dst").unwrap();
        tree.create_file(&root(), "a", "1").unwrap();
        tree.create_file(&VfsPath::parse("/dst"), "a", "2").unwrap();

        let err = tree.move_entry(&root(), "a", &VfsPath::parse("/dst")).unwrap_err();
        assert!(matches!(err, FsError::NameConflict(_)));
        assert_eq!(tree.read_file(&root(), "a").unwrap(), b"1");
    }

    #[test]
    fn test_total_size() {
        let mut tree = NamespaceTree::new();
        tree.create_file(&root(), "a.txt", "12345").unwrap();
        tree.create_folder(&root(), "D").unwrap();
        tree.create_file(&VfsPath::parse("/D"), "n.txt", "123").unwrap();
        assert_eq!(tree.total_size(), 8);
        assert_eq!(tree.entry_count(), 4);
    }
}
