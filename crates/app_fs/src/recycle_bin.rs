//! Recycle bin - soft delete with restore and permanent purge
//!
//! Deleted subtrees are detached from the live tree and parked under the
//! hidden recycle bin folder, keyed by token, so they keep counting toward the
//! quota until purged. The bin keeps the metadata needed to put them back.

use crate::{Entry, EntryKind, FsError, NamespaceTree, Result, VfsPath, RECYCLE_BIN_NAME};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Suffix appended to a restored entry's name when the original is taken
pub const RESTORED_SUFFIX: &str = "_restored";

const TOKEN_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// What to do when a restored name collides with an existing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictPolicy {
    /// Leave the item in the bin and report the conflict
    #[serde(rename = "abort")]
    Abort,
    /// Restore under `<name>_restored`
    #[serde(rename = "rename")]
    Rename,
}

/// Recycle bin listing row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecycledSummary {
    pub token: String,
    pub original_name: String,
    pub original_path: VfsPath,
    pub kind: EntryKind,
    pub size: u64,
    pub deleted_at: DateTime<Local>,
}

/// Result of a successful restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreOutcome {
    /// Name the entry was restored under
    pub final_name: String,
    /// Folder the entry was restored into
    pub path: VfsPath,
    /// The original folder no longer existed and the root was used instead
    pub fell_back_to_root: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RecycleRecord {
    original_name: String,
    original_path: VfsPath,
    kind: EntryKind,
    deleted_at: DateTime<Local>,
}

/// Soft-delete store keyed by unique tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecycleBin {
    records: BTreeMap<String, RecycleRecord>,
}

impl RecycleBin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.records.contains_key(token)
    }

    /// Move `name` from the folder at `path` into the bin, returning its token
    pub fn delete(&mut self, tree: &mut NamespaceTree, path: &VfsPath, name: &str) -> Result<String> {
        self.delete_at(tree, path, name, Local::now())
    }

    fn delete_at(
        &mut self,
        tree: &mut NamespaceTree,
        path: &VfsPath,
        name: &str,
        deleted_at: DateTime<Local>,
    ) -> Result<String> {
        let entry = tree.remove(path, name)?;
        let token = self.unique_token(tree, name, &deleted_at);

        self.records.insert(
            token.clone(),
            RecycleRecord {
                original_name: name.to_string(),
                original_path: path.clone(),
                kind: entry.kind(),
                deleted_at,
            },
        );
        tree.recycle_folder_mut().children.insert(token.clone(), entry);

        tracing::info!("Moved to recycle bin: {} (token {})", path.join(name), token);
        Ok(token)
    }

    /// Put a recycled entry back where it came from
    ///
    /// If the original folder is gone the entry goes to the root instead. A
    /// name collision is resolved according to `policy`.
    pub fn restore(
        &mut self,
        tree: &mut NamespaceTree,
        token: &str,
        policy: ConflictPolicy,
    ) -> Result<RestoreOutcome> {
        let record = self
            .records
            .get_mut(token)
            .ok_or_else(|| FsError::TokenNotFound(token.to_string()))?;

        let original_exists = record.original_path.first() != Some(RECYCLE_BIN_NAME)
            && tree.resolve(&record.original_path).is_some_and(Entry::is_folder);

        let fell_back_to_root = !original_exists;
        if fell_back_to_root {
            tracing::warn!(
                "Original path {} for '{}' not found, restoring to root",
                record.original_path,
                record.original_name
            );
            record.original_path = VfsPath::root();
        }

        let target = record.original_path.clone();
        let final_name = Self::resolve_name(tree, &target, &record.original_name, policy)?;

        let payload = tree
            .recycle_folder_mut()
            .children
            .remove(token)
            .ok_or_else(|| FsError::TokenNotFound(token.to_string()))?;

        if let Err(e) = tree.insert(&target, &final_name, payload.clone()) {
            tree.recycle_folder_mut().children.insert(token.to_string(), payload);
            return Err(e);
        }
        self.records.remove(token);

        tracing::info!("Restored '{}' to {}", final_name, target);
        Ok(RestoreOutcome {
            final_name,
            path: target,
            fell_back_to_root,
        })
    }

    /// Permanently discard one item
    pub fn purge(&mut self, tree: &mut NamespaceTree, token: &str) -> Result<()> {
        let record = self
            .records
            .remove(token)
            .ok_or_else(|| FsError::TokenNotFound(token.to_string()))?;
        tree.recycle_folder_mut().children.remove(token);

        tracing::warn!("Permanently deleted: {} (token {})", record.original_name, token);
        Ok(())
    }

    /// Permanently discard everything, returning how many items were dropped
    pub fn empty_all(&mut self, tree: &mut NamespaceTree) -> usize {
        let count = self.records.len();
        self.records.clear();
        tree.recycle_folder_mut().children.clear();

        if count > 0 {
            tracing::warn!("Recycle bin emptied ({} items)", count);
        }
        count
    }

    /// Bin contents ordered by deletion time, then token
    pub fn list(&self, tree: &NamespaceTree) -> Vec<RecycledSummary> {
        let container = tree.recycle_folder();
        let mut items: Vec<RecycledSummary> = self
            .records
            .iter()
            .map(|(token, record)| RecycledSummary {
                token: token.clone(),
                original_name: record.original_name.clone(),
                original_path: record.original_path.clone(),
                kind: record.kind,
                size: container.get(token).map(Entry::size).unwrap_or(0),
                deleted_at: record.deleted_at,
            })
            .collect();

        items.sort_by(|a, b| a.deleted_at.cmp(&b.deleted_at).then_with(|| a.token.cmp(&b.token)));
        items
    }

    /// The recycled snapshot stored under `token`
    pub fn payload<'a>(&self, tree: &'a NamespaceTree, token: &str) -> Option<&'a Entry> {
        if !self.contains(token) {
            return None;
        }
        tree.recycle_folder().get(token)
    }

    fn resolve_name(
        tree: &NamespaceTree,
        target: &VfsPath,
        original_name: &str,
        policy: ConflictPolicy,
    ) -> Result<String> {
        if !tree.contains(target, original_name)? {
            return Ok(original_name.to_string());
        }

        match policy {
            ConflictPolicy::Abort => Err(FsError::NameConflict(target.join(original_name).to_string())),
            ConflictPolicy::Rename => {
                let renamed = format!("{}{}", original_name, RESTORED_SUFFIX);
                if tree.contains(target, &renamed)? {
                    return Err(FsError::NameConflict(target.join(renamed).to_string()));
                }
                Ok(renamed)
            }
        }
    }

    /// `<name>_DELETED_<timestamp>`, with a numeric suffix on collision
    fn unique_token(&self, tree: &NamespaceTree, name: &str, deleted_at: &DateTime<Local>) -> String {
        let base = format!("{}_DELETED_{}", name, deleted_at.format(TOKEN_TIME_FORMAT));
        let container = tree.recycle_folder();
        let taken = |token: &str| self.records.contains_key(token) || container.contains(token);

        if !taken(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| !taken(candidate))
            .unwrap_or(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn root() -> VfsPath {
        VfsPath::root()
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    fn sample_tree() -> NamespaceTree {
        let mut tree = NamespaceTree::new();
        tree.create_file(&root(), "a.txt", "hello").unwrap();
        tree.create_folder(&root(), "D").unwrap();
        tree.create_file(&VfsPath::parse("/D"), "n.txt", "nested").unwrap();
        tree
    }

    #[test]
    fn test_delete_and_restore_file() {
        let mut tree = sample_tree();
        let mut bin = RecycleBin::new();

        let token = bin.delete(&mut tree, &root(), "a.txt").unwrap();
        assert!(tree.resolve(&VfsPath::parse("/a.txt")).is_none());

        let items = bin.list(&tree);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].original_name, "a.txt");
        assert_eq!(items[0].size, 5);

        let outcome = bin.restore(&mut tree, &token, ConflictPolicy::Abort).unwrap();
        assert_eq!(outcome.final_name, "a.txt");
        assert!(!outcome.fell_back_to_root);
        assert_eq!(tree.read_file(&root(), "a.txt").unwrap(), b"hello");
        assert!(bin.is_empty());
    }

    #[test]
    fn test_recycled_items_count_toward_size() {
        let mut tree = sample_tree();
        let mut bin = RecycleBin::new();
        let before = tree.total_size();

        let token = bin.delete(&mut tree, &root(), "D").unwrap();
        assert_eq!(tree.total_size(), before);

        bin.purge(&mut tree, &token).unwrap();
        assert_eq!(tree.total_size(), before - 6);
    }

    #[test]
    fn test_folder_snapshot_keeps_subtree() {
        let mut tree = sample_tree();
        let mut bin = RecycleBin::new();
        let original = tree.get(&root(), "D").unwrap().clone();

        let token = bin.delete(&mut tree, &root(), "D").unwrap();
        let payload = bin.payload(&tree, &token).unwrap();
        assert_eq!(payload.as_folder().unwrap().get("n.txt"), Some(&Entry::file("nested")));

        // A new live folder with the same name does not touch the snapshot
        tree.create_folder(&root(), "D").unwrap();
        tree.create_file(&VfsPath::parse("/D"), "other", "x").unwrap();
        assert_eq!(bin.payload(&tree, &token), Some(&original));
    }

    #[test]
    fn test_restore_missing_path_falls_back_to_root() {
        let mut tree = sample_tree();
        let mut bin = RecycleBin::new();

        let token = bin.delete(&mut tree, &VfsPath::parse("/D"), "n.txt").unwrap();
        bin.delete(&mut tree, &root(), "D").unwrap();

        let outcome = bin.restore(&mut tree, &token, ConflictPolicy::Abort).unwrap();
        assert!(outcome.fell_back_to_root);
        assert_eq!(outcome.path, root());
        assert_eq!(tree.read_file(&root(), "n.txt").unwrap(), b"nested");
    }

    #[test]
    fn test_restore_conflict_abort_keeps_item() {
        let mut tree = sample_tree();
        let mut bin = RecycleBin::new();

        let token = bin.delete(&mut tree, &root(), "a.txt").unwrap();
        tree.create_file(&root(), "a.txt", "new").unwrap();

        let err = bin.restore(&mut tree, &token, ConflictPolicy::Abort).unwrap_err();
        assert!(matches!(err, FsError::NameConflict(_)));
        assert!(bin.contains(&token));
        assert_eq!(tree.read_file(&root(), "a.txt").unwrap(), b"new");
    }

    #[test]
    fn test_restore_conflict_rename() {
        let mut tree = sample_tree();
        let mut bin = RecycleBin::new();

        let token = bin.delete(&mut tree, &root(), "a.txt").unwrap();
        tree.create_file(&root(), "a.txt", "new").unwrap();

        let outcome = bin.restore(&mut tree, &token, ConflictPolicy::Rename).unwrap();
        assert_eq!(outcome.final_name, "a.txt_restored");
        assert_eq!(tree.read_file(&root(), "a.txt_restored").unwrap(), b"hello");
        assert_eq!(tree.read_file(&root(), "a.txt").unwrap(), b"new");
    }

    #[test]
    fn test_restore_rename_target_also_taken() {
        let mut tree = sample_tree();
        let mut bin = RecycleBin::new();

        let token = bin.delete(&mut tree, &root(), "a.txt").unwrap();
        tree.create_file(&root(), "a.txt", "new").unwrap();
        tree.create_file(&root(), "a.txt_restored", "older").unwrap();

        let err = bin.restore(&mut tree, &token, ConflictPolicy::Rename).unwrap_err();
        assert_eq!(err, FsError::NameConflict("/a.txt_restored".to_string()));
        assert!(bin.contains(&token));
        assert_eq!(bin.payload(&tree, &token), Some(&Entry::file("hello")));
        assert_eq!(tree.read_file(&root(), "a.txt_restored").unwrap(), b"older");
    }

    #[test]
    fn test_failed_fallback_restore_keeps_root_as_target() {
        let mut tree = sample_tree();
        let mut bin = RecycleBin::new();

        let token = bin.delete(&mut tree, &VfsPath::parse("/D"), "n.txt").unwrap();
        bin.delete(&mut tree, &root(), "D").unwrap();
        tree.create_file(&root(), "n.txt", "blocker").unwrap();

        let err = bin.restore(&mut tree, &token, ConflictPolicy::Abort).unwrap_err();
        assert!(matches!(err, FsError::NameConflict(_)));
        let item = bin.list(&tree).into_iter().find(|i| i.token == token).unwrap();
        assert_eq!(item.original_path, root());

        // The old folder coming back does not change the recorded target
        tree.remove(&root(), "n.txt").unwrap();
        tree.create_folder(&root(), "D").unwrap();
        let outcome = bin.restore(&mut tree, &token, ConflictPolicy::Abort).unwrap();
        assert_eq!(outcome.path, root());
        assert!(!outcome.fell_back_to_root);
        assert_eq!(tree.read_file(&root(), "n.txt").unwrap(), b"nested");
    }

    #[test]
    fn test_unknown_token() {
        let mut tree = sample_tree();
        let mut bin = RecycleBin::new();
        assert!(matches!(
            bin.restore(&mut tree, "nope", ConflictPolicy::Rename),
            Err(FsError::TokenNotFound(_))
        ));
        assert!(matches!(bin.purge(&mut tree, "nope"), Err(FsError::TokenNotFound(_))));
    }

    #[test]
    fn test_delete_missing_entry() {
        let mut tree = sample_tree();
        let mut bin = RecycleBin::new();
        assert!(matches!(bin.delete(&mut tree, &root(), "zzz"), Err(FsError::NotFound(_))));
        assert!(bin.is_empty());
    }

    #[test]
    fn test_tokens_are_unique_within_same_second() {
        let mut tree = NamespaceTree::new();
        let mut bin = RecycleBin::new();

        tree.create_file(&root(), "a.txt", "1").unwrap();
        let first = bin.delete_at(&mut tree, &root(), "a.txt", fixed_time()).unwrap();
        tree.create_file(&root(), "a.txt", "2").unwrap();
        let second = bin.delete_at(&mut tree, &root(), "a.txt", fixed_time()).unwrap();

        assert_eq!(first, "a.txt_DELETED_20240501123000");
        assert_eq!(second, "a.txt_DELETED_20240501123000_2");
        assert_eq!(bin.len(), 2);
    }

    #[test]
    fn test_empty_all_is_idempotent() {
        let mut tree = sample_tree();
        let mut bin = RecycleBin::new();
        bin.delete(&mut tree, &root(), "a.txt").unwrap();
        bin.delete(&mut tree, &root(), "D").unwrap();

        assert_eq!(bin.empty_all(&mut tree), 2);
        assert_eq!(bin.empty_all(&mut tree), 0);
        assert_eq!(tree.total_size(), 0);
    }
}
