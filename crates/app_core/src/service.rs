//! Filesystem service - the operations consumed by the desktop applications
//!
//! Composes the namespace tree, quota tracker and recycle bin, and enforces
//! the policy none of them knows about individually: quota checks before
//! writes, create-vs-save semantics and the back entry guard. Navigation state
//! belongs to the caller; the service only holds the tree and the bin.

use app_fs::{
    ConflictPolicy, Entry, EntryKind, FolderNode, FsError, ListEntry, NamespaceTree, QuotaTracker,
    RecycleBin, RecycledSummary, RestoreOutcome, Result, UsageReport, VfsPath, BACK_ENTRY,
};

/// Greeting stored in the sample document
pub const DEMO_GREETING: &str = "Hello, MemFiler!";

/// In-memory filesystem engine instance
#[derive(Debug, Clone)]
pub struct FilesystemService {
    tree: NamespaceTree,
    bin: RecycleBin,
    quota: QuotaTracker,
}

impl FilesystemService {
    /// Empty namespace with the given storage limit
    pub fn new(limit_bytes: u64) -> Self {
        Self::with_tree(NamespaceTree::new(), QuotaTracker::new(limit_bytes))
    }

    /// Namespace with the sample Documents / Images layout
    pub fn seeded(limit_bytes: u64) -> Self {
        let mut documents = FolderNode::new();
        documents
            .children
            .insert("my_first_file.txt".to_string(), Entry::file(DEMO_GREETING));
        documents.children.insert("A cool folder".to_string(), Entry::folder());

        let mut root = FolderNode::new();
        root.children.insert("Documents".to_string(), Entry::Folder(documents));
        root.children.insert("Images".to_string(), Entry::folder());

        Self::with_tree(NamespaceTree::from_folder(root), QuotaTracker::new(limit_bytes))
    }

    /// Wrap an existing tree
    pub fn with_tree(tree: NamespaceTree, quota: QuotaTracker) -> Self {
        Self {
            tree,
            bin: RecycleBin::new(),
            quota,
        }
    }

    pub fn tree(&self) -> &NamespaceTree {
        &self.tree
    }

    pub fn recycle_bin(&self) -> &RecycleBin {
        &self.bin
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    // ========================================
    // Directory browser
    // ========================================

    /// List a folder (recycle bin hidden at the root)
    pub fn list(&self, path: &VfsPath) -> Result<Vec<ListEntry>> {
        tracing::debug!("List: {}", path);
        self.tree.list(path)
    }

    /// Kind of the entry at `path`, for navigation
    pub fn resolve(&self, path: &VfsPath) -> Result<EntryKind> {
        self.tree.kind_at(path)
    }

    /// Size of one entry (recursive for folders)
    pub fn entry_size(&self, path: &VfsPath, name: &str) -> Result<u64> {
        Ok(self.tree.get(path, name)?.size())
    }

    /// Create an empty or pre-filled file; the name must be free
    pub fn create_file(&mut self, path: &VfsPath, name: &str, content: impl Into<Vec<u8>>) -> Result<()> {
        let content = content.into();
        if self.tree.contains(path, name)? {
            return Err(FsError::NameConflict(path.join(name).to_string()));
        }

        self.quota.check_write(&self.tree, content.len() as i64)?;
        self.tree.create_file(path, name, content)?;

        tracing::info!("Created file: {}", path.join(name));
        Ok(())
    }

    /// Create an empty folder; the name must be free
    pub fn create_folder(&mut self, path: &VfsPath, name: &str) -> Result<()> {
        self.quota.check_write(&self.tree, 0)?;
        self.tree.create_folder(path, name)?;

        tracing::info!("Created folder: {}", path.join(name));
        Ok(())
    }

    /// Rename an entry within its folder
    pub fn rename(&mut self, path: &VfsPath, old_name: &str, new_name: &str) -> Result<()> {
        Self::guard_back_entry(old_name)?;
        self.tree.rename(path, old_name, new_name)?;

        tracing::info!("Renamed: {} -> {}", path.join(old_name), path.join(new_name));
        Ok(())
    }

    /// Move an entry into another folder
    pub fn move_entry(&mut self, from: &VfsPath, name: &str, to: &VfsPath) -> Result<()> {
        Self::guard_back_entry(name)?;
        self.tree.move_entry(from, name, to)?;

        tracing::info!("Moved: {} -> {}", from.join(name), to.join(name));
        Ok(())
    }

    /// Move an entry to the recycle bin, returning its token
    pub fn delete_to_recycle_bin(&mut self, path: &VfsPath, name: &str) -> Result<String> {
        Self::guard_back_entry(name)?;
        self.bin.delete(&mut self.tree, path, name)
    }

    // ========================================
    // Editor
    // ========================================

    /// Read a file's content
    pub fn read_file(&self, path: &VfsPath, name: &str) -> Result<Vec<u8>> {
        tracing::debug!("Read: {}", path.join(name));
        self.tree.read_file(path, name).map(<[u8]>::to_vec)
    }

    /// Save a file
    ///
    /// With `is_new_file` an existing name is a conflict ("create new");
    /// otherwise an existing file is overwritten ("save"). The quota is
    /// checked against the size difference before anything changes.
    pub fn save(&mut self, path: &VfsPath, name: &str, content: impl Into<Vec<u8>>, is_new_file: bool) -> Result<()> {
        let content = content.into();

        let old_size = match self.tree.get(path, name) {
            Ok(_) if is_new_file => {
                return Err(FsError::NameConflict(path.join(name).to_string()));
            }
            Ok(Entry::File(file)) => file.size(),
            Ok(Entry::Folder(_)) => {
                return Err(FsError::NotAFile(path.join(name).to_string()));
            }
            Err(FsError::NotFound(_)) => 0,
            Err(e) => return Err(e),
        };

        let delta = content.len() as i64 - old_size as i64;
        self.quota.check_write(&self.tree, delta)?;
        self.tree.write_file(path, name, content)?;

        tracing::info!("Saved: {} ({} bytes delta)", path.join(name), delta);
        Ok(())
    }

    // ========================================
    // Recycle bin manager
    // ========================================

    /// Recycle bin contents, oldest first
    pub fn recycle_bin_items(&self) -> Vec<RecycledSummary> {
        self.bin.list(&self.tree)
    }

    /// Restore a recycled item
    pub fn restore(&mut self, token: &str, policy: ConflictPolicy) -> Result<RestoreOutcome> {
        self.bin.restore(&mut self.tree, token, policy)
    }

    /// Permanently delete one recycled item
    pub fn purge(&mut self, token: &str) -> Result<()> {
        self.bin.purge(&mut self.tree, token)
    }

    /// Permanently delete every recycled item
    pub fn empty_bin(&mut self) -> usize {
        self.bin.empty_all(&mut self.tree)
    }

    // ========================================
    // Usage display
    // ========================================

    pub fn usage_report(&self) -> UsageReport {
        self.quota.usage_report(&self.tree)
    }

    fn guard_back_entry(name: &str) -> Result<()> {
        if name == BACK_ENTRY {
            return Err(FsError::InvalidName(
                "the back navigation item cannot be modified".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for FilesystemService {
    fn default() -> Self {
        Self::new(app_fs::DEFAULT_LIMIT_BYTES)
    }
}
