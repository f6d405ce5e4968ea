//! Navigation state for the directory browser
//!
//! The browser owns its current path; the engine never tracks it.

use crate::FilesystemService;
use app_fs::{EntryKind, FsError, Result, VfsPath, BACK_ENTRY};
use serde::{Deserialize, Serialize};

/// One row shown by the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrowserRow {
    /// Synthetic `..` row, present when not at the root
    Back,
    Entry { name: String, kind: EntryKind, size: u64 },
}

impl BrowserRow {
    /// Label as rendered in the explorer list
    pub fn label(&self) -> String {
        match self {
            BrowserRow::Back => "[..] Back".to_string(),
            BrowserRow::Entry { name, kind, .. } => format!("{} {}", kind.marker(), name),
        }
    }

    /// Name to pass to mutation calls; `None` for the back row
    pub fn target(&self) -> Option<&str> {
        match self {
            BrowserRow::Back => None,
            BrowserRow::Entry { name, .. } => Some(name),
        }
    }
}

/// Name to pass to mutation calls for a selected label, `None` for the back entry
pub fn selected_target(name: &str) -> Option<&str> {
    if name == BACK_ENTRY {
        None
    } else {
        Some(name)
    }
}

/// Directory browser state
#[derive(Debug, Clone, Default)]
pub struct Browser {
    current: VfsPath,

    /// Folders visited before the current one
    history: Vec<VfsPath>,
}

impl Browser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_path(&self) -> &VfsPath {
        &self.current
    }

    pub fn is_at_root(&self) -> bool {
        self.current.is_root()
    }

    /// Rows for the current folder: back row first, then entries by name
    pub fn rows(&self, fs: &FilesystemService) -> Result<Vec<BrowserRow>> {
        let entries = fs.list(&self.current)?;

        let mut rows = Vec::with_capacity(entries.len() + 1);
        if !self.is_at_root() {
            rows.push(BrowserRow::Back);
        }
        rows.extend(entries.into_iter().map(|e| BrowserRow::Entry {
            name: e.name,
            kind: e.kind,
            size: e.size,
        }));
        Ok(rows)
    }

    /// Descend into a child folder, or go up for `..`
    pub fn enter(&mut self, fs: &FilesystemService, name: &str) -> Result<()> {
        if name == BACK_ENTRY {
            self.up();
            return Ok(());
        }

        let target = self.current.join(name);
        match fs.resolve(&target) {
            Ok(EntryKind::Folder) => {
                let previous = std::mem::replace(&mut self.current, target);
                self.history.push(previous);
                Ok(())
            }
            Ok(EntryKind::File) => Err(FsError::NotAFolder(target.to_string())),
            Err(_) => Err(FsError::NotFound(target.to_string())),
        }
    }

    /// Jump to an absolute folder path
    pub fn go_to(&mut self, fs: &FilesystemService, path: VfsPath) -> Result<()> {
        match fs.resolve(&path)? {
            EntryKind::Folder => {
                let previous = std::mem::replace(&mut self.current, path);
                self.history.push(previous);
                Ok(())
            }
            EntryKind::File => Err(FsError::NotAFolder(path.to_string())),
        }
    }

    /// Go to the parent folder
    pub fn up(&mut self) -> bool {
        match self.current.parent() {
            Some(parent) => {
                let previous = std::mem::replace(&mut self.current, parent);
                self.history.push(previous);
                true
            }
            None => false,
        }
    }

    /// Go back to the previously visited folder
    pub fn go_back(&mut self) -> bool {
        if let Some(prev) = self.history.pop() {
            self.current = prev;
            true
        } else {
            false
        }
    }

    /// Return to the root if the current folder disappeared
    pub fn reset_if_missing(&mut self, fs: &FilesystemService) -> bool {
        if matches!(fs.resolve(&self.current), Ok(EntryKind::Folder)) {
            return false;
        }
        tracing::debug!("Current folder {} vanished, returning to root", self.current);
        self.current = VfsPath::root();
        self.history.clear();
        true
    }
}
