//! Notepad document - text buffer bound to a file in the namespace

use crate::{AppError, FilesystemService};
use app_fs::{EntryKind, VfsPath};

/// An open notepad document
///
/// Tracks its own dirty flag and path binding; the engine knows nothing
/// about open documents.
#[derive(Debug, Clone, Default)]
pub struct Document {
    name: Option<String>,
    path: VfsPath,
    text: String,
    dirty: bool,
}

impl Document {
    /// New untitled document
    pub fn untitled() -> Self {
        Self::default()
    }

    /// Open an existing file
    pub fn open(fs: &FilesystemService, path: &VfsPath, name: &str) -> Result<Self, AppError> {
        let bytes = fs.read_file(path, name)?;
        Ok(Self {
            name: Some(name.to_string()),
            path: path.clone(),
            text: String::from_utf8_lossy(&bytes).into_owned(),
            dirty: false,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn path(&self) -> &VfsPath {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Window title, with a marker while unsaved
    pub fn title(&self) -> String {
        let name = self.name.as_deref().unwrap_or("Untitled");
        if self.dirty {
            format!("Notepad - {}*", name)
        } else {
            format!("Notepad - {}", name)
        }
    }

    /// Replace the buffer contents
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.dirty = true;
    }

    /// Append a line to the buffer
    pub fn push_line(&mut self, line: &str) {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(line);
        self.dirty = true;
    }

    /// Save to the bound file
    ///
    /// If the bound folder no longer exists the document is re-bound to the
    /// root and saved there.
    pub fn save(&mut self, fs: &mut FilesystemService) -> Result<(), AppError> {
        let name = self.name.clone().ok_or(AppError::Unnamed)?;

        if !matches!(fs.resolve(&self.path), Ok(EntryKind::Folder)) {
            tracing::warn!("Original path {} is invalid, saving to root", self.path);
            self.path = VfsPath::root();
        }

        fs.save(&self.path, &name, self.text.as_bytes(), false)?;
        self.dirty = false;
        Ok(())
    }

    /// Save under a new name and folder, re-binding the document
    ///
    /// Without `overwrite` an existing entry is a conflict, unless it is the
    /// file this document is already bound to.
    pub fn save_as(
        &mut self,
        fs: &mut FilesystemService,
        path: &VfsPath,
        name: &str,
        overwrite: bool,
    ) -> Result<(), AppError> {
        let is_bound_file = self.name.as_deref() == Some(name) && &self.path == path;
        let is_new_file = !overwrite && !is_bound_file;
        fs.save(path, name, self.text.as_bytes(), is_new_file)?;

        self.name = Some(name.to_string());
        self.path = path.clone();
        self.dirty = false;
        Ok(())
    }
}
