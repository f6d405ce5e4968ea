//! Application state management

use crate::{AppConfig, AppError, FilesystemService};
use parking_lot::{Mutex, RwLock};

/// Main application state
///
/// Owns the one filesystem engine instance. Every logical operation runs
/// inside a single acquisition of the engine lock, so resolve, quota check
/// and mutation are never interleaved with another caller.
pub struct AppState {
    /// Application configuration
    pub config: RwLock<AppConfig>,

    /// Filesystem engine
    fs: Mutex<FilesystemService>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let limit = config.storage.limit_bytes;
        if limit == 0 {
            return Err(AppError::Config("storage.limit_bytes must be greater than zero".into()));
        }

        let fs = if config.seed.demo_content {
            FilesystemService::seeded(limit)
        } else {
            FilesystemService::new(limit)
        };

        let usage = fs.usage_report();
        if usage.used_bytes > limit {
            return Err(AppError::Init(format!(
                "seed content ({} bytes) exceeds the storage limit ({} bytes)",
                usage.used_bytes, limit
            )));
        }

        tracing::info!("Filesystem ready: {}", usage);
        Ok(Self::with_service(config, fs))
    }

    /// Wrap an already-built engine
    pub fn with_service(config: AppConfig, fs: FilesystemService) -> Self {
        Self {
            config: RwLock::new(config),
            fs: Mutex::new(fs),
        }
    }

    /// Run one logical operation with exclusive access to the engine
    pub fn with_fs<R>(&self, f: impl FnOnce(&mut FilesystemService) -> R) -> R {
        let mut fs = self.fs.lock();
        f(&mut fs)
    }
}
