//! MemFiler Core Domain Logic
//!
//! This crate contains:
//! - Application state management
//! - Filesystem service orchestration
//! - Configuration
//! - Error types
//! - Request dispatch for the service boundary
//! - Browser navigation and notepad documents

pub mod state;
pub mod config;
pub mod error;
pub mod service;
pub mod dispatch;
pub mod navigation;
pub mod editor;

pub use state::AppState;
pub use config::{AppConfig, LoggingConfig, RecycleBinConfig, SeedConfig, StorageConfig};
pub use error::AppError;
pub use service::{FilesystemService, DEMO_GREETING};
pub use navigation::{selected_target, Browser, BrowserRow};
pub use editor::Document;
