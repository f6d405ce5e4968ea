//! Storage quota accounting

use crate::{FsError, NamespaceTree, Result};
use serde::{Deserialize, Serialize};

/// Default storage limit (64 MiB)
pub const DEFAULT_LIMIT_BYTES: u64 = 64 * 1024 * 1024;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Severity band of a usage report, for the usage display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

/// Snapshot of storage usage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub used_bytes: u64,
    pub limit_bytes: u64,
    /// 0.0 - 100.0 (may exceed 100 if the limit was lowered below usage)
    pub percentage: f64,
}

impl UsageReport {
    pub fn new(used_bytes: u64, limit_bytes: u64) -> Self {
        let percentage = if limit_bytes == 0 {
            if used_bytes == 0 { 0.0 } else { 100.0 }
        } else {
            used_bytes as f64 / limit_bytes as f64 * 100.0
        };

        Self {
            used_bytes,
            limit_bytes,
            percentage,
        }
    }

    /// >= 90% critical, >= 70% warning
    pub fn severity(&self) -> Severity {
        if self.percentage >= 90.0 {
            Severity::Critical
        } else if self.percentage >= 70.0 {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }

    pub fn used_mib(&self) -> f64 {
        self.used_bytes as f64 / BYTES_PER_MIB
    }

    pub fn limit_mib(&self) -> f64 {
        self.limit_bytes as f64 / BYTES_PER_MIB
    }

    pub fn available_bytes(&self) -> u64 {
        self.limit_bytes.saturating_sub(self.used_bytes)
    }
}

impl std::fmt::Display for UsageReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Storage Used: {:.2} MB / {:.0} MB ({:.1}%)",
            self.used_mib(),
            self.limit_mib(),
            self.percentage
        )
    }
}

/// Accepts or rejects mutations against a fixed byte limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaTracker {
    limit_bytes: u64,
}

impl QuotaTracker {
    pub fn new(limit_bytes: u64) -> Self {
        Self { limit_bytes }
    }

    pub fn limit_bytes(&self) -> u64 {
        self.limit_bytes
    }

    /// Check that applying `delta_bytes` keeps the tree within the limit
    ///
    /// Must run before the mutation is committed. Usage exactly at the limit
    /// is allowed; a negative delta (shrinking overwrite) always passes.
    pub fn check_write(&self, tree: &NamespaceTree, delta_bytes: i64) -> Result<()> {
        let used = tree.total_size();
        let required = if delta_bytes >= 0 {
            used.saturating_add(delta_bytes as u64)
        } else {
            used.saturating_sub(delta_bytes.unsigned_abs())
        };

        if delta_bytes > 0 && required > self.limit_bytes {
            tracing::warn!(used, delta_bytes, limit = self.limit_bytes, "Quota check rejected write");
            return Err(FsError::StorageFull {
                required,
                limit: self.limit_bytes,
            });
        }
        Ok(())
    }

    pub fn usage_report(&self, tree: &NamespaceTree) -> UsageReport {
        UsageReport::new(tree.total_size(), self.limit_bytes)
    }
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT_BYTES)
    }
}
