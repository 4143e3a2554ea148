//! Aggregate result types recorded on the execution ledger.

use crate::providers::{BackupRecord, ResourceFact};
use serde::{Deserialize, Serialize};

/// Aggregate outcome of one inventory run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventorySummary {
    /// Facts returned by the adapter
    pub discovered: usize,
    /// Catalog rows inserted for new facts
    pub created: usize,
    /// Existing catalog rows refreshed in place
    pub updated: usize,
    /// Facts that could not be persisted (logged and skipped)
    pub failed: usize,
    pub facts: Vec<ResourceFact>,
}

impl InventorySummary {
    pub fn message(&self) -> String {
        format!("{} assets discovered", self.discovered)
    }
}

/// Aggregate outcome of one backup run. The task itself succeeds even when
/// individual resources fail; per-resource detail lives in `records`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub records: Vec<BackupRecord>,
}

impl BackupSummary {
    pub fn message(&self) -> String {
        format!(
            "backup finished: total={} succeeded={} failed={}",
            self.total, self.succeeded, self.failed
        )
    }
}
