// ============================================================
// Layer 2 — Verify Use Case
// ============================================================
// Recomputes the SHA-256 of the latest checkpoint and compares
// it with the sidecar written at promotion. Read-only: nothing
// is locked, trained or rewritten.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::infra::checkpoint::{CheckpointStore, Integrity};

/// What `verify` reports back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum VerifyReport {
    Verified { hash: String },
    Mismatch { recorded: String, actual: String },
    Missing,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        matches!(self, VerifyReport::Verified { .. })
    }
}

pub struct VerifyUseCase {
    store: CheckpointStore,
}

impl VerifyUseCase {
    pub fn new(store: CheckpointStore) -> Self {
        Self { store }
    }

    pub fn execute(&self) -> Result<VerifyReport> {
        let integrity = self.store.verify().context("Failed to verify the latest checkpoint")?;
        let report = match integrity {
            Integrity::Verified { hash } => {
                tracing::info!("Checkpoint verified: {}", hash);
                VerifyReport::Verified { hash }
            }
            Integrity::Mismatch { recorded, actual } => {
                tracing::warn!("Checkpoint digest {} does not match sidecar {}", actual, recorded);
                VerifyReport::Mismatch { recorded, actual }
            }
            Integrity::Missing => {
                tracing::warn!("No promoted checkpoint to verify");
                VerifyReport::Missing
            }
        };
        Ok(report)
    }
}
