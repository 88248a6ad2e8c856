// ============================================================
// Layer 3 — Cooperative Cancellation
// ============================================================
// A shared flag plus an optional deadline. Long-running stages
// poll `check()` at safe points (between epochs, before the
// checkpoint is promoted, before anything is staged into
// version control) and stop with PipelineError::Cancelled.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use crate::domain::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag:     Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same flag, with a deadline `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail with `Cancelled(stage)` if cancellation was requested.
    pub fn check(&self, stage: &'static str) -> PipelineResult<()> {
        if self.is_cancelled() {
            tracing::warn!("Cancellation requested, stopping before {stage}");
            return Err(PipelineError::Cancelled(stage));
        }
        Ok(())
    }
}
