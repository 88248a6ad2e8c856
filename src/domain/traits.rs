// ============================================================
// Layer 3 — Collaborator Traits
// ============================================================
// The pipeline talks to the outside world only through these
// narrow interfaces. Production implementations live in the
// infra layer (dvc status, JSON export reader, file-backed
// experiment tracker, dvc + git client); tests plug in fakes.
//
// Every method reports failure as a typed PipelineError so the
// orchestrator never has to interpret process exit codes.

use std::path::{Path, PathBuf};

use crate::domain::error::PipelineResult;
use crate::domain::observation::Observations;
use crate::domain::record::RawRecord;

// ─── ChangeDetector ───────────────────────────────────────────────────────────
/// Reports whether the upstream dataset changed since the last recorded state.
pub trait ChangeDetector {
    /// Ok(true) when there are additions or modifications.
    /// Failure to run the status check is DataVersioning and is fatal.
    fn has_changed(&self) -> PipelineResult<bool>;
}

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Supplies the labeled snapshot. Per-record problems are reported
/// through `observations`; only an unreadable snapshot is an error.
pub trait RecordSource {
    fn load(&self, observations: &mut Observations) -> PipelineResult<Vec<RawRecord>>;
}

// ─── ExperimentTracker ────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Registered { version: u32 },
    /// The registry already holds this URI under the given name.
    AlreadyRegistered,
}

/// Append-only sink for run parameters, metrics and artifacts,
/// plus the model registry.
pub trait ExperimentTracker {
    /// Open a new tracked run; returns its identifier.
    fn start_run(&mut self) -> PipelineResult<String>;

    fn log_params(&mut self, params: &[(&str, String)]) -> PipelineResult<()>;

    fn log_metric(&mut self, name: &str, value: f64, step: Option<usize>) -> PipelineResult<()>;

    fn log_artifact(&mut self, path: &Path) -> PipelineResult<()>;

    fn register_model(&mut self, uri: &str, name: &str) -> PipelineResult<Registration>;
}

// ─── VersionControl ───────────────────────────────────────────────────────────
/// External revision control for released artifacts.
pub trait VersionControl {
    /// Stage every path or none; failure is VersioningCommit.
    fn stage(&mut self, paths: &[PathBuf]) -> PipelineResult<()>;

    /// Commit staged content; returns the new commit reference.
    fn commit(&mut self, message: &str) -> PipelineResult<String>;
}
