// ============================================================
// Layer 3 — Pipeline Error Taxonomy
// ============================================================
// Every fatal failure a run can hit has a named variant here.
// Expected outcomes (unchanged dataset, metric below threshold)
// are NOT errors and never appear in this enum — they are
// returned as a RunOutcome by the application layer.
//
// The application and CLI layers work with anyhow::Result and
// attach context; callers that need the typed variant use
// `err.downcast_ref::<PipelineError>()`.

use std::path::PathBuf;

use crate::domain::run::RunPhase;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The external data-versioning status tool could not be run
    /// or exited with a failure status.
    #[error("data versioning status check failed: {0}")]
    DataVersioning(String),

    /// A required configuration key is missing or a value is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The dataset file is unreadable, or no usable examples remain.
    #[error("data format error: {0}")]
    DataFormat(String),

    /// Stored weights do not fit the configured architecture.
    #[error("checkpoint does not match the configured architecture: {0}")]
    ShapeMismatch(String),

    #[error("non-finite training loss at epoch {epoch}, batch {batch}")]
    TrainingNumerical { epoch: usize, batch: usize },

    /// Staging or committing to external version control failed.
    #[error("versioning commit failed: {0}")]
    VersioningCommit(String),

    #[error("another run holds the lock at '{}'", .0.display())]
    RunInProgress(PathBuf),

    #[error("run cancelled before {0}")]
    Cancelled(&'static str),

    /// Scores could not be read back from the model's output.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    #[error("model registry error: {0}")]
    Registry(String),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("illegal run transition {from:?} -> {to:?}")]
    InvalidTransition { from: RunPhase, to: RunPhase },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn data_format(msg: impl Into<String>) -> Self {
        Self::DataFormat(msg.into())
    }

    pub fn commit(msg: impl Into<String>) -> Self {
        Self::VersioningCommit(msg.into())
    }
}
