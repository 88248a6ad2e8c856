// ============================================================
// Layer 3 — Training Run Lifecycle
// ============================================================
// One invocation of the pipeline is one TrainingRun. It moves
// through a fixed state machine:
//
//   Init ──► Skipped                                  (terminal)
//     │
//     ▼
//   Preparing ──► Training ──► Evaluating ──► Rejected (terminal)
//                                  │
//                                  ▼
//                              Promoting ──► Success   (terminal)
//
// Any non-terminal phase may also move to Failed (terminal).
// A terminal status is assigned exactly once; every later
// transition is refused with InvalidTransition.

use serde::Serialize;

use crate::domain::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    Init,
    Skipped,
    Preparing,
    Training,
    Evaluating,
    Rejected,
    Promoting,
    Success,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunPhase::Skipped | RunPhase::Rejected | RunPhase::Success | RunPhase::Failed
        )
    }

    fn can_move_to(self, next: RunPhase) -> bool {
        use RunPhase::*;
        if self.is_terminal() {
            return false;
        }
        if next == Failed {
            return true;
        }
        matches!(
            (self, next),
            (Init, Skipped)
                | (Init, Preparing)
                | (Preparing, Training)
                | (Training, Evaluating)
                | (Evaluating, Rejected)
                | (Evaluating, Promoting)
                | (Promoting, Success)
        )
    }
}

/// Hyperparameters recorded for the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunParams {
    pub model_name:    String,
    pub epochs:        usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    pub max_length:    usize,
}

#[derive(Debug, Clone)]
pub struct TrainingRun {
    params:     RunParams,
    phase:      RunPhase,
    loss_trace: Vec<f64>,
    macro_auc:  Option<f64>,
}

impl TrainingRun {
    pub fn new(params: RunParams) -> Self {
        Self { params, phase: RunPhase::Init, loss_trace: Vec::new(), macro_auc: None }
    }

    pub fn params(&self) -> &RunParams {
        &self.params
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// The terminal status, once one has been reached.
    pub fn status(&self) -> Option<RunPhase> {
        self.phase.is_terminal().then_some(self.phase)
    }

    pub fn advance(&mut self, next: RunPhase) -> PipelineResult<()> {
        if !self.phase.can_move_to(next) {
            return Err(PipelineError::InvalidTransition { from: self.phase, to: next });
        }
        tracing::debug!("run phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Mark the run failed unless it already ended.
    pub fn fail(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = RunPhase::Failed;
        }
    }

    pub fn set_loss_trace(&mut self, losses: Vec<f64>) {
        self.loss_trace = losses;
    }

    pub fn loss_trace(&self) -> &[f64] {
        &self.loss_trace
    }

    pub fn set_macro_auc(&mut self, auc: f64) {
        self.macro_auc = Some(auc);
    }

    pub fn macro_auc(&self) -> Option<f64> {
        self.macro_auc
    }
}

// ─── Gate ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Accept,
    Reject,
}

pub struct Gate;

impl Gate {
    /// Minimum macro-AUC required for promotion.
    pub const THRESHOLD: f64 = 0.8;

    /// A NaN metric never passes.
    pub fn decide(macro_auc: f64) -> GateDecision {
        if macro_auc >= Self::THRESHOLD {
            GateDecision::Accept
        } else {
            GateDecision::Reject
        }
    }
}

// ─── Results ──────────────────────────────────────────────────────────────────

/// Links a promoted checkpoint's content hash to the commit that recorded it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseRecord {
    pub hash:   String,
    pub auc:    f64,
    pub commit: String,
}

/// What `run()` hands back to the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
    Skipped { reason: String },
    Rejected { auc: f64 },
    Success { auc: f64, hash: String, commit: String },
}

impl RunOutcome {
    pub fn no_data_change() -> Self {
        RunOutcome::Skipped { reason: "no_data_change".to_string() }
    }

    pub fn status(&self) -> RunPhase {
        match self {
            RunOutcome::Skipped { .. }  => RunPhase::Skipped,
            RunOutcome::Rejected { .. } => RunPhase::Rejected,
            RunOutcome::Success { .. }  => RunPhase::Success,
        }
    }
}

impl From<ReleaseRecord> for RunOutcome {
    fn from(r: ReleaseRecord) -> Self {
        RunOutcome::Success { auc: r.auc, hash: r.hash, commit: r.commit }
    }
}
