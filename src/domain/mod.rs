// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits describing a training run:
// the label vocabulary, raw records, the run state machine and
// promotion gate, the error taxonomy, and the interfaces to the
// external systems the run talks to.
//
// Nothing in here touches Burn, the filesystem or a process.

pub mod cancel;
pub mod error;
pub mod labels;
pub mod observation;
pub mod record;
pub mod run;
pub mod traits;
