// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem or an external tool:
//
//   config.rs          — params.yaml parsing and validation
//
//   checkpoint.rs      — latest checkpoint slot, SHA-256
//                        sidecar and content-addressed history
//
//   tokenizer_store.rs — word-level tokenizer, built from the
//                        snapshot on first use and reused after
//
//   plot.rs            — ROC curves rendered as SVG
//
//   tracker.rs         — file-backed experiment tracker and
//                        model registry
//
//   dvc.rs             — dvc status change detection and the
//                        dvc + git release client
//
//   lock.rs            — single-run lock file
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §12 (I/O and File Handling)

/// Pipeline configuration
pub mod config;

/// Checkpoint persistence and hashing
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

pub mod plot;

/// Experiment tracking store
pub mod tracker;

/// External data-versioning and revision control
pub mod dvc;

pub mod lock;
