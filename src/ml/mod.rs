// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that builds, trains or scores the classifier.
//
//   model.rs         — bag-of-embeddings title classifier
//                      (embedding, masked mean pool, MLP head)
//
//   model_manager.rs — resume from the latest checkpoint or
//                      cold-start; checkpoint encode/decode
//
//   trainer.rs       — fixed-epoch Adam loop with per-epoch
//                      loss trace and cancellation checks
//
//   roc.rs           — one-vs-rest ROC curve and AUC
//
//   evaluator.rs     — softmax scoring, per-class and macro
//                      AUC, ROC plot
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Text classifier architecture
pub mod model;

/// Checkpoint-aware model construction
pub mod model_manager;

/// Training loop
pub mod trainer;

pub mod roc;

/// AUC evaluation and diagnostic plot
pub mod evaluator;
