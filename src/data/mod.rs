// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From the labeling tool's JSON export to tensor batches:
//
//   notices.json
//       │
//       ▼
//   JsonRecordSource  → reads the export, skips malformed items
//       │
//       ▼
//   DataPreparer      → drops blank titles, maps categories to
//       │               label ids, encodes + pads every title
//       ▼
//   split_holdout     → optional seeded held-out split
//       │
//       ▼
//   ClassificationDataset / ClassificationBatcher
//       │
//       ▼
//   DataLoader        → feeds batches to the trainer and evaluator

/// Reads the labeled snapshot export
pub mod loader;

/// Filters, labels and encodes raw records
pub mod preparer;

/// Implements Burn's Dataset trait for encoded samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded train / held-out split
pub mod splitter;
