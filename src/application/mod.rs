// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only. These use cases tell the data,
// ml and infra layers what to do and in which order; they hold
// no model math and print nothing (that's Layer 1).
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// One scheduled retrain → evaluate → gate → release run
pub mod retrain_use_case;

// Integrity check of the promoted checkpoint
pub mod verify_use_case;
