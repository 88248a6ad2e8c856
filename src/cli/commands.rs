// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Two subcommands:
//
//   run    — one scheduled retrain run; prints the outcome as
//            JSON ({"status": ...})
//   verify — recompute the latest checkpoint's SHA-256 and
//            compare it with the sidecar
//
// Everything else comes from the YAML parameters file.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retrain if the dataset changed, then gate and release the model
    Run(RunArgs),

    /// Check the latest checkpoint against its recorded hash
    Verify(VerifyArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML parameters file
    #[arg(long, default_value = "params.yaml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// YAML parameters file (only `paths.models_dir` is used)
    #[arg(long, default_value = "params.yaml")]
    pub config: PathBuf,
}
