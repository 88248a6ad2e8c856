// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, loads the configuration, picks
// the Burn backend and hands off to Layer 2. Results go to
// stdout as JSON so the external scheduler can parse them;
// logs go to stderr through tracing.
//
// Device selection:
//   cpu  → Autodiff<NdArray>
//   gpu  → Autodiff<Wgpu> on the first discrete GPU
//   auto → Autodiff<Wgpu> on the best adapter available
//
// Ctrl-C / SIGTERM set the cooperative cancellation flag; the
// run stops at the next safe point.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{Context, Result};
use burn::backend::{
    ndarray::NdArrayDevice,
    wgpu::WgpuDevice,
    Autodiff, NdArray, Wgpu,
};
use clap::Parser;
use commands::{Commands, RunArgs, VerifyArgs};

use crate::application::{
    retrain_use_case::RetrainUseCase,
    verify_use_case::VerifyUseCase,
};
use crate::domain::{cancel::CancelFlag, run::RunOutcome};
use crate::infra::{
    checkpoint::CheckpointStore,
    config::{DeviceKind, PipelineConfig},
};

#[derive(Parser, Debug)]
#[command(
    name = "notice-retrain",
    version = "0.1.0",
    about = "Retrain, evaluate, gate and release the notice-title classifier."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Run(args)    => run_pipeline(args),
            Commands::Verify(args) => verify(args),
        }
    }
}

fn run_pipeline(args: RunArgs) -> Result<()> {
    let config = PipelineConfig::load(&args.config)
        .with_context(|| format!("Invalid configuration '{}'", args.config.display()))?;

    let mut cancel = CancelFlag::new();
    if let Some(timeout) = config.timeout() {
        cancel = cancel.with_timeout(timeout);
    }
    let flag = cancel.clone();
    ctrlc::set_handler(move || {
        tracing::warn!("Interrupt received, cancelling at the next safe point");
        flag.cancel();
    })
    .context("Failed to install the interrupt handler")?;

    let device_kind = config.training.device;
    let mut use_case = RetrainUseCase::from_config(config, cancel);

    let outcome = match device_kind {
        DeviceKind::Cpu => {
            tracing::info!("Training on CPU (ndarray)");
            use_case.execute::<Autodiff<NdArray>>(&NdArrayDevice::default())?
        }
        DeviceKind::Gpu => {
            tracing::info!("Training on discrete GPU 0 (wgpu)");
            use_case.execute::<Autodiff<Wgpu>>(&WgpuDevice::DiscreteGpu(0))?
        }
        DeviceKind::Auto => {
            tracing::info!("Training on best available wgpu adapter");
            use_case.execute::<Autodiff<Wgpu>>(&WgpuDevice::default())?
        }
    };

    for obs in use_case.observations().iter() {
        tracing::debug!("observation: {:?}", obs);
    }
    tracing::info!("Run status: {:?}", outcome.status());
    if let RunOutcome::Rejected { auc } = &outcome {
        tracing::info!("Model rejected (macro AUC {:.4})", auc);
    }
    print_json(&outcome)
}

fn verify(args: VerifyArgs) -> Result<()> {
    let config = PipelineConfig::load(&args.config)
        .with_context(|| format!("Invalid configuration '{}'", args.config.display()))?;

    let report = VerifyUseCase::new(CheckpointStore::new(&config.paths.models_dir)).execute()?;
    print_json(&report)?;
    if !report.is_ok() {
        anyhow::bail!("checkpoint integrity check failed");
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value).context("Failed to serialize result")?;
    println!("{json}");
    Ok(())
}
