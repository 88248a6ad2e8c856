// ============================================================
// Layer 2 — RetrainUseCase
// ============================================================
// One scheduled invocation of the pipeline, in order:
//
//   Step 0: Take the run lock                  (Layer 6 - infra)
//   Step 1: Ask dvc whether the data changed   (Layer 6 - infra)
//           unchanged → status "skipped", nothing else runs
//   Step 2: Load, tokenize and encode records  (Layer 4 - data)
//   Step 3: Resume or cold-start the model     (Layer 5 - ml)
//   Step 4: Train for the configured epochs    (Layer 5 - ml)
//   Step 5: Evaluate macro AUC + ROC plot      (Layer 5 - ml)
//   Step 6: Gate on macro AUC ≥ 0.8            (Layer 3 - domain)
//           below → status "rejected", latest checkpoint untouched
//   Step 7: Promote + hash the checkpoint      (Layer 6 - infra)
//   Step 8: Record metrics, register model     (Layer 6 - infra)
//   Step 9: Stage artifacts and commit         (Layer 6 - infra)
//
// Every phase change goes through TrainingRun so the terminal
// status is assigned exactly once. Any error marks the run
// failed and is handed back to the scheduler unchanged.
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use burn::{module::AutodiffModule, tensor::backend::AutodiffBackend};

use crate::data::{
    dataset::ClassificationDataset,
    preparer::DataPreparer,
    splitter::split_holdout,
};
use crate::domain::{
    cancel::CancelFlag,
    observation::{Observation, Observations},
    run::{Gate, GateDecision, ReleaseRecord, RunOutcome, RunPhase, TrainingRun},
    traits::{ChangeDetector, ExperimentTracker, RecordSource, Registration, VersionControl},
};
use crate::infra::{
    checkpoint::CheckpointStore,
    config::PipelineConfig,
    dvc::{DvcGitClient, DvcStatusDetector},
    lock::RunLock,
    tokenizer_store::TokenizerStore,
    tracker::FileExperimentTracker,
};
use crate::data::loader::JsonRecordSource;
use crate::ml::{
    evaluator::Evaluator,
    model::TextClassifierConfig,
    model_manager::{encode, ModelManager},
    trainer::{Trainer, TrainerSettings},
};

// ─── RetrainUseCase ───────────────────────────────────────────────────────────
pub struct RetrainUseCase {
    config:       PipelineConfig,
    detector:     Box<dyn ChangeDetector>,
    source:       Box<dyn RecordSource>,
    tracker:      Box<dyn ExperimentTracker>,
    vcs:          Box<dyn VersionControl>,
    cancel:       CancelFlag,
    observations: Observations,
}

impl RetrainUseCase {
    pub fn new(
        config:   PipelineConfig,
        detector: Box<dyn ChangeDetector>,
        source:   Box<dyn RecordSource>,
        tracker:  Box<dyn ExperimentTracker>,
        vcs:      Box<dyn VersionControl>,
        cancel:   CancelFlag,
    ) -> Self {
        Self { config, detector, source, tracker, vcs, cancel, observations: Observations::new() }
    }

    /// Wire the production collaborators: dvc status, the JSON export,
    /// the file-backed tracker and the dvc + git release client.
    pub fn from_config(config: PipelineConfig, cancel: CancelFlag) -> Self {
        let detector = Box::new(DvcStatusDetector::new(&config.versioning));
        let source   = Box::new(JsonRecordSource::new(&config.data.path));
        let tracker  = Box::new(FileExperimentTracker::new(
            &config.paths.tracking_dir,
            &config.tracking.experiment,
        ));
        let vcs      = Box::new(DvcGitClient::new(&config.versioning));
        Self::new(config, detector, source, tracker, vcs, cancel)
    }

    /// Observations collected by the most recent `execute`.
    pub fn observations(&self) -> &Observations {
        &self.observations
    }

    /// Run the pipeline once on `device`.
    pub fn execute<B: AutodiffBackend>(&mut self, device: &B::Device) -> Result<RunOutcome> {
        let _lock = RunLock::acquire(&self.config.paths.lock_file)
            .context("Failed to acquire the run lock")?;

        self.observations = Observations::new();
        let mut run = TrainingRun::new(self.config.run_params());

        match self.drive::<B>(&mut run, device) {
            Ok(outcome) => {
                tracing::info!(
                    "Run finished: {:?} (last epoch loss {:?}, macro AUC {:?})",
                    run.status(),
                    run.loss_trace().last(),
                    run.macro_auc()
                );
                Ok(outcome)
            }
            Err(e) => {
                run.fail();
                tracing::error!("Run failed during {:?}: {:#}", run.phase(), e);
                Err(e)
            }
        }
    }

    fn drive<B: AutodiffBackend>(
        &mut self,
        run:    &mut TrainingRun,
        device: &B::Device,
    ) -> Result<RunOutcome> {
        let Self { config, detector, source, tracker, vcs, cancel, observations } = self;

        // ── Step 1: Change detection ──────────────────────────────────────────
        if !detector.has_changed()? {
            run.advance(RunPhase::Skipped)?;
            return Ok(RunOutcome::no_data_change());
        }
        run.advance(RunPhase::Preparing)?;

        let run_id = tracker.start_run()?;
        let params = run.params().clone();
        tracker.log_params(&[
            ("model_name",    params.model_name.clone()),
            ("epochs",        params.epochs.to_string()),
            ("batch_size",    params.batch_size.to_string()),
            ("learning_rate", params.learning_rate.to_string()),
            ("max_length",    params.max_length.to_string()),
        ])?;
        tracing::info!("Tracking run {}", run_id);

        // ── Step 2: Data preparation ──────────────────────────────────────────
        let vocab   = config.label_vocabulary()?;
        let records = source.load(observations).context("Failed to load labeled records")?;

        let titles: Vec<String> = records
            .iter()
            .filter(|r| !r.has_blank_title())
            .map(|r| r.title.trim().to_string())
            .collect();
        let tokenizer_store = TokenizerStore::new(config.tokenizer_path());
        let tokenizer = tokenizer_store.load_or_build(&titles, config.model.vocab_size)?;

        let samples = DataPreparer::new(&vocab, &tokenizer, config.data.max_length)
            .prepare(&records, observations)?;

        let (train, holdout) =
            split_holdout(samples, config.data.holdout_fraction, config.training.seed);
        let train_set = ClassificationDataset::new(train);
        let eval_set  = if holdout.is_empty() {
            // no-holdout compatibility mode
            train_set.clone()
        } else {
            ClassificationDataset::new(holdout)
        };

        // ── Step 3: Model ─────────────────────────────────────────────────────
        run.advance(RunPhase::Training)?;
        B::seed(config.training.seed);
        let store = CheckpointStore::new(&config.paths.models_dir);
        let model_config = TextClassifierConfig::new(config.model.vocab_size, vocab.len())
            .with_embed_dim(config.model.embed_dim)
            .with_hidden_dim(config.model.hidden_dim)
            .with_dropout(config.model.dropout);
        let (model, origin) = ModelManager::new(&store, model_config).load_or_init::<B>(device)?;
        tracing::info!("Starting from {:?}", origin);

        // ── Step 4: Training ──────────────────────────────────────────────────
        let settings = TrainerSettings {
            epochs:        config.training.epochs,
            batch_size:    config.training.batch_size,
            learning_rate: config.training.learning_rate,
            seed:          config.training.seed,
        };
        let (model, loss_trace) = Trainer::new(&settings, cancel).fit(
            model,
            train_set,
            device,
            &mut |epoch, loss| tracker.log_metric("loss", loss, Some(epoch)),
        )?;
        run.set_loss_trace(loss_trace);

        // ── Step 5: Evaluation ────────────────────────────────────────────────
        run.advance(RunPhase::Evaluating)?;
        let model = model.valid();
        let report = Evaluator::new(&vocab, config.training.batch_size, config.roc_plot_path())
            .evaluate(&model, eval_set, device, observations)?;

        tracker.log_metric("test_auc_macro", report.macro_auc, None)?;
        for class in &report.per_class {
            if let Some(auc) = class.auc {
                tracker.log_metric(&format!("test_auc_{}", class.label), auc, None)?;
            }
        }
        tracker.log_artifact(&report.plot_path)?;

        let macro_auc = report.macro_auc;
        run.set_macro_auc(macro_auc);

        // ── Step 6: Gate ──────────────────────────────────────────────────────
        if Gate::decide(macro_auc) == GateDecision::Reject {
            tracing::info!(
                "Macro AUC {:.4} is below {:.2}; latest checkpoint left unchanged",
                macro_auc,
                Gate::THRESHOLD
            );
            run.advance(RunPhase::Rejected)?;
            return Ok(RunOutcome::Rejected { auc: macro_auc });
        }
        run.advance(RunPhase::Promoting)?;

        // ── Step 7: Promote ───────────────────────────────────────────────────
        cancel.check("promotion")?;
        let bytes    = encode(&model)?;
        let promoted = store.promote(&bytes)?;
        tokenizer_store.save(&tokenizer)?;

        // ── Step 8: Experiment record ─────────────────────────────────────────
        tracker.log_metric("final_auc", macro_auc, None)?;
        tracker.log_params(&[("model_hash", promoted.hash.clone())])?;
        tracker.log_artifact(&promoted.latest_path)?;

        let uri        = promoted.uri();
        let model_name = &config.tracking.registered_model;
        match tracker.register_model(&uri, model_name)? {
            Registration::Registered { version } => {
                tracing::info!("Registered {} version {}", model_name, version);
            }
            Registration::AlreadyRegistered => {
                observations.record(Observation::RegistryConflict {
                    model: model_name.clone(),
                    uri,
                });
            }
        }

        // ── Step 9: Release commit ────────────────────────────────────────────
        cancel.check("staging")?;
        vcs.stage(&[
            promoted.latest_path.clone(),
            promoted.hash_path.clone(),
            report.plot_path.clone(),
            tokenizer_store.path().clone(),
        ])?;
        let message = release_message(macro_auc, &promoted.hash);
        let commit  = vcs.commit(&message)?;

        run.advance(RunPhase::Success)?;
        Ok(ReleaseRecord { hash: promoted.hash, auc: macro_auc, commit }.into())
    }
}

/// Commit message for a promoted checkpoint.
pub fn release_message(macro_auc: f64, hash: &str) -> String {
    format!("feat: trained model with AUC={macro_auc:.3}, SHA256={hash}")
}
