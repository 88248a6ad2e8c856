// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fixed number of epochs over the full training set in shuffled
// mini-batches with Adam and cross-entropy loss. No early
// stopping and no learning-rate schedule.
//
// Per epoch:
//   - check the cancellation flag
//   - rebuild the DataLoader with seed + epoch so every epoch
//     sees a different (but reproducible) order
//   - forward → loss → backward → Adam step for each batch
//   - report the mean batch loss through `on_epoch`
//
// A NaN or infinite batch loss stops the run with
// TrainingNumerical instead of training on garbage.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use burn::{
    data::dataloader::DataLoaderBuilder,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};

use crate::data::{batcher::ClassificationBatcher, dataset::ClassificationDataset};
use crate::domain::cancel::CancelFlag;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::ml::model::TextClassifier;

#[derive(Debug, Clone)]
pub struct TrainerSettings {
    pub epochs:        usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    pub seed:          u64,
}

pub struct Trainer<'a> {
    settings: &'a TrainerSettings,
    cancel:   &'a CancelFlag,
}

impl<'a> Trainer<'a> {
    pub fn new(settings: &'a TrainerSettings, cancel: &'a CancelFlag) -> Self {
        Self { settings, cancel }
    }

    /// Returns the trained model and the per-epoch mean loss trace.
    /// `on_epoch(epoch, avg_loss)` runs after each epoch, numbered from 0.
    pub fn fit<B: AutodiffBackend>(
        &self,
        mut model: TextClassifier<B>,
        dataset:   ClassificationDataset,
        device:    &B::Device,
        on_epoch:  &mut dyn FnMut(usize, f64) -> PipelineResult<()>,
    ) -> PipelineResult<(TextClassifier<B>, Vec<f64>)> {
        let cfg = self.settings;
        if dataset.sample_count() == 0 {
            return Err(PipelineError::data_format("training set is empty"));
        }

        let mut optim      = AdamConfig::new().init();
        let mut loss_trace = Vec::with_capacity(cfg.epochs);

        for epoch in 0..cfg.epochs {
            self.cancel.check("epoch")?;

            let loader = DataLoaderBuilder::new(ClassificationBatcher::<B>::new(device.clone()))
                .batch_size(cfg.batch_size)
                .shuffle(cfg.seed.wrapping_add(epoch as u64))
                .build(dataset.clone());

            let mut loss_sum = 0.0f64;
            let mut batches  = 0usize;

            for batch in loader.iter() {
                let loss = model.forward_loss(batch);

                let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
                if !loss_val.is_finite() {
                    return Err(PipelineError::TrainingNumerical { epoch, batch: batches });
                }
                loss_sum += loss_val;
                batches  += 1;

                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(cfg.learning_rate, model, grads);
            }

            let avg_loss = loss_sum / batches.max(1) as f64;
            tracing::info!("epoch[{}/{}] avg_loss[{:.6}]", epoch + 1, cfg.epochs, avg_loss);
            on_epoch(epoch, avg_loss)?;
            loss_trace.push(avg_loss);
        }

        Ok((model, loss_trace))
    }
}
