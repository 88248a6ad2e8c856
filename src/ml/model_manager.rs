// ============================================================
// Layer 5 — Model Manager
// ============================================================
// Decides where this run's starting weights come from:
//
//   latest checkpoint exists → build the configured architecture
//                              and load the stored weights into it
//   no checkpoint            → cold start with fresh weights
//
// Stored weights are not migrated. If the configured
// architecture changed since they were written, decoding fails
// or a weight matrix has different dims, and the run stops with
// ShapeMismatch.
//
// Checkpoint bytes are Burn's named MessagePack record at full
// precision, produced in memory so the checkpoint store can hash
// exactly what it writes.

use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::infra::checkpoint::CheckpointStore;
use crate::ml::model::{TextClassifier, TextClassifierConfig};

type CheckpointRecorder = NamedMpkBytesRecorder<FullPrecisionSettings>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOrigin {
    Resumed,
    ColdStart,
}

pub struct ModelManager<'a> {
    store:  &'a CheckpointStore,
    config: TextClassifierConfig,
}

impl<'a> ModelManager<'a> {
    pub fn new(store: &'a CheckpointStore, config: TextClassifierConfig) -> Self {
        Self { store, config }
    }

    pub fn load_or_init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> PipelineResult<(TextClassifier<B>, ModelOrigin)> {
        let model = self.config.init::<B>(device);

        if !self.store.has_latest() {
            tracing::info!("Initializing new model");
            return Ok((model, ModelOrigin::ColdStart));
        }

        tracing::info!("Loading existing model from '{}'", self.store.latest_path().display());
        let bytes = self.store.read_latest()?;
        let model = decode_into(model, bytes, device)?;
        Ok((model, ModelOrigin::Resumed))
    }
}

/// Serialize a model's weights to checkpoint bytes.
pub fn encode<B: Backend>(model: &TextClassifier<B>) -> PipelineResult<Vec<u8>> {
    Recorder::<B>::record(&CheckpointRecorder::default(), model.clone().into_record(), ())
        .map_err(|e| PipelineError::Checkpoint(format!("cannot serialize model: {e:?}")))
}

/// Load checkpoint bytes into `model`, which fixes the expected architecture.
pub fn decode_into<B: Backend>(
    model:  TextClassifier<B>,
    bytes:  Vec<u8>,
    device: &B::Device,
) -> PipelineResult<TextClassifier<B>> {
    let expected = weight_dims(&model);

    let record = Recorder::<B>::load(&CheckpointRecorder::default(), bytes, device)
        .map_err(|e| PipelineError::ShapeMismatch(format!("{e:?}")))?;
    let model  = model.load_record(record);

    for ((name, want), (_, got)) in expected.iter().zip(weight_dims(&model)) {
        if *want != got {
            return Err(PipelineError::ShapeMismatch(format!(
                "{name} is {got:?} in the checkpoint, configured model expects {want:?}"
            )));
        }
    }
    Ok(model)
}

/// Weight matrix shapes; biases follow from the output dims.
fn weight_dims<B: Backend>(model: &TextClassifier<B>) -> [(&'static str, [usize; 2]); 3] {
    [
        ("embedding.weight", model.embedding.weight.val().dims()),
        ("hidden.weight",    model.hidden.weight.val().dims()),
        ("output.weight",    model.output.weight.val().dims()),
    ]
}
