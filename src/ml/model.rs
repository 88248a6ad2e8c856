use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::data::batcher::ClassificationBatch;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct TextClassifierConfig {
    pub vocab_size: usize,
    pub num_labels: usize,
    #[config(default = 64)]
    pub embed_dim:  usize,
    #[config(default = 64)]
    pub hidden_dim: usize,
    #[config(default = 0.1)]
    pub dropout:    f64,
}

impl TextClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TextClassifier<B> {
        TextClassifier {
            embedding: EmbeddingConfig::new(self.vocab_size, self.embed_dim).init(device),
            hidden:    LinearConfig::new(self.embed_dim, self.hidden_dim).init(device),
            output:    LinearConfig::new(self.hidden_dim, self.num_labels).init(device),
            dropout:   DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// Bag-of-embeddings title classifier:
/// embedding → masked mean pool → linear + ReLU → dropout → linear.
#[derive(Module, Debug)]
pub struct TextClassifier<B: Backend> {
    pub embedding: Embedding<B>,
    pub hidden:    Linear<B>,
    pub output:    Linear<B>,
    pub dropout:   Dropout,
}

impl<B: Backend> TextClassifier<B> {
    /// input_ids, attention_mask: [batch, seq_len] → logits: [batch, num_labels]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let tokens = self.embedding.forward(input_ids);                 // [b, s, d]
        let mask   = attention_mask.float().unsqueeze_dim::<3>(2);      // [b, s, 1]

        // Padding positions contribute nothing; an all-padding row divides by 1.
        let summed = (tokens * mask.clone()).sum_dim(1);                 // [b, 1, d]
        let counts = mask.sum_dim(1).clamp_min(1.0);                     // [b, 1, 1]
        let pooled = (summed / counts).squeeze::<2>(1);                  // [b, d]

        let hidden = self.dropout.forward(relu(self.hidden.forward(pooled)));
        self.output.forward(hidden)
    }

    /// Mean cross-entropy of the batch against its integer labels.
    pub fn forward_loss(&self, batch: ClassificationBatch<B>) -> Tensor<B, 1> {
        let logits = self.forward(batch.input_ids, batch.attention_mask);
        CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits, batch.labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    type TestBackend = NdArray;

    #[test]
    fn test_forward_shape() {
        let device = NdArrayDevice::default();
        let model: TextClassifier<TestBackend> =
            TextClassifierConfig::new(50, 5).with_embed_dim(8).with_hidden_dim(8).init(&device);

        let ids  = Tensor::<TestBackend, 1, Int>::from_ints([3, 4, 0, 7, 0, 0].as_slice(), &device)
            .reshape([2, 3]);
        let mask = Tensor::<TestBackend, 1, Int>::from_ints([1, 1, 0, 1, 0, 0].as_slice(), &device)
            .reshape([2, 3]);

        let logits = model.forward(ids, mask);
        assert_eq!(logits.dims(), [2, 5]);
    }

    #[test]
    fn test_padding_does_not_change_logits() {
        let device = NdArrayDevice::default();
        let model: TextClassifier<TestBackend> =
            TextClassifierConfig::new(20, 3).with_dropout(0.0).init(&device);

        let short = model.forward(
            Tensor::<TestBackend, 1, Int>::from_ints([5, 6].as_slice(), &device).reshape([1, 2]),
            Tensor::<TestBackend, 1, Int>::from_ints([1, 1].as_slice(), &device).reshape([1, 2]),
        );
        let padded = model.forward(
            Tensor::<TestBackend, 1, Int>::from_ints([5, 6, 0, 0].as_slice(), &device).reshape([1, 4]),
            Tensor::<TestBackend, 1, Int>::from_ints([1, 1, 0, 0].as_slice(), &device).reshape([1, 4]),
        );

        let a = short.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        let b = padded.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-5);
        }
    }
}
