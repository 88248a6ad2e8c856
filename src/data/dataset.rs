use std::sync::Arc;

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One encoded, padded title with its label id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          usize,
}

/// Cheap to clone: the dataloader is rebuilt every epoch with a fresh seed.
#[derive(Debug, Clone)]
pub struct ClassificationDataset {
    samples: Arc<Vec<ClassificationSample>>,
}

impl ClassificationDataset {
    pub fn new(samples: Vec<ClassificationSample>) -> Self {
        Self { samples: Arc::new(samples) }
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    pub fn labels(&self) -> impl Iterator<Item = usize> + '_ {
        self.samples.iter().map(|s| s.label)
    }
}

impl Dataset<ClassificationSample> for ClassificationDataset {
    fn get(&self, index: usize) -> Option<ClassificationSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
