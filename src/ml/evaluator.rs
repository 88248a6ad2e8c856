// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Scores the evaluation set and reduces the scores to AUC:
//
//   logits → softmax → per-class one-vs-rest ROC → trapezoid AUC
//   macro AUC = unweighted mean over classes with a defined AUC
//
// A class whose binarized ground truth is all-positive or
// all-negative has no ROC curve. It is reported as an
// UndefinedAuc observation and left out of the mean. If every
// class is undefined the macro value is NaN, which the gate
// always rejects.
//
// Runs on a non-autodiff backend (`model.valid()`), so dropout
// is inactive and no graph is recorded.

use std::path::PathBuf;

use burn::{
    data::dataloader::DataLoaderBuilder,
    prelude::*,
    tensor::{activation::softmax, TensorData},
};

use crate::data::{batcher::ClassificationBatcher, dataset::ClassificationDataset};
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::labels::LabelVocabulary;
use crate::domain::observation::{Observation, Observations};
use crate::infra::plot::{write_roc_svg, PlotSeries};
use crate::ml::model::TextClassifier;
use crate::ml::roc::{roc_curve, RocCurve};

#[derive(Debug, Clone, PartialEq)]
pub struct ClassAuc {
    pub label: String,
    /// `None` when the class is all-positive or all-negative in the evaluation set.
    pub auc:   Option<f64>,
    pub curve: Option<RocCurve>,
}

#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub per_class: Vec<ClassAuc>,
    pub macro_auc: f64,
    pub plot_path: PathBuf,
}

pub struct Evaluator<'a> {
    vocab:      &'a LabelVocabulary,
    batch_size: usize,
    plot_path:  PathBuf,
}

impl<'a> Evaluator<'a> {
    pub fn new(vocab: &'a LabelVocabulary, batch_size: usize, plot_path: impl Into<PathBuf>) -> Self {
        Self { vocab, batch_size, plot_path: plot_path.into() }
    }

    pub fn evaluate<B: Backend>(
        &self,
        model:        &TextClassifier<B>,
        dataset:      ClassificationDataset,
        device:       &B::Device,
        observations: &mut Observations,
    ) -> PipelineResult<EvaluationReport> {
        let truth: Vec<usize> = dataset.labels().collect();
        let probs = predict_probabilities(model, dataset, self.batch_size, device)?;

        let (per_class, macro_auc) = summarize(self.vocab.names(), &probs, &truth);
        for class in per_class.iter().filter(|c| c.auc.is_none()) {
            observations.record(Observation::UndefinedAuc { label: class.label.clone() });
        }

        let series: Vec<PlotSeries<'_>> = per_class
            .iter()
            .filter_map(|c| match (c.auc, &c.curve) {
                (Some(auc), Some(curve)) => Some(PlotSeries { label: &c.label, auc, curve }),
                _ => None,
            })
            .collect();
        write_roc_svg(&self.plot_path, &series, macro_auc)?;

        tracing::info!("Evaluated {} samples, macro AUC {:.4}", truth.len(), macro_auc);
        Ok(EvaluationReport { per_class, macro_auc, plot_path: self.plot_path.clone() })
    }
}

/// Softmax class probabilities for every sample, in dataset order.
pub fn predict_probabilities<B: Backend>(
    model:      &TextClassifier<B>,
    dataset:    ClassificationDataset,
    batch_size: usize,
    device:     &B::Device,
) -> PipelineResult<Vec<Vec<f64>>> {
    let loader = DataLoaderBuilder::new(ClassificationBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .build(dataset);

    let mut rows = Vec::new();
    for batch in loader.iter() {
        let probs      = softmax(model.forward(batch.input_ids, batch.attention_mask), 1);
        let [_, width] = probs.dims();
        rows.extend(probability_rows(probs.into_data().convert::<f32>(), width)?);
    }
    Ok(rows)
}

/// Split a flat `[n, width]` f32 tensor readback into rows.
fn probability_rows(data: TensorData, width: usize) -> PipelineResult<Vec<Vec<f64>>> {
    let flat = data
        .to_vec::<f32>()
        .map_err(|e| PipelineError::Evaluation(format!("cannot read predictions: {e:?}")))?;
    Ok(flat
        .chunks(width.max(1))
        .map(|row| row.iter().map(|&p| p as f64).collect())
        .collect())
}

/// One-vs-rest AUC per label and their macro mean.
pub fn summarize(labels: &[String], probs: &[Vec<f64>], truth: &[usize]) -> (Vec<ClassAuc>, f64) {
    let per_class: Vec<ClassAuc> = labels
        .iter()
        .enumerate()
        .map(|(id, label)| {
            let binary: Vec<bool> = truth.iter().map(|&t| t == id).collect();
            let scores: Vec<f64>  = probs.iter().map(|row| row.get(id).copied().unwrap_or(0.0)).collect();
            let curve = roc_curve(&binary, &scores);
            ClassAuc { label: label.clone(), auc: curve.as_ref().map(RocCurve::auc), curve }
        })
        .collect();

    let defined: Vec<f64> = per_class.iter().filter_map(|c| c.auc).collect();
    let macro_auc = if defined.is_empty() {
        f64::NAN
    } else {
        defined.iter().sum::<f64>() / defined.len() as f64
    };

    (per_class, macro_auc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    use crate::data::dataset::ClassificationSample;
    use crate::ml::model::TextClassifierConfig;

    #[test]
    fn test_probability_rows_split_by_width() {
        let data = TensorData::new(vec![0.25f32, 0.75, 0.5, 0.5], [2, 2]);
        assert_eq!(probability_rows(data, 2).unwrap(), vec![vec![0.25, 0.75], vec![0.5, 0.5]]);
    }

    #[test]
    fn test_unreadable_predictions_are_evaluation_error() {
        let data = TensorData::new(vec![1i64, 2], [1, 2]);
        assert!(matches!(probability_rows(data, 2), Err(PipelineError::Evaluation(_))));
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("c{i}")).collect()
    }

    #[test]
    fn test_perfect_scores_give_macro_one() {
        let probs = vec![
            vec![0.9, 0.05, 0.05],
            vec![0.1, 0.8, 0.1],
            vec![0.2, 0.1, 0.7],
            vec![0.6, 0.3, 0.1],
        ];
        let (per_class, macro_auc) = summarize(&names(3), &probs, &[0, 1, 2, 0]);
        assert_eq!(per_class.len(), 3);
        assert!(per_class.iter().all(|c| c.auc == Some(1.0)));
        assert!((macro_auc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_absent_class_is_excluded_from_macro() {
        // class 2 never occurs, class 0 ranks perfectly, class 1 scores are tied
        let probs = vec![vec![0.9, 0.0, 0.1], vec![0.2, 0.0, 0.8]];
        let (per_class, macro_auc) = summarize(&names(3), &probs, &[0, 1]);
        assert_eq!(per_class[0].auc, Some(1.0));
        assert_eq!(per_class[1].auc, Some(0.5));
        assert_eq!(per_class[2].auc, None);
        assert!((macro_auc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_all_classes_undefined_is_nan() {
        let probs = vec![vec![0.5, 0.5], vec![0.4, 0.6]];
        let (per_class, macro_auc) = summarize(&names(2), &probs, &[0, 0]);
        assert_eq!(per_class[0].auc, None);
        assert_eq!(per_class[1].auc, None);
        assert!(macro_auc.is_nan());
    }

    #[test]
    fn test_evaluate_writes_plot_and_records_undefined_classes() {
        let device = NdArrayDevice::default();
        let model: TextClassifier<NdArray> =
            TextClassifierConfig::new(10, 3).with_embed_dim(4).with_hidden_dim(4).init(&device);
        let vocab = LabelVocabulary::new(&["a", "b", "c"], "c").unwrap();

        let samples = (0..6)
            .map(|i| ClassificationSample {
                input_ids:      vec![2 + i as u32, 0],
                attention_mask: vec![1, 0],
                label:          i % 2,
            })
            .collect();

        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("roc_curve.svg");
        let mut obs = Observations::new();

        let report = Evaluator::new(&vocab, 4, &path)
            .evaluate(&model, ClassificationDataset::new(samples), &device, &mut obs)
            .unwrap();

        assert_eq!(report.per_class.len(), 3);
        assert!(report.per_class[2].auc.is_none());
        assert!(report.macro_auc.is_finite());
        assert!(report.plot_path.exists());
        assert_eq!(obs.len(), 1);
        assert!(matches!(
            obs.iter().next(),
            Some(Observation::UndefinedAuc { label }) if label == "c"
        ));
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let device = NdArrayDevice::default();
        let model: TextClassifier<NdArray> = TextClassifierConfig::new(10, 4).init(&device);
        let samples = (0..5)
            .map(|i| ClassificationSample {
                input_ids:      vec![3, 4, i as u32],
                attention_mask: vec![1, 1, 1],
                label:          0,
            })
            .collect();
        let rows = predict_probabilities(&model, ClassificationDataset::new(samples), 2, &device).unwrap();
        assert_eq!(rows.len(), 5);
        for row in rows {
            assert_eq!(row.len(), 4);
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-4);
        }
    }
}
