// ============================================================
// Layer 6 — Pipeline Configuration
// ============================================================
// Loaded from a YAML parameters file (params.yaml by default):
//
//   model:    name, num_labels, [labels, fallback_label,
//             vocab_size, embed_dim, hidden_dim, dropout]
//   training: epochs, batch_size, learning_rate,
//             [seed, device, timeout_secs]
//   data:     path, max_length, [holdout_fraction]
//   paths / versioning / tracking: all optional
//
// Keys in brackets have defaults. A missing required key or an
// invalid value is a ConfigError and stops the run before any
// state is touched.

use std::{fs, path::{Path, PathBuf}, time::Duration};

use serde::{de, Deserialize, Deserializer};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::labels::{LabelVocabulary, DEFAULT_FALLBACK, DEFAULT_LABELS};
use crate::domain::run::RunParams;

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub model:    ModelSection,
    pub training: TrainingSection,
    pub data:     DataSection,
    #[serde(default)]
    pub paths:      PathsSection,
    #[serde(default)]
    pub versioning: VersioningSection,
    #[serde(default)]
    pub tracking:   TrackingSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSection {
    pub name:       String,
    pub num_labels: usize,
    #[serde(default = "default_labels")]
    pub labels:         Vec<String>,
    #[serde(default = "default_fallback")]
    pub fallback_label: String,
    #[serde(default = "default_vocab_size")]
    pub vocab_size: usize,
    #[serde(default = "default_dim")]
    pub embed_dim:  usize,
    #[serde(default = "default_dim")]
    pub hidden_dim: usize,
    #[serde(default = "default_dropout")]
    pub dropout:    f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingSection {
    pub epochs:     usize,
    pub batch_size: usize,
    #[serde(deserialize_with = "lenient_f64")]
    pub learning_rate: f64,
    #[serde(default = "default_seed")]
    pub seed:   u64,
    #[serde(default)]
    pub device: DeviceKind,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSection {
    pub path:       PathBuf,
    pub max_length: usize,
    #[serde(default)]
    pub holdout_fraction: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub models_dir:   PathBuf,
    pub reports_dir:  PathBuf,
    pub tracking_dir: PathBuf,
    pub lock_file:    PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            models_dir:   PathBuf::from("models"),
            reports_dir:  PathBuf::from("reports"),
            tracking_dir: PathBuf::from("mlruns"),
            lock_file:    PathBuf::from(".retrain.lock"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VersioningSection {
    pub workdir: PathBuf,
    pub dvc_bin: String,
    pub git_bin: String,
}

impl Default for VersioningSection {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            dvc_bin: "dvc".to_string(),
            git_bin: "git".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingSection {
    pub experiment:       String,
    pub registered_model: String,
}

impl Default for TrackingSection {
    fn default() -> Self {
        Self {
            experiment:       "nlp-text-classification".to_string(),
            registered_model: "NLPTextClassifier".to_string(),
        }
    }
}

/// Where training runs. Resolved to a concrete Burn backend once, in the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Best adapter WGPU can find (falls back to a CPU adapter).
    #[default]
    Auto,
    Cpu,
    Gpu,
}

fn default_labels() -> Vec<String> {
    DEFAULT_LABELS.iter().map(|s| s.to_string()).collect()
}
fn default_fallback() -> String { DEFAULT_FALLBACK.to_string() }
fn default_vocab_size() -> usize { 8192 }
fn default_dim() -> usize { 64 }
fn default_dropout() -> f64 { 0.1 }
fn default_seed() -> u64 { 42 }

/// Accepts `2e-5` as well as `"2e-5"`.
fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrText {
        Num(f64),
        Text(String),
    }

    match NumOrText::deserialize(d)? {
        NumOrText::Num(v)  => Ok(v),
        NumOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("'{s}' is not a number"))),
    }
}

impl PipelineConfig {
    /// Read, parse and validate a YAML parameters file.
    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            PipelineError::config(format!("cannot read '{}': {e}", path.display()))
        })?;
        let cfg = Self::from_yaml_str(&text)?;
        tracing::info!("Loaded configuration from '{}'", path.display());
        Ok(cfg)
    }

    pub fn from_yaml_str(text: &str) -> PipelineResult<Self> {
        let cfg: Self = serde_yaml::from_str(text)
            .map_err(|e| PipelineError::config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        let t = &self.training;
        if t.epochs == 0 {
            return Err(PipelineError::config("training.epochs must be at least 1"));
        }
        if t.batch_size == 0 {
            return Err(PipelineError::config("training.batch_size must be at least 1"));
        }
        if !t.learning_rate.is_finite() || t.learning_rate <= 0.0 {
            return Err(PipelineError::config(format!(
                "training.learning_rate must be a positive number, got {}",
                t.learning_rate
            )));
        }
        if self.data.max_length == 0 {
            return Err(PipelineError::config("data.max_length must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.data.holdout_fraction) {
            return Err(PipelineError::config("data.holdout_fraction must be in [0, 1)"));
        }
        if self.model.vocab_size <= 2 {
            return Err(PipelineError::config("model.vocab_size must exceed the two special tokens"));
        }
        if !(0.0..1.0).contains(&self.model.dropout) {
            return Err(PipelineError::config("model.dropout must be in [0, 1)"));
        }
        if self.model.num_labels != self.model.labels.len() {
            return Err(PipelineError::config(format!(
                "model.num_labels is {} but {} labels are configured",
                self.model.num_labels,
                self.model.labels.len()
            )));
        }
        // uniqueness and fallback membership
        self.label_vocabulary().map(|_| ())
    }

    pub fn label_vocabulary(&self) -> PipelineResult<LabelVocabulary> {
        LabelVocabulary::new(&self.model.labels, &self.model.fallback_label)
    }

    pub fn run_params(&self) -> RunParams {
        RunParams {
            model_name:    self.model.name.clone(),
            epochs:        self.training.epochs,
            batch_size:    self.training.batch_size,
            learning_rate: self.training.learning_rate,
            max_length:    self.data.max_length,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.training.timeout_secs.map(Duration::from_secs)
    }

    pub fn roc_plot_path(&self) -> PathBuf {
        self.paths.reports_dir.join("roc_curve.svg")
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.paths.models_dir.join("tokenizer.json")
    }
}
