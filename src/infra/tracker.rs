// ============================================================
// Layer 6 — Experiment Tracker
// ============================================================
// A local, file-backed experiment store plus model registry.
//
// Layout under the tracking directory:
//
//   mlruns/
//     registry.json                  ← named model → versions
//     <experiment>/<run_id>/
//       params.json                  ← every logged parameter
//       metrics.csv                  ← name,step,value rows
//       artifacts/                   ← copies of logged files
//
// Example metrics.csv:
//   name,step,value
//   loss,0,1.604211
//   loss,1,1.421870
//   test_auc_macro,,0.912500
//
// Registering a URI already registered under the same model
// name is reported as AlreadyRegistered, never as an error: the
// registry is versioned by content hash, so retraining to an
// identical checkpoint lands on the existing version.

use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::traits::{ExperimentTracker, Registration};

const REGISTRY_FILE: &str = "registry.json";
const METRICS_FILE:  &str = "metrics.csv";
const PARAMS_FILE:   &str = "params.json";
const ARTIFACT_DIR:  &str = "artifacts";

/// One registered version of a named model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub version: u32,
    pub uri:     String,
    pub run_id:  String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Registry {
    models: BTreeMap<String, Vec<ModelVersion>>,
}

pub struct FileExperimentTracker {
    root:       PathBuf,
    experiment: String,
    run:        Option<ActiveRun>,
}

struct ActiveRun {
    id:     String,
    dir:    PathBuf,
    params: BTreeMap<String, String>,
}

impl FileExperimentTracker {
    pub fn new(root: impl Into<PathBuf>, experiment: impl Into<String>) -> Self {
        Self { root: root.into(), experiment: experiment.into(), run: None }
    }

    fn registry_path(&self) -> PathBuf {
        self.root.join(REGISTRY_FILE)
    }

    fn active(&mut self) -> PipelineResult<&mut ActiveRun> {
        self.run
            .as_mut()
            .ok_or_else(|| PipelineError::Registry("no active run; call start_run first".into()))
    }

    fn read_registry(&self) -> PipelineResult<Registry> {
        let path = self.registry_path();
        match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                PipelineError::Registry(format!("corrupt registry '{}': {e}", path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Registry::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_registry(&self, registry: &Registry) -> PipelineResult<()> {
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(registry)
            .map_err(|e| PipelineError::Registry(e.to_string()))?;
        fs::write(self.registry_path(), json)?;
        Ok(())
    }
}

impl ExperimentTracker for FileExperimentTracker {
    fn start_run(&mut self) -> PipelineResult<String> {
        let id  = Uuid::new_v4().simple().to_string();
        let dir = self.root.join(&self.experiment).join(&id);
        fs::create_dir_all(dir.join(ARTIFACT_DIR))?;

        let mut f = fs::File::create(dir.join(METRICS_FILE))?;
        writeln!(f, "name,step,value")?;

        tracing::info!("Started tracked run {} in '{}'", id, dir.display());
        self.run = Some(ActiveRun { id: id.clone(), dir, params: BTreeMap::new() });
        Ok(id)
    }

    fn log_params(&mut self, params: &[(&str, String)]) -> PipelineResult<()> {
        let run = self.active()?;
        for (k, v) in params {
            run.params.insert((*k).to_string(), v.clone());
        }
        let json = serde_json::to_string_pretty(&run.params)
            .map_err(|e| PipelineError::Registry(e.to_string()))?;
        fs::write(run.dir.join(PARAMS_FILE), json)?;
        Ok(())
    }

    fn log_metric(&mut self, name: &str, value: f64, step: Option<usize>) -> PipelineResult<()> {
        let run = self.active()?;
        let mut f = OpenOptions::new().append(true).open(run.dir.join(METRICS_FILE))?;
        let step  = step.map(|s| s.to_string()).unwrap_or_default();
        writeln!(f, "{name},{step},{value:.6}")?;
        tracing::debug!("metric {}[{}] = {:.6}", name, step, value);
        Ok(())
    }

    fn log_artifact(&mut self, path: &Path) -> PipelineResult<()> {
        let run  = self.active()?;
        let name = path
            .file_name()
            .ok_or_else(|| PipelineError::Registry(format!("'{}' has no file name", path.display())))?;
        fs::copy(path, run.dir.join(ARTIFACT_DIR).join(name))?;
        Ok(())
    }

    fn register_model(&mut self, uri: &str, name: &str) -> PipelineResult<Registration> {
        let run_id = self.active()?.id.clone();

        let mut registry = self.read_registry()?;
        let versions = registry.models.entry(name.to_string()).or_default();
        if versions.iter().any(|v| v.uri == uri) {
            return Ok(Registration::AlreadyRegistered);
        }

        let version = versions.last().map_or(1, |v| v.version + 1);
        versions.push(ModelVersion { version, uri: uri.to_string(), run_id });
        self.write_registry(&registry)?;

        tracing::info!("Registered {} version {} ({})", name, version, uri);
        Ok(Registration::Registered { version })
    }
}
