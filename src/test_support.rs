// Shared fixtures for unit tests: the 20-title labeled snapshot,
// a scratch configuration, and in-memory fakes for every
// collaborator trait. The fakes write what they were asked to do
// into one shared CallLog so tests can assert on it afterwards.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::observation::Observations;
use crate::domain::record::RawRecord;
use crate::domain::traits::{
    ChangeDetector, ExperimentTracker, RecordSource, Registration, VersionControl,
};
use crate::infra::config::PipelineConfig;

/// 20 notice titles: 17 in known categories, 2 in categories outside the
/// vocabulary (indices 17, 18) and one blank title (index 19).
pub fn notice_snapshot() -> Vec<RawRecord> {
    [
        ("关于国庆节放假安排的通知", "放假通知"),
        ("元旦放假通知", "放假通知"),
        ("清明节放假安排", "放假通知"),
        ("寒假放假时间通知", "放假通知"),
        ("人工智能前沿学术讲座", "学术活动"),
        ("青年学者学术论坛", "学术活动"),
        ("国际学术会议征稿", "学术活动"),
        ("学术沙龙第十期", "学术活动"),
        ("关于调整办公时间的行政通知", "行政通知"),
        ("校园网络维护行政公告", "行政通知"),
        ("行政楼搬迁通知", "行政通知"),
        ("关于报销流程的行政通知", "行政通知"),
        ("2025届毕业生招聘会", "招聘信息"),
        ("企业校园招聘宣讲", "招聘信息"),
        ("实验室招聘科研助理", "招聘信息"),
        ("图书馆开放时间调整", "其他"),
        ("食堂菜单更新", "其他"),
        ("运动会报名开始", "体育活动"),
        ("校园歌手大赛", "文艺活动"),
        ("   ", "招聘信息"),
    ]
    .iter()
    .map(|(title, category)| RawRecord::new(*title, *category))
    .collect()
}

/// A small, fast configuration rooted in `root`.
pub fn test_config(root: &Path, epochs: usize, learning_rate: f64) -> PipelineConfig {
    let yaml = format!(
        r#"
model:
  name: notice-title-classifier
  num_labels: 5
  vocab_size: 256
  embed_dim: 32
  hidden_dim: 32
training:
  epochs: {epochs}
  batch_size: 4
  learning_rate: {learning_rate}
  seed: 7
  device: cpu
data:
  path: "{data}"
  max_length: 16
paths:
  models_dir: "{root}/models"
  reports_dir: "{root}/reports"
  tracking_dir: "{root}/mlruns"
  lock_file: "{root}/.retrain.lock"
"#,
        data = root.join("notices.json").display(),
        root = root.display(),
    );
    match PipelineConfig::from_yaml_str(&yaml) {
        Ok(cfg) => cfg,
        Err(e) => panic!("test config is invalid: {e}"),
    }
}

// ─── Call log ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
pub struct Calls {
    pub status_checks: usize,
    pub loads:         usize,
    pub runs_started:  usize,
    pub params:        Vec<(String, String)>,
    pub metrics:       Vec<(String, Option<usize>, f64)>,
    pub artifacts:     Vec<PathBuf>,
    pub registered:    Vec<(String, String)>,
    pub staged:        Vec<PathBuf>,
    pub commits:       Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct CallLog(Arc<Mutex<Calls>>);

impl CallLog {
    pub fn snapshot(&self) -> Calls {
        self.0.lock().unwrap().clone()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Calls) -> R) -> R {
        f(&mut self.0.lock().unwrap())
    }
}

// ─── Fakes ────────────────────────────────────────────────────────────────────

pub struct FakeDetector {
    changed: bool,
    log:     CallLog,
}

impl FakeDetector {
    pub fn new(changed: bool, log: &CallLog) -> Self {
        Self { changed, log: log.clone() }
    }
}

impl ChangeDetector for FakeDetector {
    fn has_changed(&self) -> PipelineResult<bool> {
        self.log.with(|c| c.status_checks += 1);
        Ok(self.changed)
    }
}

pub struct FakeSource {
    records: Vec<RawRecord>,
    log:     CallLog,
}

impl FakeSource {
    pub fn new(records: Vec<RawRecord>, log: &CallLog) -> Self {
        Self { records, log: log.clone() }
    }
}

impl RecordSource for FakeSource {
    fn load(&self, _observations: &mut Observations) -> PipelineResult<Vec<RawRecord>> {
        self.log.with(|c| c.loads += 1);
        Ok(self.records.clone())
    }
}

pub struct FakeTracker {
    registry_full: bool,
    log:           CallLog,
}

impl FakeTracker {
    pub fn new(log: &CallLog) -> Self {
        Self { registry_full: false, log: log.clone() }
    }

    /// A tracker whose registry already holds every URI it is offered.
    pub fn already_registered(log: &CallLog) -> Self {
        Self { registry_full: true, log: log.clone() }
    }
}

impl ExperimentTracker for FakeTracker {
    fn start_run(&mut self) -> PipelineResult<String> {
        let n = self.log.with(|c| {
            c.runs_started += 1;
            c.runs_started
        });
        Ok(format!("run-{n}"))
    }

    fn log_params(&mut self, params: &[(&str, String)]) -> PipelineResult<()> {
        self.log.with(|c| {
            c.params.extend(params.iter().map(|(k, v)| (k.to_string(), v.clone())))
        });
        Ok(())
    }

    fn log_metric(&mut self, name: &str, value: f64, step: Option<usize>) -> PipelineResult<()> {
        self.log.with(|c| c.metrics.push((name.to_string(), step, value)));
        Ok(())
    }

    fn log_artifact(&mut self, path: &Path) -> PipelineResult<()> {
        self.log.with(|c| c.artifacts.push(path.to_path_buf()));
        Ok(())
    }

    fn register_model(&mut self, uri: &str, name: &str) -> PipelineResult<Registration> {
        let registration = self.log.with(|c| {
            let entry = (uri.to_string(), name.to_string());
            if self.registry_full || c.registered.contains(&entry) {
                return Registration::AlreadyRegistered;
            }
            c.registered.push(entry);
            Registration::Registered { version: c.registered.len() as u32 }
        });
        Ok(registration)
    }
}

pub struct FakeVcs {
    fail_commit: bool,
    log:         CallLog,
}

impl FakeVcs {
    pub fn new(log: &CallLog) -> Self {
        Self { fail_commit: false, log: log.clone() }
    }

    pub fn failing_commit(log: &CallLog) -> Self {
        Self { fail_commit: true, log: log.clone() }
    }
}

impl VersionControl for FakeVcs {
    fn stage(&mut self, paths: &[PathBuf]) -> PipelineResult<()> {
        if let Some(missing) = paths.iter().find(|p| !p.exists()) {
            return Err(PipelineError::commit(format!("missing '{}'", missing.display())));
        }
        self.log.with(|c| c.staged.extend_from_slice(paths));
        Ok(())
    }

    fn commit(&mut self, message: &str) -> PipelineResult<String> {
        if self.fail_commit {
            return Err(PipelineError::commit("commit rejected"));
        }
        let n = self.log.with(|c| {
            c.commits.push(message.to_string());
            c.commits.len()
        });
        Ok(format!("fake-commit-{n}"))
    }
}
