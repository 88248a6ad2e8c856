// ============================================================
// Layer 6 — DVC + Git
// ============================================================
// Production implementations of the two versioning seams:
//
//   DvcStatusDetector — runs `dvc status` and reports a change
//                       when its output mentions new or modified
//                       data
//
//   DvcGitClient      — stages released artifacts with
//                       `dvc add` + `git add`, then commits with
//                       `git commit --no-verify`
//
// Every command's exit status is checked. A failed status check
// is DataVersioning; any failed staging or commit step is
// VersioningCommit. Staging verifies that every path exists
// before running anything and passes all paths to one `dvc add`.
// If any step fails, the `.dvc` pointers are put back the way
// they were.

use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::traits::{ChangeDetector, VersionControl};
use crate::infra::config::VersioningSection;

/// `dvc status` output markers that mean the tracked data moved.
const CHANGE_MARKERS: [&str; 2] = ["new", "modified"];

pub fn classify_status(stdout: &str) -> bool {
    CHANGE_MARKERS.iter().any(|m| stdout.contains(m))
}

fn run(bin: &str, args: &[&str], workdir: &Path) -> std::io::Result<Output> {
    tracing::debug!("exec: {} {}", bin, args.join(" "));
    Command::new(bin).args(args).current_dir(workdir).output()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

// ─── Change detection ─────────────────────────────────────────────────────────

pub struct DvcStatusDetector {
    dvc_bin: String,
    workdir: PathBuf,
}

impl DvcStatusDetector {
    pub fn new(settings: &VersioningSection) -> Self {
        Self { dvc_bin: settings.dvc_bin.clone(), workdir: settings.workdir.clone() }
    }
}

impl ChangeDetector for DvcStatusDetector {
    fn has_changed(&self) -> PipelineResult<bool> {
        let output = run(&self.dvc_bin, &["status"], &self.workdir).map_err(|e| {
            PipelineError::DataVersioning(format!("cannot run '{} status': {e}", self.dvc_bin))
        })?;
        if !output.status.success() {
            return Err(PipelineError::DataVersioning(format!(
                "'{} status' exited with {}: {}",
                self.dvc_bin,
                output.status,
                stderr_of(&output)
            )));
        }

        let changed = classify_status(&String::from_utf8_lossy(&output.stdout));
        if changed {
            tracing::info!("Data has changed, proceeding with training");
        } else {
            tracing::info!("No data change detected");
        }
        Ok(changed)
    }
}

// ─── Release client ───────────────────────────────────────────────────────────

pub struct DvcGitClient {
    dvc_bin: String,
    git_bin: String,
    workdir: PathBuf,
}

impl DvcGitClient {
    pub fn new(settings: &VersioningSection) -> Self {
        Self {
            dvc_bin: settings.dvc_bin.clone(),
            git_bin: settings.git_bin.clone(),
            workdir: settings.workdir.clone(),
        }
    }

    fn checked(&self, bin: &str, args: &[&str]) -> PipelineResult<Output> {
        let output = run(bin, args, &self.workdir)
            .map_err(|e| PipelineError::commit(format!("cannot run '{bin}': {e}")))?;
        if !output.status.success() {
            return Err(PipelineError::commit(format!(
                "'{bin} {}' exited with {}: {}",
                args.join(" "),
                output.status,
                stderr_of(&output)
            )));
        }
        Ok(output)
    }

    /// `dvc add` every path in one call, then `git add` the pointers.
    fn add_all(&self, paths: &[PathBuf]) -> PipelineResult<()> {
        let targets: Vec<String> = paths.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        let mut args: Vec<&str> = vec!["add"];
        args.extend(targets.iter().map(String::as_str));
        self.checked(&self.dvc_bin, &args)?;

        let mut git_paths: Vec<PathBuf> = paths.iter().map(|p| pointer_file(p)).collect();
        for path in paths {
            let ignore = path.parent().unwrap_or(Path::new("")).join(".gitignore");
            if self.workdir.join(&ignore).exists() && !git_paths.contains(&ignore) {
                git_paths.push(ignore);
            }
        }

        let git_args: Vec<String> = git_paths.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        let mut args: Vec<&str> = vec!["add"];
        args.extend(git_args.iter().map(String::as_str));
        self.checked(&self.git_bin, &args)?;
        Ok(())
    }
}

/// The `.dvc` pointer file `dvc add` writes next to `path`.
pub fn pointer_file(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".dvc");
    PathBuf::from(name)
}

/// Pointer files as they were before staging, so a failed stage can
/// put them back.
struct PointerSnapshot(Vec<(PathBuf, Option<Vec<u8>>)>);

impl PointerSnapshot {
    fn take(workdir: &Path, paths: &[PathBuf]) -> Self {
        Self(
            paths
                .iter()
                .map(|p| {
                    let pointer = workdir.join(pointer_file(p));
                    let before  = fs::read(&pointer).ok();
                    (pointer, before)
                })
                .collect(),
        )
    }

    fn restore(self) {
        for (pointer, before) in self.0 {
            let result = match before {
                Some(bytes) => fs::write(&pointer, bytes),
                None if pointer.exists() => fs::remove_file(&pointer),
                None => Ok(()),
            };
            if let Err(e) = result {
                tracing::warn!("could not roll back '{}': {}", pointer.display(), e);
            }
        }
    }
}

impl VersionControl for DvcGitClient {
    fn stage(&mut self, paths: &[PathBuf]) -> PipelineResult<()> {
        if let Some(missing) = paths.iter().find(|p| !self.workdir.join(p).exists()) {
            return Err(PipelineError::commit(format!(
                "cannot stage missing artifact '{}'",
                missing.display()
            )));
        }

        let snapshot = PointerSnapshot::take(&self.workdir, paths);
        if let Err(e) = self.add_all(paths) {
            snapshot.restore();
            return Err(e);
        }

        tracing::info!("Staged {} artifacts", paths.len());
        Ok(())
    }

    fn commit(&mut self, message: &str) -> PipelineResult<String> {
        self.checked(&self.git_bin, &["commit", "--no-verify", "-m", message])?;
        let head = self.checked(&self.git_bin, &["rev-parse", "HEAD"])?;
        let reference = String::from_utf8_lossy(&head.stdout).trim().to_string();
        if reference.is_empty() {
            return Err(PipelineError::commit("git rev-parse HEAD returned nothing"));
        }
        tracing::info!("Committed release {}", reference);
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(workdir: &Path, bin: &str) -> VersioningSection {
        VersioningSection {
            workdir: workdir.to_path_buf(),
            dvc_bin: bin.to_string(),
            git_bin: bin.to_string(),
        }
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status("data/labeled.dvc:\n\tchanged outs:\n\t\tmodified:  data/labeled\n"));
        assert!(classify_status("data.dvc:\n\tchanged outs:\n\t\tnew:  data/x.json\n"));
        assert!(!classify_status("Data and pipelines are up to date.\n"));
        assert!(!classify_status(""));
    }

    #[test]
    fn test_pointer_file_appends_extension() {
        assert_eq!(
            pointer_file(Path::new("models/latest_model.mpk")),
            PathBuf::from("models/latest_model.mpk.dvc")
        );
    }

    #[test]
    fn test_missing_binary_is_data_versioning_error() {
        let dir = tempfile::tempdir().unwrap();
        let detector = DvcStatusDetector::new(&settings(dir.path(), "definitely-not-a-dvc-binary"));
        assert!(matches!(detector.has_changed(), Err(PipelineError::DataVersioning(_))));
    }

    #[test]
    fn test_stage_refuses_missing_paths_before_running_anything() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("present.bin"), b"x").unwrap();

        // the binary does not exist, so reaching a command would also fail;
        // the message shows the existence check fired first
        let mut client = DvcGitClient::new(&settings(dir.path(), "definitely-not-a-binary"));
        let err = client
            .stage(&[PathBuf::from("present.bin"), PathBuf::from("absent.bin")])
            .unwrap_err();
        match err {
            PipelineError::VersioningCommit(msg) => assert!(msg.contains("absent.bin"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_stage_rolls_back_pointer_files() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        for name in ["a.bin", "b.bin", "c.bin"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::write(dir.path().join("a.bin.dvc"), b"outs: previous\n").unwrap();

        // writes a pointer for every target, logs its arguments, then fails
        let script = dir.path().join("fake-dvc");
        fs::write(
            &script,
            "#!/bin/sh\necho \"$@\" >> calls.log\nshift\nfor p in \"$@\"; do echo new > \"$p.dvc\"; done\nexit 1\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let mut client = DvcGitClient::new(&VersioningSection {
            workdir: dir.path().to_path_buf(),
            dvc_bin: script.to_string_lossy().into_owned(),
            git_bin: "definitely-not-a-binary".to_string(),
        });
        let paths: Vec<PathBuf> = ["a.bin", "b.bin", "c.bin"].iter().map(PathBuf::from).collect();
        let err = client.stage(&paths).unwrap_err();

        assert!(matches!(err, PipelineError::VersioningCommit(_)));
        assert_eq!(fs::read_to_string(dir.path().join("calls.log")).unwrap(), "add a.bin b.bin c.bin\n");
        assert_eq!(fs::read(dir.path().join("a.bin.dvc")).unwrap(), b"outs: previous\n");
        assert!(!dir.path().join("b.bin.dvc").exists());
        assert!(!dir.path().join("c.bin.dvc").exists());
    }

    #[test]
    fn test_commit_failure_is_versioning_commit() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = DvcGitClient::new(&settings(dir.path(), "definitely-not-a-binary"));
        assert!(matches!(client.commit("msg"), Err(PipelineError::VersioningCommit(_))));
    }
}
