// ============================================================
// Layer 6 — Checkpoint Store
// ============================================================
// Owns the "latest" checkpoint slot and the content-addressed
// history behind it.
//
// Layout under the models directory:
//
//   models/
//     latest_model.mpk        ← current checkpoint bytes
//     latest_model.sha256     ← hex SHA-256 of latest_model.mpk
//     store/<sha256>.mpk      ← every promoted checkpoint, by hash
//
// The latest file plus its sidecar form the "current pointer".
// They change only in `promote`, which is called only after the
// promotion gate accepted a run.
//
// Promotion order:
//   1. write bytes to a temp file in the models directory
//   2. stream the temp file through SHA-256 in 4 KiB chunks
//   3. copy it into store/<hash>.mpk (skipped if present)
//   4. rename the temp file over latest_model.mpk
//   5. write the sidecar

use std::{
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};

use crate::domain::error::{PipelineError, PipelineResult};

const LATEST_FILE:  &str = "latest_model.mpk";
const HASH_FILE:    &str = "latest_model.sha256";
const STORE_DIR:    &str = "store";
const HASH_CHUNK:   usize = 4096;

/// Result of a successful promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotedCheckpoint {
    pub hash:        String,
    pub latest_path: PathBuf,
    pub hash_path:   PathBuf,
    pub store_path:  PathBuf,
}

impl PromotedCheckpoint {
    /// Registry URI; the registry is versioned by content hash.
    pub fn uri(&self) -> String {
        format!("store://{}", self.hash)
    }
}

/// Outcome of comparing the latest checkpoint against its sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integrity {
    Verified { hash: String },
    Mismatch { recorded: String, actual: String },
    Missing,
}

pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn latest_path(&self) -> PathBuf {
        self.dir.join(LATEST_FILE)
    }

    pub fn hash_path(&self) -> PathBuf {
        self.dir.join(HASH_FILE)
    }

    pub fn store_path(&self, hash: &str) -> PathBuf {
        self.dir.join(STORE_DIR).join(format!("{hash}.mpk"))
    }

    pub fn has_latest(&self) -> bool {
        self.latest_path().is_file()
    }

    pub fn read_latest(&self) -> PipelineResult<Vec<u8>> {
        let path = self.latest_path();
        fs::read(&path).map_err(|e| {
            PipelineError::Checkpoint(format!("cannot read '{}': {e}", path.display()))
        })
    }

    /// Hash recorded in the sidecar, if any.
    pub fn recorded_hash(&self) -> PipelineResult<Option<String>> {
        match fs::read_to_string(self.hash_path()) {
            Ok(s) => Ok(Some(s.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist `bytes` as the new latest checkpoint and return its identity.
    pub fn promote(&self, bytes: &[u8]) -> PipelineResult<PromotedCheckpoint> {
        fs::create_dir_all(self.dir.join(STORE_DIR))?;

        let tmp_path = self.dir.join(format!(".{LATEST_FILE}.{}.tmp", std::process::id()));
        {
            let mut f = File::create(&tmp_path)?;
            f.write_all(bytes)?;
            f.sync_all()?;
        }

        let hash = match hash_file(&tmp_path) {
            Ok(h)  => h,
            Err(e) => {
                fs::remove_file(&tmp_path).ok();
                return Err(e);
            }
        };

        let store_path = self.store_path(&hash);
        if !store_path.exists() {
            fs::copy(&tmp_path, &store_path)?;
        }

        let latest_path = self.latest_path();
        fs::rename(&tmp_path, &latest_path)?;

        let hash_path = self.hash_path();
        fs::write(&hash_path, &hash)?;

        tracing::info!(
            "Promoted checkpoint {} ({} bytes) to '{}'",
            hash,
            bytes.len(),
            latest_path.display()
        );

        Ok(PromotedCheckpoint { hash, latest_path, hash_path, store_path })
    }

    /// Recompute the latest checkpoint's digest and compare with the sidecar.
    pub fn verify(&self) -> PipelineResult<Integrity> {
        let Some(recorded) = self.recorded_hash()? else {
            return Ok(Integrity::Missing);
        };
        if !self.has_latest() {
            return Ok(Integrity::Missing);
        }
        let actual = hash_file(&self.latest_path())?;
        if actual == recorded {
            Ok(Integrity::Verified { hash: actual })
        } else {
            Ok(Integrity::Mismatch { recorded, actual })
        }
    }
}

/// Lowercase hex SHA-256 of a file, read in fixed-size chunks.
pub fn hash_file(path: &Path) -> PipelineResult<String> {
    let mut file   = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf    = [0u8; HASH_CHUNK];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha256_hex(bytes: &[u8]) -> String {
        format!("{:x}", Sha256::digest(bytes))
    }

    #[test]
    fn test_hash_file_matches_one_shot_digest() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        // spans several chunks and ends mid-chunk
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();
        assert_eq!(hash_file(&path).unwrap(), sha256_hex(&data));
    }

    #[test]
    fn test_promote_round_trip_integrity() {
        let dir   = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let promoted = store.promote(b"weights v1").unwrap();

        let saved = fs::read(store.latest_path()).unwrap();
        assert_eq!(saved, b"weights v1");
        assert_eq!(promoted.hash, sha256_hex(&saved));
        assert_eq!(fs::read_to_string(store.hash_path()).unwrap(), promoted.hash);
        assert_eq!(fs::read(&promoted.store_path).unwrap(), b"weights v1");
        assert_eq!(store.verify().unwrap(), Integrity::Verified { hash: promoted.hash.clone() });
        assert_eq!(promoted.uri(), format!("store://{}", promoted.hash));
    }

    #[test]
    fn test_promote_overwrites_latest_and_keeps_history() {
        let dir   = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let first  = store.promote(b"one").unwrap();
        let second = store.promote(b"two").unwrap();

        assert_ne!(first.hash, second.hash);
        assert_eq!(store.read_latest().unwrap(), b"two");
        assert_eq!(store.recorded_hash().unwrap(), Some(second.hash));
        assert!(first.store_path.exists());
    }

    #[test]
    fn test_verify_detects_tampering() {
        let dir   = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        store.promote(b"original").unwrap();
        fs::write(store.latest_path(), b"tampered").unwrap();
        assert!(matches!(store.verify().unwrap(), Integrity::Mismatch { .. }));
    }

    #[test]
    fn test_empty_store() {
        let dir   = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("models"));
        assert!(!store.has_latest());
        assert_eq!(store.recorded_hash().unwrap(), None);
        assert_eq!(store.verify().unwrap(), Integrity::Missing);
    }
}
