//! Checkpoint persistence
//!
//! A checkpoint is a consistent snapshot of everything a restart needs:
//! model parameters, opaque optimizer state, the global step counter, the
//! run configuration, and the validation history. Snapshots are taken only
//! at epoch boundaries with a fully-applied optimizer state — never
//! mid-accumulation-window.
//!
//! Writes are atomic: the payload goes to a temporary sibling file and is
//! published with a rename, so a crash can never leave a half-written file
//! at the checkpoint path. A SHA-256 digest over the payload is stored
//! alongside it and verified on load; a mismatch fails the load rather than
//! resuming from corrupt state.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::train::monitor::ValidationHistory;

/// Checkpoint file name for a given epoch
pub fn epoch_checkpoint_path(dir: &Path, epoch: u64) -> PathBuf {
    dir.join(format!("checkpoint_epoch_{epoch}.json"))
}

/// Checkpoint file name for the best-metric snapshot
pub fn best_checkpoint_path(dir: &Path) -> PathBuf {
    dir.join("checkpoint_best.json")
}

/// A resumable training snapshot, immutable once written
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Flat model parameters
    pub parameters: Vec<f32>,
    /// Opaque optimizer state (moment buffers etc.), owned by the collaborator
    pub optimizer_state: serde_json::Value,
    /// Optimizer updates applied so far
    pub global_step: u64,
    /// Last completed epoch
    pub epoch: u64,
    /// The run configuration the snapshot was taken under
    pub config: RunConfig,
    /// Validation metric history up to and including `epoch`
    pub history: ValidationHistory,
    /// Snapshot creation time
    pub created_at: DateTime<Utc>,
}

/// On-disk envelope: the serialized checkpoint plus its SHA-256 digest
///
/// The payload is embedded as a string so the digest is computed and later
/// verified over the exact stored bytes. Re-serializing parsed JSON is not
/// byte-stable for floats (the last ULP can shift on parse), so hashing a
/// re-serialization would reject valid checkpoints.
#[derive(Serialize, Deserialize)]
struct Envelope {
    checksum: String,
    checkpoint: String,
}

fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

impl Checkpoint {
    /// Write the checkpoint atomically to `path`
    ///
    /// Serializes to a `.tmp` sibling and renames into place. On any
    /// failure the previous file at `path`, if one exists, is untouched.
    pub fn save(&self, path: &Path) -> Result<()> {
        let write_err = |reason: String| Error::CheckpointWrite {
            path: path.to_path_buf(),
            reason,
        };

        let payload = serde_json::to_string(self).map_err(|e| write_err(e.to_string()))?;
        let envelope = Envelope { checksum: sha256_hex(&payload), checkpoint: payload };
        let data = serde_json::to_string(&envelope).map_err(|e| write_err(e.to_string()))?;

        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, data).map_err(|e| write_err(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| write_err(e.to_string()))?;
        Ok(())
    }

    /// Load and verify a checkpoint from `path`
    ///
    /// Fails if the file is unreadable, unparsable, or its digest does not
    /// match the payload.
    pub fn load(path: &Path) -> Result<Self> {
        let read_err = |reason: String| Error::CheckpointRead {
            path: path.to_path_buf(),
            reason,
        };

        let data = std::fs::read_to_string(path).map_err(|e| read_err(e.to_string()))?;
        let envelope: Envelope =
            serde_json::from_str(&data).map_err(|e| read_err(e.to_string()))?;

        if sha256_hex(&envelope.checkpoint) != envelope.checksum {
            return Err(read_err("checksum mismatch".to_string()));
        }

        serde_json::from_str(&envelope.checkpoint).map_err(|e| read_err(e.to_string()))
    }
}
