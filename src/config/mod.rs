//! Run configuration
//!
//! The launch surface is a flat key-value set (hyperparameters, paths, seed).
//! [`RawConfig`] is that surface as deserialized from a JSON or YAML file;
//! [`RawConfig::resolve`] validates it into an immutable [`RunConfig`] that is
//! constructed once at startup and passed explicitly to every component — no
//! ambient or global lookup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration validation error, naming the offending field
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid learning_rate: {0} (must be > 0)")]
    InvalidLearningRate(f32),

    #[error("invalid batch_size: 0 (must be >= 1)")]
    InvalidBatchSize,

    #[error("invalid accumulation_steps: 0 (must be >= 1)")]
    InvalidAccumulationSteps,

    #[error("invalid n_epochs: 0 (must be >= 1)")]
    InvalidEpochs,

    #[error("invalid weight_decay: {0} (must be >= 0)")]
    InvalidWeightDecay(f32),

    #[error("invalid gradient_clip_threshold: {0} (must be > 0 when set)")]
    InvalidGradClip(f32),

    #[error("invalid focal_loss_gamma: {0} (must be >= 0)")]
    InvalidFocalGamma(f32),

    #[error("invalid precision_mode: {0} (must be one of: full, reduced)")]
    InvalidPrecisionMode(String),

    #[error("invalid warmup_ratio: {0} (must be in [0, 1])")]
    InvalidWarmupRatio(f32),

    #[error("warmup_steps and warmup_ratio are mutually exclusive")]
    AmbiguousWarmup,

    #[error("config file {path}: {reason}")]
    Load { path: PathBuf, reason: String },
}

/// Numeric precision mode of the external model/optimizer collaborator
///
/// Reduced precision is a property of the collaborator; the controller's only
/// obligation under it is to fail fast on non-finite loss or gradient values
/// (dynamic-range overflow is a known risk) rather than accept corrupted
/// updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Full (fp32) arithmetic
    Full,
    /// Reduced (mixed fp16/bf16) arithmetic
    Reduced,
}

/// Warmup length, absolute or relative
///
/// The original launch surface accepts either an absolute step count or a
/// ratio of total optimizer steps; the ratio form is converted to steps by
/// the controller once the per-epoch batch count is known.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Warmup {
    /// Absolute number of optimizer steps
    Steps(u64),
    /// Fraction of total optimizer steps in the run
    Ratio(f32),
}

/// Raw, unvalidated launch configuration
///
/// Field names match the flat key-value surface of the job-submission
/// scripts. Missing keys take the defaults below.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    /// Random seed for the collaborators
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Base learning rate (post-warmup hold value)
    pub learning_rate: f32,
    /// Micro-batch size
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Micro-batches per optimizer step
    #[serde(default = "default_accumulation_steps")]
    pub accumulation_steps: usize,
    /// Absolute warmup length in optimizer steps
    #[serde(default)]
    pub warmup_steps: Option<u64>,
    /// Warmup length as a fraction of total optimizer steps
    #[serde(default)]
    pub warmup_ratio: Option<f32>,
    /// Number of training epochs
    pub n_epochs: u64,
    /// Epochs without validation improvement before stopping (0 disables)
    #[serde(default)]
    pub early_stopping_patience: usize,
    /// Decoupled weight decay coefficient
    #[serde(default)]
    pub weight_decay: f32,
    /// Global-L2 gradient clip threshold (absent disables clipping)
    #[serde(default)]
    pub gradient_clip_threshold: Option<f32>,
    /// Focal-loss modulation exponent (0 reduces to plain cross-entropy)
    #[serde(default)]
    pub focal_loss_gamma: f32,
    /// Numeric precision mode: "full" or "reduced"
    #[serde(default = "default_precision_mode")]
    pub precision_mode: String,
    /// Directory for checkpoints
    pub output_directory: PathBuf,
    /// Path for the append-only per-epoch metrics log
    pub output_log_path: PathBuf,
}

fn default_seed() -> u64 {
    42
}

fn default_batch_size() -> usize {
    32
}

fn default_accumulation_steps() -> usize {
    1
}

fn default_precision_mode() -> String {
    "full".to_string()
}

impl RawConfig {
    /// Load a raw configuration from a JSON or YAML file
    ///
    /// Format is dispatched on the file extension: `.json` parses as JSON,
    /// anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let load_err = |reason: String| ConfigError::Load { path: path.to_path_buf(), reason };

        let text = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let raw = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&text).map_err(|e| load_err(e.to_string()))?
        } else {
            serde_yaml::from_str(&text).map_err(|e| load_err(e.to_string()))?
        };
        Ok(raw)
    }

    /// Validate into an immutable [`RunConfig`]
    ///
    /// Fails with a [`ConfigError`] naming the offending field on the first
    /// violated constraint. No side effects beyond returning the structure.
    pub fn resolve(self) -> Result<RunConfig, ConfigError> {
        if !(self.learning_rate > 0.0) {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.accumulation_steps == 0 {
            return Err(ConfigError::InvalidAccumulationSteps);
        }
        if self.n_epochs == 0 {
            return Err(ConfigError::InvalidEpochs);
        }
        if !(self.weight_decay >= 0.0) {
            return Err(ConfigError::InvalidWeightDecay(self.weight_decay));
        }
        if let Some(clip) = self.gradient_clip_threshold {
            if !(clip > 0.0) {
                return Err(ConfigError::InvalidGradClip(clip));
            }
        }
        if !(self.focal_loss_gamma >= 0.0) {
            return Err(ConfigError::InvalidFocalGamma(self.focal_loss_gamma));
        }

        let precision = match self.precision_mode.as_str() {
            "full" => Precision::Full,
            "reduced" => Precision::Reduced,
            other => return Err(ConfigError::InvalidPrecisionMode(other.to_string())),
        };

        let warmup = match (self.warmup_steps, self.warmup_ratio) {
            (Some(_), Some(_)) => return Err(ConfigError::AmbiguousWarmup),
            (Some(steps), None) => Warmup::Steps(steps),
            (None, Some(ratio)) => {
                if !(0.0..=1.0).contains(&ratio) {
                    return Err(ConfigError::InvalidWarmupRatio(ratio));
                }
                Warmup::Ratio(ratio)
            }
            (None, None) => Warmup::Steps(0),
        };

        Ok(RunConfig {
            seed: self.seed,
            learning_rate: self.learning_rate,
            batch_size: self.batch_size,
            accumulation_steps: self.accumulation_steps,
            warmup,
            n_epochs: self.n_epochs,
            early_stopping_patience: self.early_stopping_patience,
            weight_decay: self.weight_decay,
            gradient_clip_threshold: self.gradient_clip_threshold,
            focal_loss_gamma: self.focal_loss_gamma,
            precision,
            output_directory: self.output_directory,
            output_log_path: self.output_log_path,
        })
    }
}

/// Immutable, validated run configuration
///
/// Invariants (enforced by [`RawConfig::resolve`]): `learning_rate > 0`,
/// `batch_size >= 1`, `accumulation_steps >= 1`, `n_epochs >= 1`,
/// `weight_decay >= 0`, `focal_loss_gamma >= 0`, clip threshold `> 0` when
/// present. Effective batch size is `batch_size * accumulation_steps`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub seed: u64,
    pub learning_rate: f32,
    pub batch_size: usize,
    pub accumulation_steps: usize,
    pub warmup: Warmup,
    pub n_epochs: u64,
    pub early_stopping_patience: usize,
    pub weight_decay: f32,
    pub gradient_clip_threshold: Option<f32>,
    pub focal_loss_gamma: f32,
    pub precision: Precision,
    pub output_directory: PathBuf,
    pub output_log_path: PathBuf,
}

impl RunConfig {
    /// Effective batch size the optimizer update behaves as if applied to
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size * self.accumulation_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawConfig {
        RawConfig {
            seed: 42,
            learning_rate: 2e-5,
            batch_size: 8,
            accumulation_steps: 4,
            warmup_steps: Some(100),
            warmup_ratio: None,
            n_epochs: 3,
            early_stopping_patience: 2,
            weight_decay: 0.01,
            gradient_clip_threshold: Some(1.0),
            focal_loss_gamma: 2.0,
            precision_mode: "reduced".to_string(),
            output_directory: PathBuf::from("/tmp/run"),
            output_log_path: PathBuf::from("/tmp/run/metrics.tsv"),
        }
    }

    #[test]
    fn test_resolve_valid() {
        let config = raw().resolve().unwrap();
        assert_eq!(config.effective_batch_size(), 32);
        assert_eq!(config.warmup, Warmup::Steps(100));
        assert_eq!(config.precision, Precision::Reduced);
    }

    #[test]
    fn test_rejects_zero_learning_rate() {
        let mut r = raw();
        r.learning_rate = 0.0;
        assert!(matches!(r.resolve(), Err(ConfigError::InvalidLearningRate(_))));
    }

    #[test]
    fn test_rejects_negative_learning_rate() {
        let mut r = raw();
        r.learning_rate = -1e-5;
        assert!(matches!(r.resolve(), Err(ConfigError::InvalidLearningRate(_))));
    }

    #[test]
    fn test_rejects_nan_learning_rate() {
        let mut r = raw();
        r.learning_rate = f32::NAN;
        assert!(matches!(r.resolve(), Err(ConfigError::InvalidLearningRate(_))));
    }

    #[test]
    fn test_rejects_zero_accumulation_steps() {
        let mut r = raw();
        r.accumulation_steps = 0;
        assert!(matches!(r.resolve(), Err(ConfigError::InvalidAccumulationSteps)));
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let mut r = raw();
        r.batch_size = 0;
        assert!(matches!(r.resolve(), Err(ConfigError::InvalidBatchSize)));
    }

    #[test]
    fn test_rejects_zero_epochs() {
        let mut r = raw();
        r.n_epochs = 0;
        assert!(matches!(r.resolve(), Err(ConfigError::InvalidEpochs)));
    }

    #[test]
    fn test_rejects_negative_gamma() {
        let mut r = raw();
        r.focal_loss_gamma = -0.5;
        assert!(matches!(r.resolve(), Err(ConfigError::InvalidFocalGamma(_))));
    }

    #[test]
    fn test_rejects_non_positive_clip() {
        let mut r = raw();
        r.gradient_clip_threshold = Some(0.0);
        assert!(matches!(r.resolve(), Err(ConfigError::InvalidGradClip(_))));
    }

    #[test]
    fn test_clip_disabled_is_valid() {
        let mut r = raw();
        r.gradient_clip_threshold = None;
        let config = r.resolve().unwrap();
        assert!(config.gradient_clip_threshold.is_none());
    }

    #[test]
    fn test_rejects_unknown_precision_mode() {
        let mut r = raw();
        r.precision_mode = "double".to_string();
        let err = r.resolve().unwrap_err();
        assert!(err.to_string().contains("precision_mode"));
    }

    #[test]
    fn test_rejects_both_warmup_forms() {
        let mut r = raw();
        r.warmup_ratio = Some(0.1);
        assert!(matches!(r.resolve(), Err(ConfigError::AmbiguousWarmup)));
    }

    #[test]
    fn test_warmup_ratio_bounds() {
        let mut r = raw();
        r.warmup_steps = None;
        r.warmup_ratio = Some(1.5);
        assert!(matches!(r.resolve(), Err(ConfigError::InvalidWarmupRatio(_))));
    }

    #[test]
    fn test_no_warmup_defaults_to_zero_steps() {
        let mut r = raw();
        r.warmup_steps = None;
        let config = r.resolve().unwrap();
        assert_eq!(config.warmup, Warmup::Steps(0));
    }

    #[test]
    fn test_gamma_zero_is_valid() {
        let mut r = raw();
        r.focal_loss_gamma = 0.0;
        assert!(r.resolve().is_ok());
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        std::fs::write(
            &path,
            "learning_rate: 0.00002\n\
             n_epochs: 3\n\
             output_directory: /tmp/run\n\
             output_log_path: /tmp/run/metrics.tsv\n",
        )
        .unwrap();

        let raw = RawConfig::from_file(&path).unwrap();
        assert_eq!(raw.seed, 42);
        assert_eq!(raw.batch_size, 32);
        assert_eq!(raw.accumulation_steps, 1);
        let config = raw.resolve().unwrap();
        assert_eq!(config.precision, Precision::Full);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{"learning_rate": 0.001, "n_epochs": 1,
                "output_directory": "/tmp/run",
                "output_log_path": "/tmp/run/metrics.tsv"}"#,
        )
        .unwrap();

        let raw = RawConfig::from_file(&path).unwrap();
        assert!(raw.resolve().is_ok());
    }

    #[test]
    fn test_from_file_missing() {
        let err = RawConfig::from_file("/nonexistent/run.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        std::fs::write(
            &path,
            "learning_rate: 0.001\n\
             n_epochs: 1\n\
             output_directory: /tmp/run\n\
             output_log_path: /tmp/run/metrics.tsv\n\
             learning_rat: 0.1\n",
        )
        .unwrap();
        assert!(RawConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_run_config_round_trips_through_json() {
        let config = raw().resolve().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
