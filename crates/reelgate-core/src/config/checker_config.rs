//! Checker configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::types::ArtifactKind;

/// Project-level config file name.
pub const CONFIG_FILE_NAME: &str = "reelgate.toml";

/// How a checker executes and where it writes.
///
/// Resolution order (highest priority first):
/// 1. Explicit overrides (`CheckerOverrides`)
/// 2. Environment variables (`REELGATE_*`)
/// 3. Project config (`reelgate.toml` in the project root)
/// 4. Compiled defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Root under which `quality_gates/` is created. Default: `output`.
    pub output_dir: Option<PathBuf>,
    /// Policy document. Default: `config/quality_policy.json`.
    pub policy_path: Option<PathBuf>,
    /// Parallel workers for batch checks. Default: 1 (sequential).
    pub workers: Option<usize>,
    /// Stop at the first critical failure. Default: true.
    pub lazy: Option<bool>,
    /// Non-zero exit on any failure. Default: false.
    pub strict: Option<bool>,
    /// Global pass-through switch. Default: false.
    pub disable_gates: Option<bool>,
    /// Bound of each decode cache store. Default: 512.
    pub decode_cache_entries: Option<usize>,
}

/// Caller-supplied overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct CheckerOverrides {
    pub output_dir: Option<PathBuf>,
    pub policy_path: Option<PathBuf>,
    pub workers: Option<usize>,
    pub lazy: Option<bool>,
    pub strict: Option<bool>,
    pub disable_gates: Option<bool>,
}

impl CheckerConfig {
    pub fn load(root: &Path, overrides: Option<&CheckerOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let project_config_path = root.join(CONFIG_FILE_NAME);
        if project_config_path.exists() {
            let content = std::fs::read_to_string(&project_config_path).map_err(|_| {
                ConfigError::FileNotFound {
                    path: project_config_path.display().to_string(),
                }
            })?;
            let file_config: CheckerConfig =
                toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                    path: project_config_path.display().to_string(),
                    message: e.to_string(),
                })?;
            config.merge(&file_config);
        }

        config.apply_env_overrides();

        if let Some(o) = overrides {
            config.apply_overrides(o);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "workers".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.decode_cache_entries == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "decode_cache_entries".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// `other` wins wherever it has a value.
    fn merge(&mut self, other: &CheckerConfig) {
        if other.output_dir.is_some() {
            self.output_dir = other.output_dir.clone();
        }
        if other.policy_path.is_some() {
            self.policy_path = other.policy_path.clone();
        }
        if other.workers.is_some() {
            self.workers = other.workers;
        }
        if other.lazy.is_some() {
            self.lazy = other.lazy;
        }
        if other.strict.is_some() {
            self.strict = other.strict;
        }
        if other.disable_gates.is_some() {
            self.disable_gates = other.disable_gates;
        }
        if other.decode_cache_entries.is_some() {
            self.decode_cache_entries = other.decode_cache_entries;
        }
    }

    /// Pattern: `REELGATE_WORKERS`, `REELGATE_STRICT`, ...
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("REELGATE_OUTPUT_DIR") {
            self.output_dir = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("REELGATE_POLICY_PATH") {
            self.policy_path = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("REELGATE_WORKERS") {
            if let Ok(v) = val.parse::<usize>() {
                self.workers = Some(v);
            }
        }
        if let Some(v) = env_bool("REELGATE_LAZY") {
            self.lazy = Some(v);
        }
        if let Some(v) = env_bool("REELGATE_STRICT") {
            self.strict = Some(v);
        }
        if let Some(v) = env_bool("REELGATE_DISABLE_GATES") {
            self.disable_gates = Some(v);
        }
        if let Ok(val) = std::env::var("REELGATE_DECODE_CACHE_ENTRIES") {
            if let Ok(v) = val.parse::<usize>() {
                self.decode_cache_entries = Some(v);
            }
        }
    }

    fn apply_overrides(&mut self, o: &CheckerOverrides) {
        if let Some(ref v) = o.output_dir {
            self.output_dir = Some(v.clone());
        }
        if let Some(ref v) = o.policy_path {
            self.policy_path = Some(v.clone());
        }
        if let Some(v) = o.workers {
            self.workers = Some(v);
        }
        if let Some(v) = o.lazy {
            self.lazy = Some(v);
        }
        if let Some(v) = o.strict {
            self.strict = Some(v);
        }
        if let Some(v) = o.disable_gates {
            self.disable_gates = Some(v);
        }
    }

    pub fn effective_output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("output"))
    }

    pub fn effective_policy_path(&self) -> PathBuf {
        self.policy_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("config/quality_policy.json"))
    }

    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or(1)
    }

    pub fn effective_lazy(&self) -> bool {
        self.lazy.unwrap_or(true)
    }

    pub fn effective_strict(&self) -> bool {
        self.strict.unwrap_or(false)
    }

    pub fn gates_disabled(&self) -> bool {
        self.disable_gates.unwrap_or(false)
    }

    pub fn effective_decode_cache_entries(&self) -> usize {
        self.decode_cache_entries.unwrap_or(512)
    }

    pub fn paths(&self) -> QualityPaths {
        QualityPaths::new(self.effective_output_dir())
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let val = std::env::var(key).ok()?;
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// On-disk layout under `<output>/quality_gates`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityPaths {
    root: PathBuf,
}

impl QualityPaths {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: output_dir.into().join("quality_gates"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn reports_dir(&self, kind: ArtifactKind) -> PathBuf {
        self.root.join("reports").join(kind.as_str())
    }

    pub fn quarantine_dir(&self, kind: ArtifactKind) -> PathBuf {
        self.root.join("quarantine").join(kind.as_str())
    }

    /// Stable logical manifest path.
    pub fn manifest(&self) -> PathBuf {
        self.root.join("run_manifest.json")
    }

    pub fn script_hash_index(&self) -> PathBuf {
        self.root.join("indexes").join("scripts_hash_index.json")
    }

    pub fn config_snapshots_dir(&self) -> PathBuf {
        self.root.join("config_snapshots")
    }

    pub fn metrics_dir(&self) -> PathBuf {
        self.root.join("metrics")
    }

    pub fn metrics_file(&self) -> PathBuf {
        self.metrics_dir().join("metrics.prom")
    }

    pub fn summary(&self) -> PathBuf {
        self.root.join("summary.json")
    }
}
