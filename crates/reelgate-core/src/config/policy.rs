//! Declarative quality policy.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ConfigError;
use crate::schema::StructuralSchema;
use crate::types::{ArtifactKind, Severity};

/// Relative location of the optional policy schema, next to the policy file.
pub const POLICY_SCHEMA_RELATIVE: &str = "schemas/quality_policy.json";

/// Thresholds for script gates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptPolicy {
    /// Minimum word count. Default: 10.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_words: Option<u64>,
    /// Maximum word count. Default: 2000.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_words: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub forbidden_terms: Vec<String>,
    /// Newline-delimited term list, resolved against the policy directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forbidden_terms_file: Option<PathBuf>,
    /// Expected language tag. Default: "pt-BR".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_duplicates: Option<bool>,
    /// Structural schema for script documents. Default: built-in `script_v1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_path: Option<PathBuf>,
    /// Thresholds for custom gates.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScriptPolicy {
    pub fn effective_min_words(&self) -> u64 {
        self.min_words.unwrap_or(10)
    }

    pub fn effective_max_words(&self) -> u64 {
        self.max_words.unwrap_or(2000)
    }

    pub fn effective_language(&self) -> &str {
        self.language.as_deref().unwrap_or("pt-BR")
    }

    pub fn effective_allow_duplicates(&self) -> bool {
        self.allow_duplicates.unwrap_or(false)
    }
}

/// Thresholds for audio gates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioPolicy {
    /// Default: 16000 Hz.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_sample_rate: Option<u32>,
    /// Default: 1.0 words/sec.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_words_per_second: Option<f64>,
    /// Default: 5.0 words/sec.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_words_per_second: Option<f64>,
    /// Default: 1000 ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_leading_silence_ms: Option<u64>,
    /// Default: 1000 ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_trailing_silence_ms: Option<u64>,
    /// Default: 0.3.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_silence_proportion: Option<f64>,
    /// Frames quieter than this are silence. Default: -50 dBFS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silence_threshold_dbfs: Option<f64>,
    /// Default: -30 dBFS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_loudness_dbfs_min: Option<f64>,
    /// Default: -10 dBFS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_loudness_dbfs_max: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AudioPolicy {
    pub fn effective_min_sample_rate(&self) -> u32 {
        self.min_sample_rate.unwrap_or(16_000)
    }

    pub fn effective_words_per_second(&self) -> (f64, f64) {
        (
            self.min_words_per_second.unwrap_or(1.0),
            self.max_words_per_second.unwrap_or(5.0),
        )
    }

    pub fn effective_max_leading_silence_ms(&self) -> u64 {
        self.max_leading_silence_ms.unwrap_or(1000)
    }

    pub fn effective_max_trailing_silence_ms(&self) -> u64 {
        self.max_trailing_silence_ms.unwrap_or(1000)
    }

    pub fn effective_max_silence_proportion(&self) -> f64 {
        self.max_silence_proportion.unwrap_or(0.3)
    }

    pub fn effective_silence_threshold_dbfs(&self) -> f64 {
        self.silence_threshold_dbfs.unwrap_or(-50.0)
    }

    pub fn effective_loudness_range(&self) -> (f64, f64) {
        (
            self.target_loudness_dbfs_min.unwrap_or(-30.0),
            self.target_loudness_dbfs_max.unwrap_or(-10.0),
        )
    }
}

/// Ordered gate names per artifact kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateOrdering {
    pub script: Vec<String>,
    pub audio: Vec<String>,
}

/// The active rule set. Loaded once, never mutated by the checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityPolicy {
    pub enabled: bool,
    pub llm_assisted: bool,
    pub script: ScriptPolicy,
    pub audio: AudioPolicy,
    pub severity: BTreeMap<String, Severity>,
    pub ordering: GateOrdering,
    #[serde(skip)]
    source_path: Option<PathBuf>,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            llm_assisted: false,
            script: ScriptPolicy::default(),
            audio: AudioPolicy::default(),
            severity: BTreeMap::new(),
            ordering: GateOrdering::default(),
            source_path: None,
        }
    }
}

impl QualityPolicy {
    /// Load, schema-check and validate a policy file. Any failure is fatal:
    /// a half-loaded policy never reaches the gate registry.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let raw: Value = serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let schema_path = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(POLICY_SCHEMA_RELATIVE);
        if schema_path.exists() {
            let schema = StructuralSchema::load(&schema_path)?;
            let errors = schema.validate(&raw);
            if !errors.is_empty() {
                return Err(ConfigError::SchemaViolations {
                    schema: schema_path.display().to_string(),
                    errors,
                });
            }
        } else {
            tracing::warn!(
                schema = %schema_path.display(),
                "policy schema not found; skipping structural validation"
            );
        }

        let mut policy = Self::from_value(raw, &path.display().to_string())?;
        policy.source_path = Some(path.to_path_buf());
        tracing::info!(path = %path.display(), "loaded quality policy");
        Ok(policy)
    }

    /// Parse a policy from a JSON string (for testing and embedding).
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: Value = serde_json::from_str(json).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::from_value(raw, "<string>")
    }

    fn from_value(raw: Value, origin: &str) -> Result<Self, ConfigError> {
        let policy: Self = serde_json::from_value(raw).map_err(|e| ConfigError::ParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        policy.validate()?;
        Ok(policy)
    }

    /// Logical checks beyond structure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.script.effective_max_words() < self.script.effective_min_words() {
            return Err(ConfigError::ValidationFailed {
                field: "script.max_words".to_string(),
                message: "script.max_words must be >= script.min_words".to_string(),
            });
        }
        let (min_wps, max_wps) = self.audio.effective_words_per_second();
        if min_wps <= 0.0 || max_wps < min_wps {
            return Err(ConfigError::ValidationFailed {
                field: "audio.max_words_per_second".to_string(),
                message: "words-per-second window must be positive and ordered".to_string(),
            });
        }
        let proportion = self.audio.effective_max_silence_proportion();
        if !(0.0..=1.0).contains(&proportion) {
            return Err(ConfigError::ValidationFailed {
                field: "audio.max_silence_proportion".to_string(),
                message: "must be between 0.0 and 1.0".to_string(),
            });
        }
        let (lo, hi) = self.audio.effective_loudness_range();
        if hi < lo {
            return Err(ConfigError::ValidationFailed {
                field: "audio.target_loudness_dbfs_max".to_string(),
                message: "must be >= audio.target_loudness_dbfs_min".to_string(),
            });
        }
        Ok(())
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Directory that relative paths inside the policy resolve against.
    pub fn base_dir(&self) -> PathBuf {
        self.source_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn resolve(&self, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.base_dir().join(relative)
        }
    }

    /// Severity for a gate; unmapped gates default to `error`.
    pub fn severity_of(&self, gate: &str) -> Severity {
        self.severity.get(gate).copied().unwrap_or_default()
    }

    pub fn ordering_for(&self, kind: ArtifactKind) -> &[String] {
        match kind {
            ArtifactKind::Script => &self.ordering.script,
            ArtifactKind::Audio => &self.ordering.audio,
        }
    }

    /// Canonical JSON form (object keys sorted) used for fingerprinting and
    /// snapshots.
    pub fn canonical_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Short content hash of the canonical serialization.
    pub fn fingerprint(&self) -> String {
        fingerprint_value(&self.canonical_value())
    }
}

/// blake3 over the compact JSON encoding, truncated to 16 hex chars.
/// `serde_json::Map` keeps keys sorted, so equal documents hash equally.
pub fn fingerprint_value(value: &Value) -> String {
    let canonical = serde_json::to_string(value).unwrap_or_default();
    let hash = blake3::hash(canonical.as_bytes());
    hash.to_hex()[..16].to_string()
}
