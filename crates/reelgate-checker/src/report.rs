//! Per-artifact quality report and quarantine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use reelgate_core::errors::StorageError;
use reelgate_core::time;
use reelgate_core::types::{ArtifactKind, GateOutcome, GateStatus, Severity};
use reelgate_gates::RunOutcome;
use reelgate_storage::{atomic_write, atomic_write_json};

/// Rolled-up counts for one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityBlock {
    pub processed: bool,
    pub status: GateStatus,
    pub gates_run: usize,
    pub gates_passed: usize,
    pub gates_failed: usize,
    pub gates_warned: usize,
    pub gates_skipped: usize,
}

impl QualityBlock {
    pub fn from_outcomes(status: GateStatus, outcomes: &[GateOutcome]) -> Self {
        let count = |s: GateStatus| outcomes.iter().filter(|o| o.status() == s).count();
        Self {
            processed: true,
            status,
            gates_run: outcomes.len(),
            gates_passed: count(GateStatus::Pass),
            gates_failed: count(GateStatus::Fail),
            gates_warned: count(GateStatus::Warn),
            gates_skipped: count(GateStatus::Skipped),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResultRecord {
    pub gate_name: String,
    pub status: GateStatus,
    pub severity: Severity,
    pub message: String,
    pub details: Map<String, Value>,
}

impl From<&GateOutcome> for GateResultRecord {
    fn from(o: &GateOutcome) -> Self {
        Self {
            gate_name: o.gate().to_string(),
            status: o.status(),
            severity: o.severity(),
            message: o.message().to_string(),
            details: o.detail().clone(),
        }
    }
}

/// `reports/<kind>/<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub artifact_id: String,
    pub artifact_type: ArtifactKind,
    pub artifact_path: String,
    pub timestamp: String,
    pub quality: QualityBlock,
    pub gate_results: Vec<GateResultRecord>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl QualityReport {
    pub fn new(
        artifact_id: &str,
        kind: ArtifactKind,
        artifact_path: &Path,
        run: &RunOutcome,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            artifact_id: artifact_id.to_string(),
            artifact_type: kind,
            artifact_path: artifact_path.display().to_string(),
            timestamp: time::now_rfc3339(),
            quality: QualityBlock::from_outcomes(run.status, &run.outcomes),
            gate_results: run.outcomes.iter().map(GateResultRecord::from).collect(),
            metadata,
        }
    }

    /// Read a report written by [`QualityReporter`].
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let content = std::fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| StorageError::Serialize {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Writes reports for one artifact kind and quarantines critical failures.
#[derive(Debug, Clone)]
pub struct QualityReporter {
    kind: ArtifactKind,
    reports_dir: PathBuf,
    quarantine_dir: PathBuf,
}

impl QualityReporter {
    pub fn new(kind: ArtifactKind, reports_dir: impl Into<PathBuf>, quarantine_dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            reports_dir: reports_dir.into(),
            quarantine_dir: quarantine_dir.into(),
        }
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    pub fn quarantine_dir(&self) -> &Path {
        &self.quarantine_dir
    }

    pub fn report_path(&self, artifact_id: &str) -> PathBuf {
        self.reports_dir.join(format!("{artifact_id}.json"))
    }

    /// Write (or overwrite) the report for `artifact_id`.
    pub fn write_report(
        &self,
        artifact_id: &str,
        artifact_path: &Path,
        run: &RunOutcome,
        metadata: Map<String, Value>,
    ) -> Result<PathBuf, StorageError> {
        let report = QualityReport::new(artifact_id, self.kind, artifact_path, run, metadata);
        let path = self.report_path(artifact_id);
        atomic_write_json(&path, &report)?;
        tracing::info!(artifact_id, path = %path.display(), status = %run.status, "quality report saved");
        Ok(path)
    }

    /// Copy `artifact_path` into the quarantine directory with a sibling
    /// `<id>_reason.txt`. The original stays where it is. Returns `None` when
    /// there is nothing to copy.
    pub fn quarantine(
        &self,
        artifact_path: &Path,
        artifact_id: &str,
        reason: &str,
    ) -> Result<Option<PathBuf>, StorageError> {
        let Some(file_name) = artifact_path.file_name() else {
            return Ok(None);
        };
        if !artifact_path.is_file() {
            tracing::warn!(path = %artifact_path.display(), "cannot quarantine missing file");
            return Ok(None);
        }

        std::fs::create_dir_all(&self.quarantine_dir)
            .map_err(|e| StorageError::io(&self.quarantine_dir, e))?;
        let target = self.quarantine_dir.join(file_name);
        std::fs::copy(artifact_path, &target).map_err(|e| StorageError::io(&target, e))?;

        let note = format!(
            "Quarantined at: {}\nReason: {reason}\nOriginal path: {}\n",
            time::now_rfc3339(),
            artifact_path.display()
        );
        atomic_write(
            &self.quarantine_dir.join(format!("{artifact_id}_reason.txt")),
            note.as_bytes(),
        )?;
        tracing::warn!(
            artifact_id,
            from = %artifact_path.display(),
            to = %target.display(),
            "artifact quarantined"
        );
        Ok(Some(target))
    }

    /// Every report file currently on disk, sorted.
    pub fn list_reports(&self) -> Vec<PathBuf> {
        list_json(&self.reports_dir)
    }
}

pub(crate) fn list_json(dir: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .collect();
    out.sort();
    out
}
