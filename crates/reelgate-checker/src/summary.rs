//! Aggregate summary over report files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use reelgate_core::errors::StorageError;
use reelgate_core::time;
use reelgate_core::types::GateStatus;
use reelgate_storage::atomic_write_json;

use crate::report::QualityReport;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateStats {
    pub total: u64,
    pub pass: u64,
    pub fail: u64,
    pub warn: u64,
    pub skipped: u64,
}

impl GateStats {
    fn record(&mut self, status: GateStatus) {
        self.total += 1;
        match status {
            GateStatus::Pass => self.pass += 1,
            GateStatus::Fail => self.fail += 1,
            GateStatus::Warn => self.warn += 1,
            GateStatus::Skipped => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSummary {
    /// Report files considered, unreadable ones included.
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub warned: u64,
    pub gate_statistics: BTreeMap<String, GateStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallSummary {
    pub total_artifacts: u64,
    pub total_passed: u64,
    pub total_failed: u64,
    pub total_warned: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub generated_at: String,
    pub scripts: KindSummary,
    pub audio: KindSummary,
    pub overall: OverallSummary,
}

pub struct SummaryReporter {
    summary_path: PathBuf,
}

impl SummaryReporter {
    pub fn new(summary_path: impl Into<PathBuf>) -> Self {
        Self {
            summary_path: summary_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.summary_path
    }

    /// Fold both report sets and write `summary.json`.
    pub fn generate(&self, script_reports: &[PathBuf], audio_reports: &[PathBuf]) -> Result<Summary, StorageError> {
        let scripts = summarize(script_reports);
        let audio = summarize(audio_reports);
        let overall = OverallSummary {
            total_artifacts: scripts.total + audio.total,
            total_passed: scripts.passed + audio.passed,
            total_failed: scripts.failed + audio.failed,
            total_warned: scripts.warned + audio.warned,
        };
        let summary = Summary {
            generated_at: time::now_rfc3339(),
            scripts,
            audio,
            overall,
        };
        atomic_write_json(&self.summary_path, &summary)?;
        tracing::info!(path = %self.summary_path.display(), "summary report saved");
        Ok(summary)
    }
}

fn summarize(reports: &[PathBuf]) -> KindSummary {
    let mut out = KindSummary {
        total: reports.len() as u64,
        ..KindSummary::default()
    };
    for path in reports {
        let report = match QualityReport::load(path) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "unreadable report skipped");
                continue;
            }
        };
        match report.quality.status {
            GateStatus::Pass => out.passed += 1,
            GateStatus::Fail => out.failed += 1,
            GateStatus::Warn => out.warned += 1,
            GateStatus::Skipped => {}
        }
        for result in &report.gate_results {
            out.gate_statistics
                .entry(result.gate_name.clone())
                .or_default()
                .record(result.status);
        }
    }
    out
}
