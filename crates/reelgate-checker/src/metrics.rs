//! Gate run counters and their flat text exposition.
//!
//! Series:
//! - `quality_gate_runs_total{gate,status,artifact_type,run_id}`
//! - `quality_gate_run_duration_ms_sum{gate,artifact_type}`
//! - `quality_gate_run_duration_ms_count{gate,artifact_type}`
//! - `audio_cache_hits_total{kind}`, `audio_cache_misses_total{kind}`,
//!   `audio_cache_entries{kind}`

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use reelgate_core::errors::StorageError;
use reelgate_core::types::{ArtifactKind, GateOutcome, GateStatus};
use reelgate_gates::{CacheStats, GateObserver};
use reelgate_storage::atomic_write;

use crate::report::QualityReport;

/// Receives the rendered exposition.
pub trait MetricsSink: Send + Sync {
    fn publish(&self, exposition: &str) -> Result<(), StorageError>;
}

/// Textfile collector target, replaced atomically on every publish.
#[derive(Debug, Clone)]
pub struct TextfileSink {
    path: PathBuf,
}

impl TextfileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetricsSink for TextfileSink {
    fn publish(&self, exposition: &str) -> Result<(), StorageError> {
        atomic_write(&self.path, exposition.as_bytes())
    }
}

type RunKey = (String, GateStatus, ArtifactKind);
type LatencyKey = (String, ArtifactKind);

#[derive(Debug, Default)]
struct Counters {
    runs: BTreeMap<RunKey, u64>,
    duration_sum: BTreeMap<LatencyKey, u64>,
    duration_count: BTreeMap<LatencyKey, u64>,
    cache: BTreeMap<&'static str, CacheStats>,
}

/// Thread-safe fold of gate executions. Plugged into the runner as a
/// [`GateObserver`] or fed from saved reports.
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    run_id: Option<String>,
    counters: Mutex<Counters>,
}

impl MetricsAggregator {
    pub fn new(run_id: Option<String>) -> Self {
        Self {
            run_id,
            counters: Mutex::default(),
        }
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    pub fn record(&self, kind: ArtifactKind, gate: &str, status: GateStatus, duration_ms: Option<u64>) {
        let Ok(mut c) = self.counters.lock() else {
            return;
        };
        *c.runs.entry((gate.to_string(), status, kind)).or_default() += 1;
        if let Some(ms) = duration_ms {
            let key = (gate.to_string(), kind);
            *c.duration_sum.entry(key.clone()).or_default() += ms;
            *c.duration_count.entry(key).or_default() += 1;
        }
    }

    pub fn record_outcome(&self, kind: ArtifactKind, outcome: &GateOutcome) {
        self.record(kind, outcome.gate(), outcome.status(), outcome.duration_ms());
    }

    pub fn fold_report(&self, report: &QualityReport) {
        for r in &report.gate_results {
            let duration = r
                .details
                .get(reelgate_core::types::outcome::DURATION_KEY)
                .and_then(serde_json::Value::as_u64);
            self.record(report.artifact_type, &r.gate_name, r.status, duration);
        }
    }

    /// Fold every readable report under `dir`. Returns how many were folded.
    pub fn fold_reports_dir(&self, dir: &Path) -> usize {
        let mut folded = 0;
        for path in crate::report::list_json(dir) {
            match QualityReport::load(&path) {
                Ok(report) => {
                    self.fold_report(&report);
                    folded += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "report skipped for metrics")
                }
            }
        }
        folded
    }

    /// Replace the decode cache gauges.
    pub fn set_cache_stats(&self, stats: &[CacheStats]) {
        if let Ok(mut c) = self.counters.lock() {
            for s in stats {
                c.cache.insert(s.kind, s.clone());
            }
        }
    }

    /// Total runs recorded for `gate` with `status`, across kinds.
    pub fn runs(&self, gate: &str, status: GateStatus) -> u64 {
        self.counters
            .lock()
            .map(|c| {
                c.runs
                    .iter()
                    .filter(|((g, s, _), _)| g == gate && *s == status)
                    .map(|(_, n)| n)
                    .sum()
            })
            .unwrap_or(0)
    }

    pub fn render_exposition(&self) -> String {
        let Ok(c) = self.counters.lock() else {
            return String::new();
        };
        let run_id = self.run_id.as_deref();
        let mut out = String::new();

        out.push_str("# TYPE quality_gate_runs_total counter\n");
        for ((gate, status, kind), n) in &c.runs {
            let labels = labels(&[
                ("gate", Some(gate.as_str())),
                ("status", Some(status.as_str())),
                ("artifact_type", Some(kind.as_str())),
                ("run_id", run_id),
            ]);
            let _ = writeln!(out, "quality_gate_runs_total{labels} {n}");
        }
        out.push_str("# TYPE quality_gate_run_duration_ms_sum counter\n");
        for ((gate, kind), sum) in &c.duration_sum {
            let labels = labels(&[("gate", Some(gate.as_str())), ("artifact_type", Some(kind.as_str()))]);
            let _ = writeln!(out, "quality_gate_run_duration_ms_sum{labels} {sum}");
        }
        out.push_str("# TYPE quality_gate_run_duration_ms_count counter\n");
        for ((gate, kind), count) in &c.duration_count {
            let labels = labels(&[("gate", Some(gate.as_str())), ("artifact_type", Some(kind.as_str()))]);
            let _ = writeln!(out, "quality_gate_run_duration_ms_count{labels} {count}");
        }

        if !c.cache.is_empty() {
            out.push_str("# TYPE audio_cache_hits_total counter\n");
            for s in c.cache.values() {
                let _ = writeln!(out, "audio_cache_hits_total{} {}", labels(&[("kind", Some(s.kind))]), s.hits);
            }
            out.push_str("# TYPE audio_cache_misses_total counter\n");
            for s in c.cache.values() {
                let _ = writeln!(out, "audio_cache_misses_total{} {}", labels(&[("kind", Some(s.kind))]), s.misses);
            }
            out.push_str("# TYPE audio_cache_entries gauge\n");
            for s in c.cache.values() {
                let _ = writeln!(out, "audio_cache_entries{} {}", labels(&[("kind", Some(s.kind))]), s.entries);
            }
        }
        out
    }

    pub fn flush(&self, sink: &dyn MetricsSink) -> Result<(), StorageError> {
        sink.publish(&self.render_exposition())
    }
}

impl GateObserver for MetricsAggregator {
    fn on_gate(&self, kind: ArtifactKind, outcome: &GateOutcome) {
        self.record_outcome(kind, outcome);
    }
}

/// `{k="v",...}`; absent values are dropped, an empty set renders as "".
fn labels(pairs: &[(&str, Option<&str>)]) -> String {
    let items: Vec<String> = pairs
        .iter()
        .filter_map(|(k, v)| v.map(|v| format!("{k}=\"{}\"", escape(v))))
        .collect();
    if items.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", items.join(","))
    }
}

fn escape(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelgate_core::types::Severity;

    #[test]
    fn exposition_lists_runs_and_latency() {
        let m = MetricsAggregator::new(Some("run_20260101_000000".into()));
        m.record_outcome(
            ArtifactKind::Script,
            &GateOutcome::pass("word_bounds", Severity::Error, "ok", "WORD_COUNT_OK").with_duration_ms(4),
        );
        m.record_outcome(
            ArtifactKind::Script,
            &GateOutcome::skipped("language", Severity::Error, "skipped"),
        );
        let text = m.render_exposition();
        assert!(text.contains(
            "quality_gate_runs_total{gate=\"word_bounds\",status=\"pass\",artifact_type=\"script\",run_id=\"run_20260101_000000\"} 1"
        ));
        assert!(text.contains("quality_gate_run_duration_ms_sum{gate=\"word_bounds\",artifact_type=\"script\"} 4"));
        assert!(text.contains("status=\"skipped\""));
        assert!(!text.contains("quality_gate_run_duration_ms_count{gate=\"language\""));
        assert!(!text.contains("audio_cache"));
    }

    #[test]
    fn labels_escape_quotes() {
        assert_eq!(labels(&[("gate", Some("a\"b")), ("run_id", None)]), "{gate=\"a\\\"b\"}");
        assert_eq!(labels(&[("run_id", None)]), "");
    }

    #[test]
    fn cache_gauges_render() {
        let m = MetricsAggregator::new(None);
        m.set_cache_stats(&[CacheStats {
            kind: "samples",
            hits: 3,
            misses: 1,
            entries: 1,
        }]);
        let text = m.render_exposition();
        assert!(text.contains("audio_cache_hits_total{kind=\"samples\"} 3"));
        assert!(text.contains("audio_cache_entries{kind=\"samples\"} 1"));
    }
}
