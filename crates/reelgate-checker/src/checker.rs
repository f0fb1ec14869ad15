//! The checker façade: load → gates → report → quarantine → manifest.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use reelgate_core::config::{CheckerConfig, QualityPaths};
use reelgate_core::errors::{ArtifactError, CheckError};
use reelgate_core::tracing::fields;
use reelgate_core::types::{Artifact, ArtifactKind, AudioArtifact, GateStatus};
use reelgate_core::QualityPolicy;
use reelgate_gates::audio::default_probe;
use reelgate_gates::{
    AudioProbe, BoxedGate, DecodeCache, GateCatalog, GateRegistry, GateResources, GateRunner,
    RunOutcome, UnresolvedGate,
};
use reelgate_storage::{
    AudioEntry, DedupIndex, EntryStatus, QualityDetails, RunManifest, ScriptEntry,
};

use crate::load;
use crate::metrics::{MetricsAggregator, MetricsSink, TextfileSink};
use crate::report::QualityReporter;

const QUARANTINE_REASON: &str = "Critical quality gate failure";

/// Outcome of checking one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub artifact_id: String,
    /// Overall status is not `fail`.
    pub passed: bool,
    pub status: EntryStatus,
    pub duration_ms: u64,
    /// Gates that executed; lazily skipped ones are not counted.
    pub gates_run: usize,
    /// Load, report or worker failure text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    fn errored(artifact_id: String, error: String, duration_ms: u64) -> Self {
        Self {
            artifact_id,
            passed: false,
            status: EntryStatus::Error,
            duration_ms,
            gates_run: 0,
            error: Some(error),
        }
    }
}

/// Aggregate of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
    pub results: Vec<CheckResult>,
}

impl BatchSummary {
    pub fn from_results(results: Vec<CheckResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            total_duration_ms: results.iter().map(|r| r.duration_ms).sum(),
            results,
        }
    }

    /// Process exit code: non-zero only in strict mode with failures.
    pub fn exit_code(&self, strict: bool) -> i32 {
        if strict && self.failed > 0 {
            1
        } else {
            0
        }
    }
}

/// Optional wiring for [`Checker::with_options`].
#[derive(Default)]
pub struct CheckerOptions {
    /// Defaults to [`GateCatalog::builtin`].
    pub catalog: Option<GateCatalog>,
    /// Defaults to the build's decoder behind a [`DecodeCache`].
    pub probe: Option<Arc<dyn AudioProbe>>,
}

/// Checks artifacts of one kind. Gates are built once, at construction.
pub struct Checker {
    kind: ArtifactKind,
    config: CheckerConfig,
    policy: QualityPolicy,
    paths: QualityPaths,
    registry: GateRegistry,
    runner: GateRunner,
    reporter: QualityReporter,
    manifest: RunManifest,
    metrics: Arc<MetricsAggregator>,
    probe: Arc<dyn AudioProbe>,
    cache: Option<Arc<DecodeCache>>,
}

impl Checker {
    pub fn script(config: CheckerConfig, policy: QualityPolicy) -> Result<Self, CheckError> {
        Self::with_options(ArtifactKind::Script, config, policy, CheckerOptions::default())
    }

    pub fn audio(config: CheckerConfig, policy: QualityPolicy) -> Result<Self, CheckError> {
        Self::with_options(ArtifactKind::Audio, config, policy, CheckerOptions::default())
    }

    pub fn with_options(
        kind: ArtifactKind,
        config: CheckerConfig,
        policy: QualityPolicy,
        options: CheckerOptions,
    ) -> Result<Self, CheckError> {
        config.validate()?;
        let paths = config.paths();
        let manifest = RunManifest::open(paths.manifest())?;

        if let Err(e) = manifest.save_policy_snapshot(&policy.canonical_value(), policy.source_path()) {
            tracing::warn!(error = %e, "failed to write policy snapshot");
        }

        let (probe, cache) = match options.probe {
            Some(probe) => (probe, None),
            None => {
                let cache = Arc::new(DecodeCache::new(
                    default_probe(),
                    config.effective_decode_cache_entries(),
                ));
                (cache.clone() as Arc<dyn AudioProbe>, Some(cache))
            }
        };
        let mut resources = GateResources::default().with_probe(probe.clone());
        if kind == ArtifactKind::Script {
            resources = resources.with_dedup(Arc::new(DedupIndex::open(paths.script_hash_index())));
        }

        let catalog = options.catalog.unwrap_or_else(GateCatalog::builtin);
        let registry = GateRegistry::from_policy(&policy, kind, &catalog, &resources);

        let metrics = Arc::new(MetricsAggregator::new(Some(manifest.run_id())));
        let runner = GateRunner::new(config.effective_lazy()).with_observer(metrics.clone());
        let reporter = QualityReporter::new(kind, paths.reports_dir(kind), paths.quarantine_dir(kind));

        tracing::info!(
            { fields::ARTIFACT_KIND } = kind.as_str(),
            { fields::RUN_ID } = %manifest.run_id(),
            { fields::POLICY_HASH } = %manifest.config_hash(),
            gates = registry.len(),
            disabled = config.gates_disabled(),
            "checker ready"
        );

        Ok(Self {
            kind,
            config,
            policy,
            paths,
            registry,
            runner,
            reporter,
            manifest,
            metrics,
            probe,
            cache,
        })
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn policy(&self) -> &QualityPolicy {
        &self.policy
    }

    pub fn paths(&self) -> &QualityPaths {
        &self.paths
    }

    pub fn manifest(&self) -> &RunManifest {
        &self.manifest
    }

    pub fn metrics(&self) -> &MetricsAggregator {
        &self.metrics
    }

    pub fn reporter(&self) -> &QualityReporter {
        &self.reporter
    }

    pub fn gate_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// Policy gate names that could not be built.
    pub fn unresolved_gates(&self) -> &[UnresolvedGate] {
        self.registry.resolution_report()
    }

    fn active_gates(&self) -> &[BoxedGate] {
        if self.config.gates_disabled() {
            &[]
        } else {
            self.registry.gates()
        }
    }

    /// Check one file. Load failures become an `error` manifest entry and an
    /// `Ok` result. A report that cannot be written is logged and its error
    /// recorded on the manifest entry; manifest failures are returned.
    pub fn check_one(&self, path: &Path) -> Result<CheckResult, CheckError> {
        self.check_with(path, None)
    }

    /// Check a narration with a caller-supplied script word count.
    pub fn check_audio(&self, path: &Path, expected_word_count: Option<u64>) -> Result<CheckResult, CheckError> {
        self.check_with(path, expected_word_count)
    }

    fn check_with(&self, path: &Path, expected_word_count: Option<u64>) -> Result<CheckResult, CheckError> {
        let started = Instant::now();
        let id = load::artifact_id(path);
        let span = tracing::info_span!(
            "check",
            { fields::ARTIFACT_ID } = %id,
            { fields::ARTIFACT_KIND } = self.kind.as_str()
        );
        let _entered = span.enter();

        let artifact = match self.load(path, &id, expected_word_count) {
            Ok(a) => a,
            Err(e) => {
                tracing::error!(error = %e, "artifact could not be loaded");
                self.record_error(path, &id, &e.to_string())?;
                return Ok(CheckResult::errored(id, e.to_string(), elapsed_ms(started)));
            }
        };

        let run = self.runner.run(self.active_gates(), &artifact);
        let metadata = self.report_metadata(&artifact);
        let report_error = match self.reporter.write_report(&id, artifact.path(), &run, metadata) {
            Ok(_) => None,
            Err(e) => {
                tracing::error!(error = %e, "quality report not written");
                Some(format!("report not written: {e}"))
            }
        };

        if run.has_critical_failure() {
            if let Err(e) = self.reporter.quarantine(artifact.path(), &id, QUARANTINE_REASON) {
                tracing::error!(error = %e, "quarantine failed");
            }
        }

        self.record_outcome(&artifact, &run, report_error.clone())?;

        let duration_ms = elapsed_ms(started);
        tracing::info!(
            status = %run.status,
            gates = run.gates_run(),
            { fields::CHECK_DURATION_MS } = duration_ms,
            "artifact checked"
        );
        Ok(CheckResult {
            artifact_id: id,
            passed: run.passed(),
            status: run.status.into(),
            duration_ms,
            gates_run: run.gates_run(),
            error: report_error,
        })
    }

    fn load(&self, path: &Path, id: &str, expected_word_count: Option<u64>) -> Result<Artifact, ArtifactError> {
        match self.kind {
            ArtifactKind::Script => Ok(load::load_script(path)?.into()),
            ArtifactKind::Audio => {
                if !path.is_file() {
                    return Err(ArtifactError::NotFound {
                        path: path.to_path_buf(),
                    });
                }
                let script_id = load::script_id_for_audio(id);
                let words = expected_word_count.or_else(|| self.script_word_count(&script_id));
                let mut audio = AudioArtifact::new(id, path).with_script(script_id);
                audio.expected_word_count = words;
                Ok(audio.into())
            }
        }
    }

    /// Word count recorded for `script_id`, refreshing the manifest snapshot
    /// once if the entry is not there yet.
    fn script_word_count(&self, script_id: &str) -> Option<u64> {
        if let Some(entry) = self.manifest.get_script(script_id) {
            return entry.word_count;
        }
        if let Err(e) = self.manifest.reload() {
            tracing::warn!(error = %e, "manifest reload failed");
        }
        self.manifest.get_script(script_id).and_then(|e| e.word_count)
    }

    fn report_metadata(&self, artifact: &Artifact) -> Map<String, Value> {
        let mut meta = Map::new();
        meta.insert("run_id".into(), Value::from(self.manifest.run_id()));
        if let Some(name) = artifact.path().file_name() {
            meta.insert("filename".into(), Value::from(name.to_string_lossy().into_owned()));
        }
        match artifact {
            Artifact::Script(s) => {
                meta.insert("topic".into(), Value::from(s.document.topic.clone()));
                meta.insert("word_count".into(), Value::from(script_word_count(s)));
            }
            Artifact::Audio(a) => {
                if let Some(script_id) = &a.script_id {
                    meta.insert("script_id".into(), Value::from(script_id.clone()));
                }
                meta.insert("word_count".into(), Value::from(a.expected_word_count));
            }
        }
        meta
    }

    fn record_outcome(
        &self,
        artifact: &Artifact,
        run: &RunOutcome,
        error: Option<String>,
    ) -> Result<(), CheckError> {
        let status: EntryStatus = run.status.into();
        let details = QualityDetails {
            error,
            ..QualityDetails::from_outcomes(&run.outcomes)
        };
        match artifact {
            Artifact::Script(s) => self.manifest.add_script(ScriptEntry {
                script_id: s.id.clone(),
                topic: s.document.topic.clone(),
                path: s.path.display().to_string(),
                quality_status: status,
                ready_for_audio: run.status != GateStatus::Fail,
                word_count: Some(script_word_count(s)),
                timestamp: reelgate_core::time::now(),
                quality_details: details,
            })?,
            Artifact::Audio(a) => self.manifest.add_audio(AudioEntry {
                audio_id: a.id.clone(),
                script_id: a.script_id.clone(),
                path: a.path.display().to_string(),
                quality_status: status,
                duration: self.probe.metadata(&a.path).ok().map(|m| m.duration_secs()),
                timestamp: reelgate_core::time::now(),
                quality_details: details,
            })?,
        }
        Ok(())
    }

    fn record_error(&self, path: &Path, id: &str, error: &str) -> Result<(), CheckError> {
        let now = reelgate_core::time::now();
        match self.kind {
            ArtifactKind::Script => self.manifest.add_script(ScriptEntry {
                script_id: id.to_string(),
                topic: "Error".to_string(),
                path: path.display().to_string(),
                quality_status: EntryStatus::Error,
                ready_for_audio: false,
                word_count: None,
                timestamp: now,
                quality_details: QualityDetails::from_error(error),
            })?,
            ArtifactKind::Audio => self.manifest.add_audio(AudioEntry {
                audio_id: id.to_string(),
                script_id: Some(load::script_id_for_audio(id)),
                path: path.display().to_string(),
                quality_status: EntryStatus::Error,
                duration: None,
                timestamp: now,
                quality_details: QualityDetails::from_error(error),
            })?,
        }
        Ok(())
    }

    /// Check every file; sequential with one worker, otherwise on a bounded
    /// pool. A failing or panicking worker yields an errored result for its
    /// file and never aborts the batch.
    pub fn check_all(&self, files: &[PathBuf]) -> BatchSummary {
        let workers = self.config.effective_workers();
        tracing::info!(files = files.len(), workers, "batch started");

        let results: Vec<CheckResult> = if workers <= 1 || files.len() <= 1 {
            files.iter().map(|f| self.check_guarded(f)).collect()
        } else {
            match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => pool.install(|| files.par_iter().map(|f| self.check_guarded(f)).collect()),
                Err(e) => {
                    tracing::warn!(error = %e, "worker pool unavailable; checking sequentially");
                    files.iter().map(|f| self.check_guarded(f)).collect()
                }
            }
        };

        let summary = BatchSummary::from_results(results);
        if let Err(e) = self.flush_metrics() {
            tracing::warn!(error = %e, "metrics flush failed");
        }
        tracing::info!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            total_duration_ms = summary.total_duration_ms,
            "batch finished"
        );
        summary
    }

    fn check_guarded(&self, path: &Path) -> CheckResult {
        let started = Instant::now();
        let error = match catch_unwind(AssertUnwindSafe(|| self.check_one(path))) {
            Ok(Ok(result)) => return result,
            Ok(Err(e)) => {
                tracing::error!(path = %path.display(), error = %e, "worker failed");
                e.to_string()
            }
            Err(_) => {
                tracing::error!(path = %path.display(), "worker panicked");
                "worker panicked".to_string()
            }
        };
        let id = load::artifact_id(path);
        if let Err(e) = self.record_error(path, &id, &error) {
            tracing::error!(path = %path.display(), error = %e, "error entry not recorded");
        }
        CheckResult::errored(id, error, elapsed_ms(started))
    }

    /// Candidate files in `dir` for this checker's kind.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>, ArtifactError> {
        match self.kind {
            ArtifactKind::Script => load::discover_scripts(dir),
            ArtifactKind::Audio => load::discover_audio(dir),
        }
    }

    /// Paths of `fail`/`error` entries of this kind whose files still exist.
    pub fn failed_artifacts(&self) -> Result<Vec<PathBuf>, CheckError> {
        self.manifest.reload()?;
        let paths: Vec<PathBuf> = match self.kind {
            ArtifactKind::Script => self
                .manifest
                .get_failed_scripts()
                .into_iter()
                .map(|e| PathBuf::from(e.path))
                .collect(),
            ArtifactKind::Audio => self
                .manifest
                .get_failed_audio()
                .into_iter()
                .map(|e| PathBuf::from(e.path))
                .collect(),
        };
        Ok(paths.into_iter().filter(|p| p.exists()).collect())
    }

    /// Re-run only the artifacts that failed.
    pub fn reprocess_failures(&self) -> Result<BatchSummary, CheckError> {
        let failed = self.failed_artifacts()?;
        tracing::info!(count = failed.len(), "reprocessing failed artifacts");
        Ok(self.check_all(&failed))
    }

    /// Publish counters (and decode cache stats) to `<quality_gates>/metrics/metrics.prom`.
    pub fn flush_metrics(&self) -> Result<(), CheckError> {
        self.flush_metrics_to(&TextfileSink::new(self.paths.metrics_file()))
    }

    pub fn flush_metrics_to(&self, sink: &dyn MetricsSink) -> Result<(), CheckError> {
        if let Some(cache) = &self.cache {
            let stats = cache.stats();
            for s in &stats {
                tracing::debug!(cache = s.kind, { fields::CACHE_HIT_RATE } = s.hit_rate(), "decode cache");
            }
            self.metrics.set_cache_stats(&stats);
        }
        self.metrics.flush(sink)?;
        Ok(())
    }
}

fn script_word_count(s: &reelgate_core::types::ScriptArtifact) -> u64 {
    s.document
        .metadata
        .word_count
        .unwrap_or_else(|| s.word_count() as u64)
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
