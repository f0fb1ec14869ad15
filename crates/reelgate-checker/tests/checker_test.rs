//! End-to-end checks through the façade against a temporary output tree.

use std::path::{Path, PathBuf};

use reelgate_checker::{Checker, MetricsAggregator, QualityReport, SummaryReporter};
use reelgate_core::types::GateStatus;
use reelgate_core::{CheckerConfig, QualityPolicy};
use reelgate_storage::{EntryStatus, RunManifest};
use serde_json::json;

const GOOD_CONTENT: &str = "O gato subiu no telhado e não quis descer para o jantar. \
Depois de uma hora ele finalmente voltou para casa.";

fn config(out: &Path) -> CheckerConfig {
    CheckerConfig {
        output_dir: Some(out.to_path_buf()),
        ..CheckerConfig::default()
    }
}

fn script_policy() -> QualityPolicy {
    QualityPolicy::from_json_str(
        r#"{
            "script": {"min_words": 10, "max_words": 200, "forbidden_terms": ["proibido"]},
            "severity": {"language": "warn"},
            "ordering": {
                "script": ["schema_validation", "word_bounds", "forbidden_terms",
                           "language", "script_completeness", "duplicates"]
            }
        }"#,
    )
    .unwrap()
}

fn write_script(dir: &Path, id: &str, content: &str) -> PathBuf {
    let path = dir.join(format!("{id}.json"));
    let doc = json!({
        "topic": "gatos",
        "content": content,
        "metadata": {"model": "test", "timestamp": "2026-01-01T00:00:00Z"}
    });
    std::fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
    path
}

fn write_wav(path: &Path, seconds: f64) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut w = hound::WavWriter::create(path, spec).unwrap();
    let n = (seconds * 16_000.0) as usize;
    for i in 0..n {
        let s = 0.1 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 16_000.0).sin();
        w.write_sample((s * f32::from(i16::MAX)) as i16).unwrap();
    }
    w.finalize().unwrap();
}

fn manifest(out: &Path) -> RunManifest {
    RunManifest::open(out.join("quality_gates/run_manifest.json")).unwrap()
}

#[test]
fn check_one_is_an_idempotent_overwrite() {
    let out = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let path = write_script(src.path(), "script_001_gatos", GOOD_CONTENT);
    let checker = Checker::script(config(out.path()), script_policy()).unwrap();

    let first = checker.check_one(&path).unwrap();
    let second = checker.check_one(&path).unwrap();
    assert!(first.passed && second.passed, "{first:?}");
    assert_eq!(second.gates_run, 6);

    let doc = manifest(out.path()).snapshot();
    assert_eq!(doc.scripts.len(), 1);
    let entry = &doc.scripts[0];
    assert_eq!(entry.script_id, "script_001_gatos");
    assert_eq!(entry.quality_status, EntryStatus::Pass);
    assert!(entry.ready_for_audio);
    assert_eq!(entry.word_count, Some(21));
    assert_eq!(entry.quality_details.gates.len(), 6);
}

#[test]
fn critical_failure_is_reported_and_quarantined() {
    let out = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let path = write_script(src.path(), "script_002_curto", "Curto demais.");
    let checker = Checker::script(config(out.path()), script_policy()).unwrap();

    let result = checker.check_one(&path).unwrap();
    assert!(!result.passed);
    assert_eq!(result.status, EntryStatus::Fail);
    // schema_validation and word_bounds ran; the rest were skipped.
    assert_eq!(result.gates_run, 2);

    let report = QualityReport::load(&checker.reporter().report_path("script_002_curto")).unwrap();
    assert_eq!(report.quality.status, GateStatus::Fail);
    assert_eq!(report.gate_results.len(), 6);
    assert_eq!(report.gate_results[1].gate_name, "word_bounds");
    assert_eq!(report.gate_results[1].status, GateStatus::Fail);
    assert!(report.gate_results[2..]
        .iter()
        .all(|g| g.status == GateStatus::Skipped));
    assert_eq!(report.metadata["topic"], "gatos");

    let quarantine = checker.reporter().quarantine_dir();
    assert!(quarantine.join("script_002_curto.json").is_file());
    let reason = std::fs::read_to_string(quarantine.join("script_002_curto_reason.txt")).unwrap();
    assert!(reason.contains("Reason: Critical quality gate failure"));
    assert!(reason.contains(&format!("Original path: {}", path.display())));
    assert!(path.is_file(), "original must stay in place");

    let entry = checker.manifest().get_script("script_002_curto").unwrap();
    assert!(!entry.ready_for_audio);
    assert_eq!(checker.failed_artifacts().unwrap(), vec![path]);
}

#[test]
fn load_errors_become_error_entries_and_batch_continues() {
    let out = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let good = write_script(src.path(), "script_003_ok", GOOD_CONTENT);
    let missing = src.path().join("script_004_missing.json");
    let checker = Checker::script(config(out.path()), script_policy()).unwrap();

    let summary = checker.check_all(&[missing, good]);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.exit_code(false), 0);
    assert_eq!(summary.exit_code(true), 1);

    let errored = &summary.results[0];
    assert_eq!(errored.status, EntryStatus::Error);
    assert!(errored.error.is_some());

    let entry = checker.manifest().get_script("script_004_missing").unwrap();
    assert_eq!(entry.quality_status, EntryStatus::Error);
    assert!(entry.quality_details.error.is_some());
}

#[test]
fn disabled_gates_pass_through() {
    let out = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let path = write_script(src.path(), "script_005_x", "curto");
    let cfg = CheckerConfig {
        disable_gates: Some(true),
        ..config(out.path())
    };
    let checker = Checker::script(cfg, script_policy()).unwrap();

    let result = checker.check_one(&path).unwrap();
    assert!(result.passed);
    assert_eq!(result.gates_run, 0);
    assert_eq!(result.status, EntryStatus::Pass);
}

#[test]
fn parallel_batch_records_every_artifact() {
    let out = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let files: Vec<PathBuf> = (0..12)
        .map(|i| {
            let content = format!("{GOOD_CONTENT} Esta é a versão número {i} do texto.");
            write_script(src.path(), &format!("script_{i:03}_lote"), &content)
        })
        .collect();
    let cfg = CheckerConfig {
        workers: Some(4),
        ..config(out.path())
    };
    let checker = Checker::script(cfg, script_policy()).unwrap();

    let summary = checker.check_all(&files);
    assert_eq!(summary.total, 12);
    assert_eq!(summary.passed, 12, "{:?}", summary.results);

    let doc = manifest(out.path()).snapshot();
    assert_eq!(doc.scripts.len(), 12);

    let metrics = std::fs::read_to_string(checker.paths().metrics_file()).unwrap();
    assert!(metrics.contains(
        "quality_gate_runs_total{gate=\"word_bounds\",status=\"pass\",artifact_type=\"script\""
    ));
    assert!(metrics.contains("} 12\n"));
}

#[test]
fn duplicate_content_fails_second_script() {
    let out = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let a = write_script(src.path(), "script_010_a", GOOD_CONTENT);
    let b = write_script(src.path(), "script_011_b", GOOD_CONTENT);
    let checker = Checker::script(config(out.path()), script_policy()).unwrap();

    assert!(checker.check_one(&a).unwrap().passed);
    let second = checker.check_one(&b).unwrap();
    assert!(!second.passed);
    let entry = checker.manifest().get_script("script_011_b").unwrap();
    let dup = entry
        .quality_details
        .gates
        .iter()
        .find(|g| g.gate == "duplicates")
        .unwrap();
    assert_eq!(dup.code, "DUPLICATE_FOUND");
}

#[test]
fn reprocess_picks_up_fixed_artifacts() {
    let out = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let path = write_script(src.path(), "script_020_fix", "Curto demais.");
    let checker = Checker::script(config(out.path()), script_policy()).unwrap();
    assert!(!checker.check_one(&path).unwrap().passed);

    write_script(src.path(), "script_020_fix", GOOD_CONTENT);
    let summary = checker.reprocess_failures().unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.passed, 1);
    assert!(checker.failed_artifacts().unwrap().is_empty());
}

#[test]
fn policy_snapshot_is_recorded_once() {
    let out = tempfile::tempdir().unwrap();
    let first = Checker::script(config(out.path()), script_policy()).unwrap();
    let hash = first.manifest().config_hash();
    assert_eq!(hash, script_policy().fingerprint());

    let _second = Checker::script(config(out.path()), script_policy()).unwrap();
    let snapshots: Vec<_> = std::fs::read_dir(out.path().join("quality_gates/config_snapshots"))
        .unwrap()
        .collect();
    assert_eq!(snapshots.len(), 1);
}

#[test]
fn audio_uses_script_word_count_from_manifest() {
    let out = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let script = write_script(src.path(), "script_030_som", GOOD_CONTENT);
    Checker::script(config(out.path()), script_policy())
        .unwrap()
        .check_one(&script)
        .unwrap();

    let policy = QualityPolicy::from_json_str(
        r#"{"ordering": {"audio": ["audio_format", "duration_consistency"]}}"#,
    )
    .unwrap();
    let audio = Checker::audio(config(out.path()), policy).unwrap();

    // 21 words over 6 s = 3.5 words/sec.
    let ok = src.path().join("script_030_som_audio.wav");
    write_wav(&ok, 6.0);
    let result = audio.check_one(&ok).unwrap();
    assert!(result.passed, "{result:?}");
    let entry = audio.manifest().get_audio("script_030_som_audio").unwrap();
    assert_eq!(entry.script_id.as_deref(), Some("script_030_som"));
    assert!((entry.duration.unwrap() - 6.0).abs() < 1e-6);

    // Same words over 1 s: too fast.
    let fast = src.path().join("audio_script_030_som.wav");
    write_wav(&fast, 1.0);
    let result = audio.check_one(&fast).unwrap();
    assert!(!result.passed);

    // A caller-supplied count wins.
    let result = audio.check_audio(&fast, Some(3)).unwrap();
    assert!(result.passed);
}

#[test]
fn summary_folds_written_reports() {
    let out = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let good = write_script(src.path(), "script_040_bom", GOOD_CONTENT);
    let bad = write_script(src.path(), "script_041_ruim", "Curto demais.");
    let checker = Checker::script(config(out.path()), script_policy()).unwrap();
    checker.check_all(&[good, bad]);

    let reporter = SummaryReporter::new(checker.paths().summary());
    let summary = reporter
        .generate(&checker.reporter().list_reports(), &[])
        .unwrap();
    assert_eq!(summary.scripts.total, 2);
    assert_eq!(summary.scripts.passed, 1);
    assert_eq!(summary.scripts.failed, 1);
    assert_eq!(summary.overall.total_artifacts, 2);
    assert_eq!(summary.scripts.gate_statistics["word_bounds"].fail, 1);
    assert!(reporter.path().is_file());
}

#[test]
fn metrics_rebuild_from_saved_reports() {
    let out = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let good = write_script(src.path(), "script_050_bom", GOOD_CONTENT);
    let bad = write_script(src.path(), "script_051_ruim", "Curto demais.");
    let checker = Checker::script(config(out.path()), script_policy()).unwrap();
    checker.check_all(&[good, bad]);
    std::fs::write(checker.reporter().reports_dir().join("broken.json"), "{").unwrap();

    let rebuilt = MetricsAggregator::new(None);
    assert_eq!(rebuilt.fold_reports_dir(checker.reporter().reports_dir()), 2);
    assert_eq!(rebuilt.runs("word_bounds", GateStatus::Pass), 1);
    assert_eq!(rebuilt.runs("word_bounds", GateStatus::Fail), 1);
    assert_eq!(rebuilt.runs("duplicates", GateStatus::Skipped), 1);
    assert_eq!(
        rebuilt.runs("word_bounds", GateStatus::Pass),
        checker.metrics().runs("word_bounds", GateStatus::Pass)
    );
}

#[test]
fn unwritable_report_still_leaves_a_manifest_entry() {
    let out = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let path = write_script(src.path(), "script_060_sem_relatorio", GOOD_CONTENT);
    let checker = Checker::script(config(out.path()), script_policy()).unwrap();

    // A plain file where the reports directory should be.
    let reports = checker.reporter().reports_dir().to_path_buf();
    std::fs::create_dir_all(reports.parent().unwrap()).unwrap();
    std::fs::write(&reports, "not a directory").unwrap();

    let summary = checker.check_all(&[path]);
    assert_eq!(summary.total, 1);
    let result = &summary.results[0];
    assert!(result.error.as_deref().unwrap().contains("report not written"));

    let doc = manifest(out.path()).snapshot();
    assert_eq!(doc.scripts.len(), 1);
    let entry = &doc.scripts[0];
    assert_eq!(entry.script_id, "script_060_sem_relatorio");
    assert_eq!(entry.quality_status, EntryStatus::Pass);
    assert_eq!(entry.quality_details.gates.len(), 6);
    assert!(entry
        .quality_details
        .error
        .as_deref()
        .unwrap()
        .contains("report not written"));
}
