//! Tests for policy loading and checker configuration.

use std::fs;
use std::sync::Mutex;

use reelgate_core::config::{CheckerConfig, CheckerOverrides, QualityPolicy};
use reelgate_core::errors::ConfigError;
use reelgate_core::types::{ArtifactKind, Severity};

static ENV_MUTEX: Mutex<()> = Mutex::new(());

const POLICY: &str = r#"{
  "enabled": true,
  "llm_assisted": true,
  "script": {
    "min_words": 50,
    "max_words": 400,
    "forbidden_terms": ["Lorem"],
    "language": "pt-BR"
  },
  "audio": { "min_sample_rate": 22050 },
  "severity": { "language": "warn", "script_completeness": "warn" },
  "ordering": {
    "script": ["schema", "word_bounds", "forbidden_terms", "language"],
    "audio": ["audio_format", "duration_consistency"]
  }
}"#;

#[test]
fn load_policy_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quality_policy.json");
    fs::write(&path, POLICY).unwrap();

    let policy = QualityPolicy::load(&path).unwrap();
    assert!(policy.llm_assisted);
    assert_eq!(policy.script.effective_min_words(), 50);
    assert_eq!(policy.audio.effective_min_sample_rate(), 22050);
    assert_eq!(policy.severity_of("language"), Severity::Warn);
    assert_eq!(policy.severity_of("word_bounds"), Severity::Error);
    assert_eq!(policy.ordering_for(ArtifactKind::Audio).len(), 2);
    assert_eq!(policy.source_path(), Some(path.as_path()));
    assert_eq!(policy.base_dir(), dir.path());
}

#[test]
fn warning_is_accepted_as_warn_severity() {
    let policy = QualityPolicy::from_json_str(
        r#"{"severity": {"silence": "warning", "loudness": "warn"}}"#,
    )
    .unwrap();
    assert_eq!(policy.severity_of("silence"), Severity::Warn);
    assert_eq!(policy.severity_of("loudness"), Severity::Warn);
    assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warn);
    assert_eq!(policy.canonical_value()["severity"]["silence"], "warn");
}

#[test]
fn missing_policy_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = QualityPolicy::load(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

#[test]
fn malformed_policy_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quality_policy.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        QualityPolicy::load(&path).unwrap_err(),
        ConfigError::ParseError { .. }
    ));
}

#[test]
fn schema_next_to_policy_is_enforced() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("schemas")).unwrap();
    fs::write(
        dir.path().join("schemas/quality_policy.json"),
        r#"{
          "type": "object",
          "required": ["enabled", "ordering"],
          "properties": {
            "enabled": {"type": "boolean"},
            "ordering": {"type": "object"}
          }
        }"#,
    )
    .unwrap();
    let path = dir.path().join("quality_policy.json");
    fs::write(&path, r#"{"enabled": "yes"}"#).unwrap();

    match QualityPolicy::load(&path).unwrap_err() {
        ConfigError::SchemaViolations { errors, .. } => {
            assert_eq!(errors.len(), 2, "{errors:?}");
        }
        other => panic!("unexpected error: {other}"),
    }

    fs::write(&path, POLICY).unwrap();
    assert!(QualityPolicy::load(&path).is_ok());
}

#[test]
fn max_words_below_min_is_rejected() {
    let err = QualityPolicy::from_json_str(r#"{"script": {"min_words": 100}}"#);
    assert!(err.is_ok(), "default max 2000 is above 100");
    let err = QualityPolicy::from_json_str(r#"{"script": {"min_words": 3000}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationFailed { .. }));
}

#[test]
fn fingerprint_changes_with_content() {
    let a = QualityPolicy::from_json_str(POLICY).unwrap();
    let b = QualityPolicy::from_json_str(&POLICY.replace("400", "401")).unwrap();
    assert_ne!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.fingerprint(), QualityPolicy::from_json_str(POLICY).unwrap().fingerprint());
}

#[test]
fn checker_config_layers() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("reelgate.toml"),
        "workers = 4\nstrict = true\noutput_dir = \"from_file\"\n",
    )
    .unwrap();

    std::env::set_var("REELGATE_WORKERS", "8");
    let overrides = CheckerOverrides {
        output_dir: Some("from_override".into()),
        ..Default::default()
    };
    let config = CheckerConfig::load(dir.path(), Some(&overrides)).unwrap();
    std::env::remove_var("REELGATE_WORKERS");

    assert_eq!(config.effective_workers(), 8);
    assert!(config.effective_strict());
    assert_eq!(config.effective_output_dir(), std::path::PathBuf::from("from_override"));
    assert!(config.effective_lazy());
}

#[test]
fn checker_config_bad_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("reelgate.toml"), "workers = [").unwrap();
    assert!(matches!(
        CheckerConfig::load(dir.path(), None).unwrap_err(),
        ConfigError::ParseError { .. }
    ));
}
