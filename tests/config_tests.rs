// Configuration loading: defaults and file overrides

use field_scribe::Config;
use std::io::Write;
use std::time::Duration;

#[test]
fn test_defaults() {
    let cfg = Config::defaults().unwrap();

    assert_eq!(cfg.service.http.port, 3000);
    assert!(cfg.service.http.static_dir.is_none());
    assert_eq!(cfg.transcription.sample_rate, 16000);
    assert_eq!(cfg.transcription.channels, 1);
    assert!(cfg.transcription.diarize);
    assert_eq!(cfg.transcription.handoff_after(), Duration::from_secs(55 * 60));
    assert_eq!(cfg.extraction.interval_secs, 10);
    assert_eq!(cfg.extraction.timeout_secs, 15);
    assert_eq!(cfg.extraction.min_delta_chars, 10);
    assert_eq!(cfg.transcript.trim_threshold, 50_000);
    assert_eq!(cfg.transcript.keep_suffix, 40_000);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent");

    let cfg = Config::load(path.to_str().unwrap()).unwrap();

    assert_eq!(cfg.service.name, "field-scribe");
    assert_eq!(cfg.extraction.model, "gpt-4o-mini");
}

#[test]
fn test_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scribe.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"
[service.http]
port = 8088
static_dir = "public"

[extraction]
model = "local-model"
interval_secs = 5

[transcript]
trim_threshold = 2000
keep_suffix = 1500
"#
    )
    .unwrap();

    let cfg = Config::load(path.to_str().unwrap()).unwrap();

    assert_eq!(cfg.service.http.port, 8088);
    assert_eq!(cfg.service.http.static_dir.as_deref(), Some("public"));
    assert_eq!(cfg.service.http.bind, "0.0.0.0");
    assert_eq!(cfg.extraction.model, "local-model");
    assert_eq!(cfg.extraction.interval_secs, 5);
    assert_eq!(cfg.extraction.timeout_secs, 15);
    assert_eq!(cfg.transcript.trim_threshold, 2000);
    assert_eq!(cfg.transcript.keep_suffix, 1500);
}

#[test]
fn test_invalid_value_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[service.http]\nport = \"not a port\"\n").unwrap();

    assert!(Config::load(path.to_str().unwrap()).is_err());
}
