use flowlens::config::{ConfigError, load_config, load_config_from_path};
use flowlens::filter::MatchMode;
use flowlens::frame::Verdict;
use std::io::Write as _;

fn write_config(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(body.as_bytes()).expect("write config");
    file
}

#[test]
fn test_default_config_has_no_presets() {
    let config = load_config(None).expect("default config loads");
    assert!(config.presets.is_empty());
}

#[test]
fn test_preset_round_trips_into_filters() {
    let file = write_config(
        r#"
[presets.dns-noise]
filter = "!to:dns=kube-dns.kube-system.svc.cluster.local tcp-flag=syn"
namespace = "ns1"
verdict = "forwarded"
http_status = "4+"
skip_kube_dns = true
mode = "all"
"#,
    );

    let config = load_config_from_path(file.path()).expect("config parses");
    let filters = config.preset("dns-noise").expect("preset exists").to_filters();

    assert_eq!(filters.namespace.as_deref(), Some("ns1"));
    assert_eq!(filters.verdict, Some(Verdict::Forwarded));
    assert_eq!(filters.http_status.as_deref(), Some("4+"));
    assert!(filters.skip_kube_dns);
    assert!(!filters.skip_host);
    assert_eq!(filters.mode, MatchMode::All);

    let clauses: Vec<String> = filters.entries.iter().map(ToString::to_string).collect();
    assert_eq!(
        clauses,
        vec![
            "!to:dns=kube-dns.kube-system.svc.cluster.local".to_string(),
            "both:tcp-flag=syn".to_string(),
        ]
    );
}

#[test]
fn test_unknown_preset_lists_available_names() {
    let file = write_config(
        r#"
[presets.one]
filter = "label=a"

[presets.two]
filter = "label=b"
"#,
    );

    let config = load_config_from_path(file.path()).expect("config parses");
    let err = config.preset("three").expect_err("unknown preset fails");

    let message = err.to_string();
    assert!(message.contains("three"));
    assert!(message.contains("one") && message.contains("two"));
}

#[test]
fn test_malformed_config_reports_parse_error() {
    let file = write_config("presets = \"not a table\"");

    match load_config_from_path(file.path()) {
        Err(ConfigError::Parse { path, .. }) => {
            assert!(path.contains(file.path().file_name().unwrap().to_str().unwrap()));
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_missing_config_reports_read_error() {
    let missing = std::path::Path::new("/definitely/not/here/flowlens.toml");

    assert!(matches!(
        load_config_from_path(missing),
        Err(ConfigError::Read { .. })
    ));
}

#[test]
fn test_empty_preset_produces_default_filters() {
    let file = write_config("[presets.empty]\n");

    let config = load_config_from_path(file.path()).expect("config parses");
    let filters = config.preset("empty").expect("preset exists").to_filters();

    assert_eq!(filters, flowlens::filter::Filters::default());
}
