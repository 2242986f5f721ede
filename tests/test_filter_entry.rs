use flowlens::filter::{FilterDirection, FilterEntry, FilterKind, FilterParseError};

#[test]
fn test_canonical_string_round_trips_for_every_kind() {
    let entries = vec![
        FilterEntry::label("app=frontend"),
        FilterEntry::label("world"),
        FilterEntry::ip("10.0.0.1"),
        FilterEntry::dns("api.cluster.local"),
        FilterEntry::identity("4112"),
        FilterEntry::tcp_flag("syn"),
        FilterEntry::pod("coredns-abc12"),
        FilterEntry::ip("192.168.1.1").with_direction(FilterDirection::From),
        FilterEntry::dns("db.local")
            .with_direction(FilterDirection::To)
            .with_negated(true),
    ];

    for entry in entries {
        let reparsed = FilterEntry::parse_full(&entry.to_string())
            .unwrap_or_else(|err| panic!("'{entry}' must reparse, got {err}"));
        assert_eq!(
            reparsed, entry,
            "strict parse of the canonical string must reproduce the entry"
        );
    }
}

#[test]
fn test_factories_normalize_redundant_prefixes() {
    // values pasted back from a rendered clause keep working
    let entry = FilterEntry::ip("ip=10.0.0.1");
    assert_eq!(entry.query(), "10.0.0.1");

    let entry = FilterEntry::label("from:label=app=core");
    assert_eq!(entry.query(), "app=core");
}

#[test]
fn test_query_normalization_is_idempotent() {
    for (kind, raw) in [
        (FilterKind::Label, "  both:label=app=core  "),
        (FilterKind::Ip, "from:ip=10.0.0.1"),
        (FilterKind::Dns, "to:dns=svc.local"),
        (FilterKind::Identity, "identity=123"),
    ] {
        let once = FilterEntry::parse_query(kind, raw);
        let twice = FilterEntry::parse_query(kind, &once);
        assert_eq!(once, twice, "normalizing '{raw}' twice must equal once");
    }
}

#[test]
fn test_lenient_parse_never_fails_on_non_empty_input() {
    for raw in [
        "plain-text",
        "from:anything",
        "weird:kind=value",
        "a=b=c",
        "!negated-free-text",
        "1.2.3.4:8080",
    ] {
        let entry = FilterEntry::parse(raw)
            .unwrap_or_else(|| panic!("lenient parse must accept '{raw}'"));
        assert!(!entry.query().is_empty());
    }

    assert!(FilterEntry::parse("").is_none());
    assert!(FilterEntry::parse("  \t ").is_none());
}

#[test]
fn test_lenient_parse_degrades_to_label_search() {
    let entry = FilterEntry::parse("some free text").expect("non-empty input");
    assert_eq!(entry.kind(), FilterKind::Label);
    assert_eq!(entry.direction(), FilterDirection::Both);
    assert_eq!(entry.query(), "some free text");
}

#[test]
fn test_strict_parse_rejects_what_lenient_accepts() {
    for raw in ["plain-text", "from:anything", "weird:kind=value"] {
        assert!(
            FilterEntry::parse_full(raw).is_err(),
            "strict parse must reject '{raw}'"
        );
        assert!(
            FilterEntry::parse(raw).is_some(),
            "lenient parse must accept '{raw}'"
        );
    }
}

#[test]
fn test_strict_parse_error_reasons() {
    assert!(matches!(
        FilterEntry::parse_full("upward:label=x"),
        Err(FilterParseError::UnknownDirection(_))
    ));
    assert!(matches!(
        FilterEntry::parse_full("from:port=80"),
        Err(FilterParseError::UnknownKind(_))
    ));
    assert!(matches!(
        FilterEntry::parse_full("from:ip=  "),
        Err(FilterParseError::EmptyQuery(_))
    ));
    assert!(matches!(
        FilterEntry::parse_full(""),
        Err(FilterParseError::MalformedClause(_))
    ));
}

#[test]
fn test_negation_survives_round_trip() {
    let entry = FilterEntry::parse_full("!both:label=app=core").expect("valid clause");
    assert!(entry.is_negative());
    assert_eq!(entry.to_string(), "!both:label=app=core");

    let positive = entry.with_negated(false);
    assert_eq!(positive.to_string(), "both:label=app=core");
}

#[test]
fn test_label_key_value_with_and_without_value() {
    let keyed = FilterEntry::label("team");
    assert_eq!(keyed.label_key_value(), ("team", ""));

    let pair = FilterEntry::label("team=platform");
    assert_eq!(pair.label_key_value(), ("team", "platform"));

    // only the first '=' splits
    let nested = FilterEntry::label("config=a=b");
    assert_eq!(nested.label_key_value(), ("config", "a=b"));
}

#[test]
fn test_pod_selector_carries_namespace_out_of_band() {
    let scoped = FilterEntry::pod_selector("coredns-abc12", "kube-system");
    assert_eq!(scoped.pod_namespace(), Some("kube-system"));

    // meta does not participate in identity or rendering
    assert_eq!(scoped, FilterEntry::pod("coredns-abc12"));
    assert_eq!(scoped.to_string(), "both:pod=coredns-abc12");

    let unscoped = FilterEntry::pod_selector("coredns-abc12", "");
    assert_eq!(unscoped.pod_namespace(), None);
}
