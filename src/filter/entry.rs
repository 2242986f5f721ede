use super::error::FilterParseError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Attribute class a clause matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Label,
    Ip,
    Dns,
    Identity,
    TcpFlag,
    Pod,
}

impl FilterKind {
    pub fn token(&self) -> &'static str {
        match self {
            FilterKind::Label => "label",
            FilterKind::Ip => "ip",
            FilterKind::Dns => "dns",
            FilterKind::Identity => "identity",
            FilterKind::TcpFlag => "tcp-flag",
            FilterKind::Pod => "pod",
        }
    }
}

impl FromStr for FilterKind {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "label" => Ok(FilterKind::Label),
            "ip" => Ok(FilterKind::Ip),
            "dns" => Ok(FilterKind::Dns),
            "identity" => Ok(FilterKind::Identity),
            "tcp-flag" => Ok(FilterKind::TcpFlag),
            "pod" => Ok(FilterKind::Pod),
            _ => Err(FilterParseError::UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Which side of a directed entity must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterDirection {
    From,
    To,
    Both,
}

impl FilterDirection {
    pub fn token(&self) -> &'static str {
        match self {
            FilterDirection::From => "from",
            FilterDirection::To => "to",
            FilterDirection::Both => "both",
        }
    }
}

impl FromStr for FilterDirection {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "from" => Ok(FilterDirection::From),
            "to" => Ok(FilterDirection::To),
            "both" => Ok(FilterDirection::Both),
            _ => Err(FilterParseError::UnknownDirection(s.to_string())),
        }
    }
}

impl fmt::Display for FilterDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One clause of the filter query language: `[!]{direction}:{kind}={query}`.
///
/// The type is immutable; every mutator returns a modified clone and every
/// construction path normalizes the query, so a stored query never retains a
/// leading direction or kind token.
#[derive(Debug, Clone)]
pub struct FilterEntry {
    kind: FilterKind,
    direction: FilterDirection,
    query: String,
    negative: bool,
    meta: Option<String>,
}

impl FilterEntry {
    fn new(
        kind: FilterKind,
        direction: FilterDirection,
        query: &str,
        negative: bool,
        meta: Option<String>,
    ) -> Self {
        Self {
            kind,
            direction,
            query: Self::parse_query(kind, query),
            negative,
            meta,
        }
    }

    /// Strict parser. Both separators must be present and both tokens must
    /// validate; the query must be non-empty after normalization.
    pub fn parse_full(input: &str) -> Result<Self, FilterParseError> {
        let trimmed = input.trim();
        let (negative, rest) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (direction_token, rest) = rest
            .split_once(':')
            .ok_or_else(|| FilterParseError::MalformedClause(trimmed.to_string()))?;
        let direction: FilterDirection = direction_token.trim().parse()?;

        let (kind_token, raw_query) = rest
            .split_once('=')
            .ok_or_else(|| FilterParseError::MalformedClause(trimmed.to_string()))?;
        let kind: FilterKind = kind_token.trim().parse()?;

        let query = Self::parse_query(kind, raw_query);
        if query.is_empty() {
            return Err(FilterParseError::EmptyQuery(kind.token().to_string()));
        }

        Ok(Self {
            kind,
            direction,
            query,
            negative,
            meta: None,
        })
    }

    /// Lenient parser. A missing or unrecognized direction defaults to
    /// `both`, a missing or unrecognized kind to `label` with the remainder
    /// as free-text query. Returns `None` only for input that is empty after
    /// trimming.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        let (negative, rest) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (direction, after_direction) = match rest.split_once(':') {
            Some((prefix, tail)) => match prefix.trim().parse::<FilterDirection>() {
                Ok(direction) => (direction, tail),
                Err(_) => (FilterDirection::Both, rest),
            },
            None => (FilterDirection::Both, rest),
        };

        let (kind, raw_query) = match after_direction.split_once('=') {
            Some((prefix, tail)) => match prefix.trim().parse::<FilterKind>() {
                Ok(kind) => (kind, tail),
                Err(_) => (FilterKind::Label, after_direction),
            },
            None => (FilterKind::Label, after_direction),
        };

        let entry = Self::new(kind, direction, raw_query, negative, None);
        if !entry.query.is_empty() {
            return Some(entry);
        }

        // "ip=" and friends degrade to a free-text label search
        let fallback = Self::new(FilterKind::Label, direction, after_direction, negative, None);
        (!fallback.query.is_empty()).then_some(fallback)
    }

    /// Normalizes a raw query: trims, strips one leftover direction prefix
    /// and one redundant `{kind}=` prefix for the resolved kind.
    pub fn parse_query(kind: FilterKind, raw: &str) -> String {
        let mut query = raw.trim();

        for direction in [
            FilterDirection::From,
            FilterDirection::To,
            FilterDirection::Both,
        ] {
            if let Some(rest) = query.strip_prefix(direction.token()) {
                if let Some(rest) = rest.strip_prefix(':') {
                    query = rest;
                    break;
                }
            }
        }

        if let Some(rest) = query.strip_prefix(kind.token()) {
            if let Some(rest) = rest.strip_prefix('=') {
                query = rest;
            }
        }

        query.trim().to_string()
    }

    pub fn label(query: impl Into<String>) -> Self {
        Self::new(FilterKind::Label, FilterDirection::Both, &query.into(), false, None)
    }

    pub fn ip(query: impl Into<String>) -> Self {
        Self::new(FilterKind::Ip, FilterDirection::Both, &query.into(), false, None)
    }

    pub fn dns(query: impl Into<String>) -> Self {
        Self::new(FilterKind::Dns, FilterDirection::Both, &query.into(), false, None)
    }

    pub fn identity(query: impl Into<String>) -> Self {
        Self::new(FilterKind::Identity, FilterDirection::Both, &query.into(), false, None)
    }

    pub fn tcp_flag(query: impl Into<String>) -> Self {
        Self::new(FilterKind::TcpFlag, FilterDirection::Both, &query.into(), false, None)
    }

    pub fn pod(query: impl Into<String>) -> Self {
        Self::new(FilterKind::Pod, FilterDirection::Both, &query.into(), false, None)
    }

    /// Pod clause built from a structured selector; the namespace travels in
    /// `meta` so the backend query can scope the pod name.
    pub fn pod_selector(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::new(
            FilterKind::Pod,
            FilterDirection::Both,
            &name.into(),
            false,
            Some(namespace.into()),
        )
    }

    pub fn with_direction(&self, direction: FilterDirection) -> Self {
        Self {
            direction,
            ..self.clone()
        }
    }

    pub fn with_kind(&self, kind: FilterKind) -> Self {
        Self::new(kind, self.direction, &self.query, self.negative, self.meta.clone())
    }

    pub fn with_query(&self, query: &str) -> Self {
        Self::new(self.kind, self.direction, query, self.negative, self.meta.clone())
    }

    pub fn with_negated(&self, negative: bool) -> Self {
        Self {
            negative,
            ..self.clone()
        }
    }

    pub fn with_meta(&self, meta: impl Into<String>) -> Self {
        Self {
            meta: Some(meta.into()),
            ..self.clone()
        }
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn direction(&self) -> FilterDirection {
        self.direction
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn meta(&self) -> Option<&str> {
        self.meta.as_deref()
    }

    pub fn from_required(&self) -> bool {
        matches!(self.direction, FilterDirection::From | FilterDirection::Both)
    }

    pub fn to_required(&self) -> bool {
        matches!(self.direction, FilterDirection::To | FilterDirection::Both)
    }

    pub fn both_required(&self) -> bool {
        self.direction == FilterDirection::Both
    }

    /// Splits a label query on the first `=`. An empty value means "key
    /// present with any value".
    pub fn label_key_value(&self) -> (&str, &str) {
        self.query
            .split_once('=')
            .unwrap_or((self.query.as_str(), ""))
    }

    /// The pod's namespace, when this clause was built from a selector.
    pub fn pod_namespace(&self) -> Option<&str> {
        self.meta.as_deref().filter(|meta| !meta.is_empty())
    }

    pub fn is_label(&self) -> bool {
        self.kind == FilterKind::Label
    }

    pub fn is_ip(&self) -> bool {
        self.kind == FilterKind::Ip
    }

    pub fn is_dns(&self) -> bool {
        self.kind == FilterKind::Dns
    }

    pub fn is_identity(&self) -> bool {
        self.kind == FilterKind::Identity
    }

    pub fn is_tcp_flag(&self) -> bool {
        self.kind == FilterKind::TcpFlag
    }

    pub fn is_pod(&self) -> bool {
        self.kind == FilterKind::Pod
    }
}

impl fmt::Display for FilterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("!")?;
        }
        write!(f, "{}:{}={}", self.direction, self.kind, self.query)
    }
}

// meta is auxiliary data and stays out of equality, hashing and the
// canonical string, so set-diffing treats entries differing only in meta as
// the same clause.
impl PartialEq for FilterEntry {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.direction == other.direction
            && self.query == other.query
            && self.negative == other.negative
    }
}

impl Eq for FilterEntry {}

impl Hash for FilterEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.direction.hash(state);
        self.query.hash(state);
        self.negative.hash(state);
    }
}

impl Serialize for FilterEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FilterEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FilterEntry::parse(&raw).ok_or_else(|| D::Error::custom("empty filter clause"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_round_trips_canonical_form() {
        let entry = FilterEntry::parse_full("!from:ip=10.0.0.1").expect("valid clause");
        assert_eq!(entry.kind(), FilterKind::Ip);
        assert_eq!(entry.direction(), FilterDirection::From);
        assert_eq!(entry.query(), "10.0.0.1");
        assert!(entry.is_negative());

        let reparsed = FilterEntry::parse_full(&entry.to_string()).expect("canonical reparses");
        assert_eq!(reparsed, entry);
    }

    #[test]
    fn test_parse_full_rejects_unknown_tokens() {
        assert_eq!(
            FilterEntry::parse_full("sideways:label=x"),
            Err(FilterParseError::UnknownDirection("sideways".to_string()))
        );
        assert_eq!(
            FilterEntry::parse_full("from:port=80"),
            Err(FilterParseError::UnknownKind("port".to_string()))
        );
        assert_eq!(
            FilterEntry::parse_full("just-text"),
            Err(FilterParseError::MalformedClause("just-text".to_string()))
        );
        assert_eq!(
            FilterEntry::parse_full("from:label="),
            Err(FilterParseError::EmptyQuery("label".to_string()))
        );
    }

    #[test]
    fn test_lenient_parse_fills_defaults() {
        let entry = FilterEntry::parse("world").expect("non-empty input parses");
        assert_eq!(entry.kind(), FilterKind::Label);
        assert_eq!(entry.direction(), FilterDirection::Both);
        assert_eq!(entry.query(), "world");

        let entry = FilterEntry::parse("from:world").expect("direction without kind");
        assert_eq!(entry.direction(), FilterDirection::From);
        assert_eq!(entry.kind(), FilterKind::Label);
        assert_eq!(entry.query(), "world");

        let entry = FilterEntry::parse("dns=api.cluster.local").expect("kind without direction");
        assert_eq!(entry.direction(), FilterDirection::Both);
        assert_eq!(entry.kind(), FilterKind::Dns);
        assert_eq!(entry.query(), "api.cluster.local");
    }

    #[test]
    fn test_lenient_parse_keeps_label_key_value_intact() {
        let entry = FilterEntry::parse("app=frontend").expect("key=value parses");
        assert_eq!(entry.kind(), FilterKind::Label);
        assert_eq!(entry.query(), "app=frontend");
        assert_eq!(entry.label_key_value(), ("app", "frontend"));
    }

    #[test]
    fn test_lenient_parse_only_rejects_blank_input() {
        assert!(FilterEntry::parse("").is_none());
        assert!(FilterEntry::parse("   ").is_none());
        assert!(FilterEntry::parse("1.2.3.4:8080").is_some());
    }

    #[test]
    fn test_parse_query_strips_remnants_once_and_is_idempotent() {
        let normalized = FilterEntry::parse_query(FilterKind::Ip, " from:ip=10.0.0.1 ");
        assert_eq!(normalized, "10.0.0.1");
        assert_eq!(
            FilterEntry::parse_query(FilterKind::Ip, &normalized),
            normalized,
            "re-normalizing an already normalized query must be a no-op"
        );
    }

    #[test]
    fn test_parse_query_only_strips_the_resolved_kind() {
        // a label query legitimately starting with another kind's token
        let normalized = FilterEntry::parse_query(FilterKind::Label, "dns-zone=internal");
        assert_eq!(normalized, "dns-zone=internal");
    }

    #[test]
    fn test_meta_is_excluded_from_equality_and_serialization() {
        let plain = FilterEntry::pod("coredns-abc12");
        let scoped = FilterEntry::pod_selector("coredns-abc12", "kube-system");

        assert_eq!(plain, scoped);
        assert_eq!(plain.to_string(), scoped.to_string());
        assert_eq!(scoped.pod_namespace(), Some("kube-system"));
        assert_eq!(plain.pod_namespace(), None);
    }

    #[test]
    fn test_with_style_mutators_return_modified_clones() {
        let entry = FilterEntry::label("app=core");
        let negated = entry.with_negated(true);

        assert!(!entry.is_negative(), "source entry is untouched");
        assert!(negated.is_negative());

        let requeried = entry.with_query("label=app=edge");
        assert_eq!(requeried.query(), "app=edge", "with_query re-normalizes");
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let entry = FilterEntry::parse_full("!to:dns=api.local").expect("valid clause");
        let json = serde_json::to_string(&entry).expect("serializes");
        assert_eq!(json, "\"!to:dns=api.local\"");

        let back: FilterEntry = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, entry);
    }

    #[test]
    fn test_direction_requirements() {
        let from = FilterEntry::label("x").with_direction(FilterDirection::From);
        assert!(from.from_required() && !from.to_required());

        let to = FilterEntry::label("x").with_direction(FilterDirection::To);
        assert!(!to.from_required() && to.to_required());

        let both = FilterEntry::label("x");
        assert!(both.from_required() && both.to_required() && both.both_required());
    }
}
