use super::diff::FiltersDiff;
use super::entry::FilterEntry;
use crate::frame::{UnknownToken, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// How the clause list combines: any clause passing, or every clause.
///
/// The original system shipped both behaviors in two modules of the same
/// name; the mode makes that choice explicit. `Any` is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Any,
    All,
}

impl FromStr for MatchMode {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" => Ok(MatchMode::Any),
            "all" => Ok(MatchMode::All),
            _ => Err(UnknownToken {
                what: "match mode",
                token: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchMode::Any => "any",
            MatchMode::All => "all",
        })
    }
}

/// The full filter state applied to a frame: scalar criteria, skip flags and
/// the ordered clause list. Clause order only matters for display; equality
/// and diffing treat the list as a set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub namespace: Option<String>,
    pub verdict: Option<Verdict>,
    /// Exact ("404") or bounded ("4+", "5-") HTTP status match.
    pub http_status: Option<String>,
    pub entries: Vec<FilterEntry>,
    pub skip_host: bool,
    pub skip_kube_dns: bool,
    pub skip_remote_node: bool,
    pub skip_prometheus_app: bool,
    /// Carried and diffed, but consulted by no predicate yet. The service
    /// predicate holds the wiring point.
    pub skip_kube_api_server: bool,
    pub mode: MatchMode,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: Option<impl Into<String>>) -> Self {
        self.namespace = namespace.map(Into::into);
        self
    }

    pub fn with_verdict(mut self, verdict: Option<Verdict>) -> Self {
        self.verdict = verdict;
        self
    }

    pub fn with_http_status(mut self, status: Option<impl Into<String>>) -> Self {
        self.http_status = status.map(Into::into);
        self
    }

    pub fn with_entries(mut self, entries: Vec<FilterEntry>) -> Self {
        self.entries = entries;
        self
    }

    pub fn with_entry(mut self, entry: FilterEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn skip_host(mut self, value: bool) -> Self {
        self.skip_host = value;
        self
    }

    pub fn skip_kube_dns(mut self, value: bool) -> Self {
        self.skip_kube_dns = value;
        self
    }

    pub fn skip_remote_node(mut self, value: bool) -> Self {
        self.skip_remote_node = value;
        self
    }

    pub fn skip_prometheus_app(mut self, value: bool) -> Self {
        self.skip_prometheus_app = value;
        self
    }

    pub fn skip_kube_api_server(mut self, value: bool) -> Self {
        self.skip_kube_api_server = value;
        self
    }

    /// Change record against an older snapshot. With `None` the result reads
    /// as "what would be lost if filters were cleared": every present value
    /// appears on the deleted side.
    pub fn diff(&self, older: Option<&Filters>) -> FiltersDiff {
        match older {
            Some(older) => FiltersDiff::between(older, self),
            None => FiltersDiff::between(&Filters::default(), self).invert(),
        }
    }

    pub(crate) fn canonical_entry_set(&self) -> BTreeSet<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}

impl PartialEq for Filters {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace
            && self.verdict == other.verdict
            && self.http_status == other.http_status
            && self.skip_host == other.skip_host
            && self.skip_kube_dns == other.skip_kube_dns
            && self.skip_remote_node == other.skip_remote_node
            && self.skip_prometheus_app == other.skip_prometheus_app
            && self.skip_kube_api_server == other.skip_kube_api_server
            && self.mode == other.mode
            && self.canonical_entry_set() == other.canonical_entry_set()
    }
}

impl Eq for Filters {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_entry_order() {
        let a = Filters::new()
            .with_entry(FilterEntry::label("app=core"))
            .with_entry(FilterEntry::ip("10.0.0.1"));
        let b = Filters::new()
            .with_entry(FilterEntry::ip("10.0.0.1"))
            .with_entry(FilterEntry::label("app=core"));

        assert_eq!(a, b, "entry order must not affect equality");
    }

    #[test]
    fn test_equality_compares_scalars() {
        let a = Filters::new().with_namespace(Some("ns1"));
        let b = Filters::new().with_namespace(Some("ns2"));

        assert_ne!(a, b);
        assert_ne!(a, Filters::default());
    }

    #[test]
    fn test_builder_sets_flags() {
        let filters = Filters::new()
            .skip_host(true)
            .skip_kube_dns(true)
            .with_mode(MatchMode::All);

        assert!(filters.skip_host);
        assert!(filters.skip_kube_dns);
        assert!(!filters.skip_remote_node);
        assert_eq!(filters.mode, MatchMode::All);
    }
}
