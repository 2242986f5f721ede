use super::entry::FilterEntry;
use super::filters::{Filters, MatchMode};
use crate::frame::Verdict;
use serde::Serialize;
use std::collections::BTreeSet;

/// Added and deleted values for one filter field. For scalar fields each side
/// holds at most one element; an absent value is the empty side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change<T> {
    pub added: Vec<T>,
    pub deleted: Vec<T>,
}

impl<T> Default for Change<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

impl<T> Change<T> {
    /// Derived rather than stored so it can never drift from the data.
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.deleted.is_empty()
    }

    pub fn invert(self) -> Self {
        Self {
            added: self.deleted,
            deleted: self.added,
        }
    }
}

impl<T: Clone + PartialEq> Change<T> {
    fn scalar(old: Option<&T>, new: Option<&T>) -> Self {
        if old == new {
            return Self::default();
        }
        Self {
            added: new.cloned().into_iter().collect(),
            deleted: old.cloned().into_iter().collect(),
        }
    }
}

fn entry_set_diff(old: &[FilterEntry], new: &[FilterEntry]) -> Change<FilterEntry> {
    let old_keys: BTreeSet<String> = old.iter().map(ToString::to_string).collect();
    let new_keys: BTreeSet<String> = new.iter().map(ToString::to_string).collect();

    let mut added = Vec::new();
    let mut seen = BTreeSet::new();
    for entry in new {
        let key = entry.to_string();
        if !old_keys.contains(&key) && seen.insert(key) {
            added.push(entry.clone());
        }
    }

    let mut deleted = Vec::new();
    let mut seen = BTreeSet::new();
    for entry in old {
        let key = entry.to_string();
        if !new_keys.contains(&key) && seen.insert(key) {
            deleted.push(entry.clone());
        }
    }

    Change { added, deleted }
}

/// Field-by-field change record between two filter snapshots. Consumers use
/// it to decide between a backend refetch and a local re-filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FiltersDiff {
    pub namespace: Change<String>,
    pub verdict: Change<Verdict>,
    pub http_status: Change<String>,
    pub entries: Change<FilterEntry>,
    pub skip_host: Change<bool>,
    pub skip_kube_dns: Change<bool>,
    pub skip_remote_node: Change<bool>,
    pub skip_prometheus_app: Change<bool>,
    pub skip_kube_api_server: Change<bool>,
    pub mode: Change<MatchMode>,
}

impl FiltersDiff {
    pub fn between(old: &Filters, new: &Filters) -> Self {
        Self {
            namespace: Change::scalar(old.namespace.as_ref(), new.namespace.as_ref()),
            verdict: Change::scalar(old.verdict.as_ref(), new.verdict.as_ref()),
            http_status: Change::scalar(old.http_status.as_ref(), new.http_status.as_ref()),
            entries: entry_set_diff(&old.entries, &new.entries),
            skip_host: Change::scalar(Some(&old.skip_host), Some(&new.skip_host)),
            skip_kube_dns: Change::scalar(Some(&old.skip_kube_dns), Some(&new.skip_kube_dns)),
            skip_remote_node: Change::scalar(
                Some(&old.skip_remote_node),
                Some(&new.skip_remote_node),
            ),
            skip_prometheus_app: Change::scalar(
                Some(&old.skip_prometheus_app),
                Some(&new.skip_prometheus_app),
            ),
            skip_kube_api_server: Change::scalar(
                Some(&old.skip_kube_api_server),
                Some(&new.skip_kube_api_server),
            ),
            mode: Change::scalar(Some(&old.mode), Some(&new.mode)),
        }
    }

    /// Everything in `new`, seen as freshly added.
    pub fn from_empty(new: &Filters) -> Self {
        Self::between(&Filters::default(), new)
    }

    /// Flips the sense of the diff without recomputing it.
    pub fn invert(self) -> Self {
        Self {
            namespace: self.namespace.invert(),
            verdict: self.verdict.invert(),
            http_status: self.http_status.invert(),
            entries: self.entries.invert(),
            skip_host: self.skip_host.invert(),
            skip_kube_dns: self.skip_kube_dns.invert(),
            skip_remote_node: self.skip_remote_node.invert(),
            skip_prometheus_app: self.skip_prometheus_app.invert(),
            skip_kube_api_server: self.skip_kube_api_server.invert(),
            mode: self.mode.invert(),
        }
    }

    pub fn changed(&self) -> bool {
        self.namespace.changed()
            || self.verdict.changed()
            || self.http_status.changed()
            || self.entries.changed()
            || self.skip_host.changed()
            || self.skip_kube_dns.changed()
            || self.skip_remote_node.changed()
            || self.skip_prometheus_app.changed()
            || self.skip_kube_api_server.changed()
            || self.mode.changed()
    }

    /// True when a field that shapes the backend query changed. Skip flags,
    /// the HTTP status filter and the combinator mode are all evaluable
    /// against data already on hand.
    pub fn requires_refetch(&self) -> bool {
        self.namespace.changed() || self.verdict.changed() || self.entries.changed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_change_records_old_and_new() {
        let old = Filters::new();
        let new = Filters::new().with_namespace(Some("ns1"));

        let diff = FiltersDiff::between(&old, &new);
        assert_eq!(diff.namespace.added, vec!["ns1".to_string()]);
        assert!(diff.namespace.deleted.is_empty(), "absence is the empty side");
        assert!(diff.changed());
    }

    #[test]
    fn test_identical_filters_produce_no_change() {
        let filters = Filters::new()
            .with_namespace(Some("ns1"))
            .with_entry(FilterEntry::label("app=core"));

        let diff = FiltersDiff::between(&filters, &filters.clone());
        assert!(!diff.changed());
        assert!(!diff.requires_refetch());
    }

    #[test]
    fn test_entry_diff_deduplicates_by_canonical_string() {
        let old = Filters::new();
        let new = Filters::new()
            .with_entry(FilterEntry::label("app=core"))
            .with_entry(FilterEntry::label("app=core"));

        let diff = FiltersDiff::between(&old, &new);
        assert_eq!(diff.entries.added.len(), 1);
    }
}
