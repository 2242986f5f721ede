//! Predicate evaluation of [`Filters`] against flows, links and services.
//!
//! Each predicate answers "is this entity visible under these filters" and
//! performs no I/O. The frame reconciler layers the cascading keep/drop
//! rules on top of these.

mod flow;
mod link;
mod service;

pub use flow::{filter_flow, flow_matches_entry};
pub use link::{filter_link, link_matches_entry};
pub use service::{filter_service, service_matches_entry};

use crate::filter::{FilterEntry, Filters, MatchMode};

/// An empty clause list constrains nothing.
pub(crate) fn entries_pass(filters: &Filters, matches: impl Fn(&FilterEntry) -> bool) -> bool {
    if filters.entries.is_empty() {
        return true;
    }
    match filters.mode {
        MatchMode::Any => filters.entries.iter().any(|entry| matches(entry)),
        MatchMode::All => filters.entries.iter().all(|entry| matches(entry)),
    }
}
