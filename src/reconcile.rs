//! Frame reconciliation: merging a freshly fetched batch into the displayed
//! view under the current filters.
//!
//! Visibility cascades top-down from flows. A link needs a surviving flow in
//! its own direction, a service card needs a surviving link touching it.
//! Nothing stores a derived "visible" flag; every invocation recomputes the
//! result from its inputs alone.

use crate::filter::Filters;
use crate::filtering::{filter_flow, filter_link, filter_service};
use crate::frame::{Flow, Frame, Link, ServiceMap};
use std::collections::BTreeMap;

/// Merges `rhs` into `lhs` (rhs superseding by id) and keeps what the
/// filters allow. The output is sorted by id and stable under
/// re-application.
pub fn reconcile(lhs: &Frame, rhs: &Frame, filters: &Filters) -> Frame {
    let mut flows: BTreeMap<String, Flow> = BTreeMap::new();
    for flow in lhs.flows.iter().chain(&rhs.flows) {
        flows.insert(flow.id.clone(), flow.clone());
    }

    let mut links: BTreeMap<String, Link> = BTreeMap::new();
    for link in lhs.links.iter().chain(&rhs.links) {
        links.insert(link.key(), link.clone());
    }

    let mut services: ServiceMap = ServiceMap::new();
    for card in lhs.services.iter().chain(&rhs.services) {
        services.insert(card.id.clone(), card.clone());
    }

    flows.retain(|_, flow| filter_flow(flow, filters));

    links.retain(|_, link| {
        filter_link(link, filters, &services) && has_surviving_flow(link, &flows)
    });

    let links: Vec<Link> = links.into_values().collect();

    let services: Vec<_> = services
        .into_values()
        .filter(|card| {
            filter_service(card, filters) && links.iter().any(|link| link.connects(&card.id))
        })
        .collect();

    Frame {
        flows: flows.into_values().collect(),
        links,
        services,
    }
}

/// A link is justified only by flows running in its own direction.
fn has_surviving_flow(link: &Link, flows: &BTreeMap<String, Flow>) -> bool {
    flows.values().any(|flow| {
        flow.source.service_id() == link.source_id
            && flow.destination.service_id() == link.destination_id
    })
}

impl Frame {
    /// Local re-filter: reconciliation from an empty view.
    pub fn filtered(&self, filters: &Filters) -> Frame {
        reconcile(&Frame::default(), self, filters)
    }

    /// One reconciliation step with `self` as the displayed view.
    pub fn apply(&self, rhs: &Frame, filters: &Filters) -> Frame {
        reconcile(self, rhs, filters)
    }
}
