use super::entries_pass;
use super::service::service_card_matches;
use crate::filter::{FilterEntry, Filters};
use crate::frame::{Link, ServiceCard, ServiceMap};

/// Decides whether one link is visible under the given filters. Endpoints
/// are resolved to their service cards so clauses test real labels, names
/// and identities instead of opaque id strings.
pub fn filter_link(link: &Link, filters: &Filters, services: &ServiceMap) -> bool {
    if let Some(verdict) = filters.verdict {
        if !link.verdicts.contains(&verdict) {
            return false;
        }
    }

    if filters.skip_kube_dns && is_kube_dns_request(link, services) {
        return false;
    }

    entries_pass(filters, |entry| link_matches_entry(link, entry, services))
}

fn is_kube_dns_request(link: &Link, services: &ServiceMap) -> bool {
    link.destination_port == Some(53)
        && services
            .get(&link.destination_id)
            .is_some_and(ServiceCard::is_kube_dns)
}

/// Evaluates one clause against a link, per side. A negated clause makes the
/// link visible as soon as the positive condition is absent.
pub fn link_matches_entry(link: &Link, entry: &FilterEntry, services: &ServiceMap) -> bool {
    let from = entry.from_required() && side_matches(&link.source_id, entry, services);
    let to = entry.to_required() && side_matches(&link.destination_id, entry, services);

    (from || to) != entry.is_negative()
}

fn side_matches(card_id: &str, entry: &FilterEntry, services: &ServiceMap) -> bool {
    match services.get(card_id) {
        Some(card) => service_card_matches(card, entry),
        // an endpoint with no card only answers identity queries by raw id
        None => entry.is_identity() && entry.query() == card_id,
    }
}
