use super::entries_pass;
use crate::filter::{FilterEntry, FilterKind, Filters};
use crate::frame::ServiceCard;

/// Decides whether one service card is visible under the given filters.
pub fn filter_service(card: &ServiceCard, filters: &Filters) -> bool {
    if filters.skip_host && card.is_host() {
        return false;
    }
    if filters.skip_kube_dns && card.is_kube_dns() {
        return false;
    }
    if filters.skip_remote_node && card.is_remote_node() {
        return false;
    }
    if filters.skip_prometheus_app && card.is_prometheus_app() {
        return false;
    }
    // skip_kube_api_server is carried in the data model but intentionally not
    // consulted here; this is the wiring point once its semantics settle.

    entries_pass(filters, |entry| service_matches_entry(card, entry))
}

/// Cards are undirected, so clause direction is ignored here.
pub fn service_matches_entry(card: &ServiceCard, entry: &FilterEntry) -> bool {
    service_card_matches(card, entry) != entry.is_negative()
}

pub(crate) fn service_card_matches(card: &ServiceCard, entry: &FilterEntry) -> bool {
    match entry.kind() {
        FilterKind::Label => {
            let (key, value) = entry.label_key_value();
            card.has_label(key, value)
        }
        FilterKind::Dns => {
            card.name == entry.query() || card.dns_names.iter().any(|name| name == entry.query())
        }
        FilterKind::Identity => match entry.query().parse::<u64>() {
            Ok(id) => {
                card.identity == id
                    || card.access_points.iter().any(|ap| u64::from(ap.port) == id)
            }
            Err(_) => false,
        },
        // cards are not addressable by ip, pod or tcp flag; those clauses
        // constrain flows and must not blank the service map
        FilterKind::Ip | FilterKind::Pod | FilterKind::TcpFlag => true,
    }
}
