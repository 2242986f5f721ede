use super::entries_pass;
use crate::filter::{FilterEntry, FilterKind, Filters};
use crate::frame::{Flow, FlowEndpoint, TcpFlag};
use regex::Regex;
use std::sync::LazyLock;

static HTTP_STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,5})\s*([+-])?$").expect("valid http status regex"));

/// Decides whether one flow is visible under the given filters.
pub fn filter_flow(flow: &Flow, filters: &Filters) -> bool {
    if let Some(namespace) = filters.namespace.as_deref() {
        let source = flow.source.namespace.as_deref() == Some(namespace);
        let destination = flow.destination.namespace.as_deref() == Some(namespace);
        if !source && !destination {
            return false;
        }
    }

    if let Some(verdict) = filters.verdict {
        if flow.verdict != verdict {
            return false;
        }
    }

    if filters.skip_host && (flow.source.is_host() || flow.destination.is_host()) {
        return false;
    }

    if filters.skip_remote_node
        && (flow.source.is_remote_node() || flow.destination.is_remote_node())
    {
        return false;
    }

    if filters.skip_kube_dns && is_kube_dns_traffic(flow) {
        return false;
    }

    if let Some(status_filter) = filters.http_status.as_deref() {
        if !http_status_matches(status_filter, flow.http_status) {
            return false;
        }
    }

    entries_pass(filters, |entry| flow_matches_entry(flow, entry))
}

fn is_kube_dns_traffic(flow: &Flow) -> bool {
    flow.source.port == Some(53)
        || (flow.destination.port == Some(53) && flow.destination.is_kube_dns())
}

/// `4+` reads as "400 and above", `5-` as "below 500": a prefix shorter than
/// three digits names a status class and is scaled to its boundary. Without
/// a bound suffix the number must match exactly. A flow without a status, or
/// a non-numeric filter, never matches.
fn http_status_matches(filter: &str, status: Option<u16>) -> bool {
    let Some(status) = status else {
        return false;
    };
    let Some(caps) = HTTP_STATUS_RE.captures(filter.trim()) else {
        return false;
    };
    let Ok(number) = caps[1].parse::<u32>() else {
        return false;
    };

    let status = u32::from(status);
    match caps.get(2).map(|m| m.as_str()) {
        Some("+") => status >= scale_to_status_class(number),
        Some("-") => status < scale_to_status_class(number),
        _ => status == number,
    }
}

fn scale_to_status_class(mut number: u32) -> u32 {
    if number == 0 {
        return 0;
    }
    while number < 100 {
        number *= 10;
    }
    number
}

/// Evaluates one clause against a flow. Directions are strict: `from` tests
/// the source endpoint, `to` the destination, `both` passes on either side.
/// TCP flags are a property of the flow itself and ignore direction.
pub fn flow_matches_entry(flow: &Flow, entry: &FilterEntry) -> bool {
    let matched = if entry.is_tcp_flag() {
        match entry.query().parse::<TcpFlag>() {
            Ok(flag) => flow.tcp_flags.contains(&flag),
            Err(_) => false,
        }
    } else {
        let from = entry.from_required() && endpoint_matches_entry(&flow.source, entry);
        let to = entry.to_required() && endpoint_matches_entry(&flow.destination, entry);
        from || to
    };

    matched != entry.is_negative()
}

fn endpoint_matches_entry(endpoint: &FlowEndpoint, entry: &FilterEntry) -> bool {
    match entry.kind() {
        FilterKind::Label => {
            let (key, value) = entry.label_key_value();
            endpoint.has_label(key, value)
        }
        FilterKind::Ip => endpoint.ip.as_deref() == Some(entry.query()),
        FilterKind::Dns => endpoint.dns_names.iter().any(|name| name == entry.query()),
        // a query that is not a number can never equal a numeric identity
        FilterKind::Identity => entry
            .query()
            .parse::<u64>()
            .map(|identity| endpoint.identity == identity)
            .unwrap_or(false),
        FilterKind::Pod => endpoint.pod_name.as_deref() == Some(entry.query()),
        FilterKind::TcpFlag => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_bounds() {
        assert!(http_status_matches("4+", Some(404)));
        assert!(http_status_matches("4+", Some(500)));
        assert!(!http_status_matches("4+", Some(200)));

        assert!(http_status_matches("5-", Some(404)));
        assert!(!http_status_matches("5-", Some(500)));

        assert!(http_status_matches("404", Some(404)));
        assert!(!http_status_matches("404", Some(403)));
    }

    #[test]
    fn test_http_status_missing_or_malformed_never_matches() {
        assert!(!http_status_matches("4+", None));
        assert!(!http_status_matches("abc", Some(200)));
        assert!(!http_status_matches("", Some(200)));
    }

    #[test]
    fn test_status_class_scaling() {
        assert_eq!(scale_to_status_class(4), 400);
        assert_eq!(scale_to_status_class(40), 400);
        assert_eq!(scale_to_status_class(400), 400);
        assert_eq!(scale_to_status_class(0), 0);
    }
}
