use crate::filter::{Change, Filters, FiltersDiff};
use crate::frame::{Flow, FlowEndpoint, Frame};
use colored::Colorize;
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::fmt::Write as _;

fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h)).collect::<Vec<_>>());
    table
}

fn endpoint_caption(endpoint: &FlowEndpoint) -> String {
    let name = endpoint
        .pod_name
        .as_deref()
        .or(endpoint.ip.as_deref())
        .unwrap_or("?");
    match endpoint.namespace.as_deref() {
        Some(namespace) => format!("{namespace}/{name}"),
        None => name.to_string(),
    }
}

fn flow_row(flow: &Flow) -> Vec<String> {
    vec![
        endpoint_caption(&flow.source),
        endpoint_caption(&flow.destination),
        flow.protocol.to_string(),
        flow.destination
            .port
            .map(|port| port.to_string())
            .unwrap_or_default(),
        flow.verdict.to_string(),
        flow.http_status
            .map(|status| status.to_string())
            .unwrap_or_default(),
    ]
}

/// Renders the visible frame as flow, link and service tables.
pub fn format_frame_text(frame: &Frame) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Visible: {} flows, {} links, {} services",
        frame.flows.len(),
        frame.links.len(),
        frame.services.len()
    );

    if !frame.flows.is_empty() {
        let mut table = styled_table(&["Source", "Destination", "Proto", "Port", "Verdict", "HTTP"]);
        for flow in &frame.flows {
            table.add_row(flow_row(flow));
        }
        let _ = writeln!(out, "\nFlows:\n{table}");
    }

    if !frame.links.is_empty() {
        let mut table = styled_table(&["From", "To", "Port", "Verdicts"]);
        for link in &frame.links {
            let verdicts = link
                .verdicts
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            table.add_row(vec![
                link.source_id.clone(),
                link.destination_id.clone(),
                link.destination_port
                    .map(|port| port.to_string())
                    .unwrap_or_default(),
                verdicts,
            ]);
        }
        let _ = writeln!(out, "\nLinks:\n{table}");
    }

    if !frame.services.is_empty() {
        let mut table = styled_table(&["Id", "Name", "Namespace", "Identity"]);
        for card in &frame.services {
            table.add_row(vec![
                card.id.clone(),
                card.name.clone(),
                card.namespace.clone().unwrap_or_default(),
                card.identity.to_string(),
            ]);
        }
        let _ = writeln!(out, "\nServices:\n{table}");
    }

    out
}

pub fn format_frame_json(frame: &Frame) -> serde_json::Result<String> {
    serde_json::to_string_pretty(frame)
}

fn push_change<T: Display>(out: &mut String, name: &str, change: &Change<T>) {
    for value in &change.deleted {
        let _ = writeln!(out, "{}", format!("- {name}: {value}").red());
    }
    for value in &change.added {
        let _ = writeln!(out, "{}", format!("+ {name}: {value}").green());
    }
}

/// Renders a diff as colored added/deleted lines, one per value.
pub fn format_diff_text(diff: &FiltersDiff) -> String {
    if !diff.changed() {
        return "No changes.\n".to_string();
    }

    let mut out = String::new();
    push_change(&mut out, "namespace", &diff.namespace);
    push_change(&mut out, "verdict", &diff.verdict);
    push_change(&mut out, "http-status", &diff.http_status);
    push_change(&mut out, "filter", &diff.entries);
    push_change(&mut out, "skip-host", &diff.skip_host);
    push_change(&mut out, "skip-kube-dns", &diff.skip_kube_dns);
    push_change(&mut out, "skip-remote-node", &diff.skip_remote_node);
    push_change(&mut out, "skip-prometheus-app", &diff.skip_prometheus_app);
    push_change(&mut out, "skip-kube-api-server", &diff.skip_kube_api_server);
    push_change(&mut out, "mode", &diff.mode);

    let action = if diff.requires_refetch() {
        "backend refetch required"
    } else {
        "local re-filter is enough"
    };
    let _ = writeln!(out, "\n{}", action.bold());

    out
}

pub fn format_diff_json(diff: &FiltersDiff) -> serde_json::Result<String> {
    serde_json::to_string_pretty(diff)
}

/// Multi-line canonical listing of a filter configuration, the unit the
/// verbose text diff operates on.
pub fn format_filters_canonical(filters: &Filters) -> String {
    let mut out = String::new();
    if let Some(namespace) = &filters.namespace {
        let _ = writeln!(out, "namespace: {namespace}");
    }
    if let Some(verdict) = filters.verdict {
        let _ = writeln!(out, "verdict: {verdict}");
    }
    if let Some(status) = &filters.http_status {
        let _ = writeln!(out, "http-status: {status}");
    }
    for flag in [
        ("skip-host", filters.skip_host),
        ("skip-kube-dns", filters.skip_kube_dns),
        ("skip-remote-node", filters.skip_remote_node),
        ("skip-prometheus-app", filters.skip_prometheus_app),
        ("skip-kube-api-server", filters.skip_kube_api_server),
    ] {
        if flag.1 {
            let _ = writeln!(out, "{}: true", flag.0);
        }
    }
    let _ = writeln!(out, "mode: {}", filters.mode);
    for clause in filters.canonical_entry_set() {
        let _ = writeln!(out, "filter: {clause}");
    }
    out
}

/// Computes a colored line diff between the canonical forms of two filter
/// configurations.
pub fn format_filters_text_diff(before: &Filters, after: &Filters) -> String {
    let before = format_filters_canonical(before);
    let after = format_filters_canonical(after);
    let diff = TextDiff::from_lines(&before, &after);
    let mut result = String::new();

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Delete => result.push_str(&format!("{}", change.to_string().red())),
            ChangeTag::Insert => result.push_str(&format!("{}", change.to_string().green())),
            ChangeTag::Equal => continue,
        }
    }

    result
}

/// Inventory summary of a raw frame.
pub fn format_info_text(frame: &Frame) -> String {
    let mut out = String::new();

    let namespaces: BTreeSet<&str> = frame
        .flows
        .iter()
        .flat_map(|flow| [&flow.source, &flow.destination])
        .filter_map(|endpoint| endpoint.namespace.as_deref())
        .collect();
    let verdicts: BTreeSet<String> = frame
        .flows
        .iter()
        .map(|flow| flow.verdict.to_string())
        .collect();
    let protocols: BTreeSet<String> = frame
        .flows
        .iter()
        .map(|flow| flow.protocol.to_string())
        .collect();

    let _ = writeln!(out, "Namespaces:");
    for namespace in &namespaces {
        let _ = writeln!(out, "  - {namespace}");
    }

    let _ = writeln!(out, "\nVerdicts:");
    for verdict in &verdicts {
        let _ = writeln!(out, "  - {verdict}");
    }

    let _ = writeln!(out, "\nProtocols:");
    for protocol in &protocols {
        let _ = writeln!(out, "  - {protocol}");
    }

    let _ = writeln!(out, "\nServices:");
    for card in &frame.services {
        let _ = writeln!(
            out,
            "  - {} ({})",
            card.name,
            card.namespace.as_deref().unwrap_or("global")
        );
    }

    let _ = writeln!(
        out,
        "\nTotals: {} flows, {} links, {} services",
        frame.flows.len(),
        frame.links.len(),
        frame.services.len()
    );

    out
}
