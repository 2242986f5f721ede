use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Synthetic label the backend attaches to host endpoints.
pub const HOST_LABEL: &str = "reserved:host";
/// Synthetic label for endpoints on other cluster nodes.
pub const REMOTE_NODE_LABEL: &str = "reserved:remote-node";
/// Synthetic label for endpoints outside the cluster.
pub const WORLD_LABEL: &str = "reserved:world";
/// Synthetic label for the kube-apiserver endpoint.
pub const KUBE_API_SERVER_LABEL: &str = "reserved:kube-apiserver";
/// Label pair identifying the cluster DNS service.
pub const KUBE_DNS_LABEL: (&str, &str) = ("k8s-app", "kube-dns");
/// Label pair identifying a Prometheus scrape target.
pub const PROMETHEUS_APP_LABEL: (&str, &str) = ("app", "prometheus");

#[derive(Debug, Error)]
#[error("unknown {what} '{token}'")]
pub struct UnknownToken {
    pub what: &'static str,
    pub token: String,
}

/// One key/value label on a flow endpoint or service card. Keys may carry a
/// source qualifier (`k8s:`, `any:`, `reserved:`) that comparison ignores,
/// so `label=world` matches an endpoint labeled `reserved:world`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl Label {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Builds a label from `key` or `key=value` text.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('=') {
            Some((key, value)) => Self::new(key, value),
            None => Self::new(raw, ""),
        }
    }
}

fn normalized_key(key: &str) -> &str {
    key.strip_prefix("k8s:")
        .or_else(|| key.strip_prefix("any:"))
        .or_else(|| key.strip_prefix("reserved:"))
        .unwrap_or(key)
}

/// An empty `value` on the probe side matches any stored value.
pub(crate) fn labels_match(labels: &[Label], key: &str, value: &str) -> bool {
    let key = normalized_key(key);
    labels
        .iter()
        .any(|label| normalized_key(&label.key) == key && (value.is_empty() || label.value == value))
}

/// Terminal classification of a flow or link.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Forwarded,
    Dropped,
    Audit,
    Error,
    #[default]
    Unknown,
}

impl Verdict {
    pub fn token(&self) -> &'static str {
        match self {
            Verdict::Forwarded => "forwarded",
            Verdict::Dropped => "dropped",
            Verdict::Audit => "audit",
            Verdict::Error => "error",
            Verdict::Unknown => "unknown",
        }
    }
}

impl FromStr for Verdict {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forwarded" => Ok(Verdict::Forwarded),
            "dropped" => Ok(Verdict::Dropped),
            "audit" => Ok(Verdict::Audit),
            "error" => Ok(Verdict::Error),
            "unknown" => Ok(Verdict::Unknown),
            _ => Err(UnknownToken {
                what: "verdict",
                token: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    #[default]
    Unknown,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
            Protocol::Unknown => "unknown",
        };
        f.write_str(token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TcpFlag {
    Syn,
    Ack,
    Fin,
    Rst,
    Psh,
    Urg,
}

impl FromStr for TcpFlag {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "syn" => Ok(TcpFlag::Syn),
            "ack" => Ok(TcpFlag::Ack),
            "fin" => Ok(TcpFlag::Fin),
            "rst" => Ok(TcpFlag::Rst),
            "psh" => Ok(TcpFlag::Psh),
            "urg" => Ok(TcpFlag::Urg),
            _ => Err(UnknownToken {
                what: "tcp flag",
                token: s.to_string(),
            }),
        }
    }
}

/// One side of a flow. All fields come from the backend as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowEndpoint {
    pub identity: u64,
    pub namespace: Option<String>,
    pub labels: Vec<Label>,
    pub pod_name: Option<String>,
    pub ip: Option<String>,
    pub port: Option<u16>,
    pub dns_names: Vec<String>,
}

impl FlowEndpoint {
    pub fn has_label(&self, key: &str, value: &str) -> bool {
        labels_match(&self.labels, key, value)
    }

    pub fn is_host(&self) -> bool {
        self.has_label(HOST_LABEL, "")
    }

    pub fn is_remote_node(&self) -> bool {
        self.has_label(REMOTE_NODE_LABEL, "")
    }

    pub fn is_kube_dns(&self) -> bool {
        self.has_label(KUBE_DNS_LABEL.0, KUBE_DNS_LABEL.1)
    }

    /// Id of the service card this endpoint belongs to. The backend derives
    /// card ids from security identities; the reconciler only compares ids.
    pub fn service_id(&self) -> String {
        self.identity.to_string()
    }
}

/// One observed network event between two endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flow {
    pub id: String,
    pub time: Option<DateTime<Utc>>,
    pub source: FlowEndpoint,
    pub destination: FlowEndpoint,
    pub protocol: Protocol,
    pub verdict: Verdict,
    pub http_status: Option<u16>,
    pub tcp_flags: Vec<TcpFlag>,
}

/// An aggregated edge between two service cards, summarizing the flows seen
/// in its direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub source_id: String,
    pub destination_id: String,
    pub destination_port: Option<u16>,
    pub verdicts: BTreeSet<Verdict>,
}

impl Link {
    /// Stable identifier for merging; links are keyed by their directed edge.
    pub fn key(&self) -> String {
        format!("{}->{}", self.source_id, self.destination_id)
    }

    pub fn connects(&self, service_id: &str) -> bool {
        self.source_id == service_id || self.destination_id == service_id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessPoint {
    pub port: u16,
    pub protocol: Protocol,
}

/// One logical service on the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceCard {
    pub id: String,
    pub name: String,
    pub namespace: Option<String>,
    pub identity: u64,
    pub labels: Vec<Label>,
    pub dns_names: Vec<String>,
    pub access_points: Vec<AccessPoint>,
}

impl ServiceCard {
    pub fn has_label(&self, key: &str, value: &str) -> bool {
        labels_match(&self.labels, key, value)
    }

    pub fn is_host(&self) -> bool {
        self.has_label(HOST_LABEL, "")
    }

    pub fn is_remote_node(&self) -> bool {
        self.has_label(REMOTE_NODE_LABEL, "")
    }

    pub fn is_world(&self) -> bool {
        self.has_label(WORLD_LABEL, "")
    }

    pub fn is_kube_dns(&self) -> bool {
        self.has_label(KUBE_DNS_LABEL.0, KUBE_DNS_LABEL.1)
    }

    pub fn is_prometheus_app(&self) -> bool {
        self.has_label(PROMETHEUS_APP_LABEL.0, PROMETHEUS_APP_LABEL.1)
    }

    pub fn is_kube_api_server(&self) -> bool {
        self.has_label(KUBE_API_SERVER_LABEL, "")
    }
}
