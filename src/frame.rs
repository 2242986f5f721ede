//! Frame snapshots and their on-disk formats.
//!
//! A frame is one batch of flows, links and service cards fetched from the
//! observability backend. Files are parsed as strict JSON first and fall back
//! to JSON5 so hand-edited snapshots with comments or trailing commas still
//! load. Streams are either a JSON array of frames or NDJSON with one frame
//! per line.

mod entities;

pub use entities::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Service cards keyed by id, the lookup shape the link predicate needs.
pub type ServiceMap = BTreeMap<String, ServiceCard>;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Failed to read frame file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse frame file '{path}' at line {line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },
}

/// One snapshot of backend state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    pub flows: Vec<Flow>,
    pub links: Vec<Link>,
    pub services: Vec<ServiceCard>,
}

impl Frame {
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty() && self.links.is_empty() && self.services.is_empty()
    }

    pub fn service_map(&self) -> ServiceMap {
        self.services
            .iter()
            .map(|card| (card.id.clone(), card.clone()))
            .collect()
    }
}

fn parse_frame_str(raw: &str) -> Result<Frame, String> {
    match serde_json::from_str::<Frame>(raw) {
        Ok(frame) => Ok(frame),
        // hand-written snapshots tend to be JSON5-ish
        Err(strict_err) => json5::from_str::<Frame>(raw).map_err(|_| strict_err.to_string()),
    }
}

pub fn load_frame(path: &Path) -> Result<Frame, FrameError> {
    let raw = fs::read_to_string(path).map_err(|source| FrameError::Read {
        path: path.display().to_string(),
        source,
    })?;

    parse_frame_str(&raw).map_err(|message| FrameError::Parse {
        path: path.display().to_string(),
        line: 1,
        message,
    })
}

/// Loads a sequence of frames: a JSON array, or NDJSON with one frame per
/// non-empty line.
pub fn load_frame_stream(path: &Path) -> Result<Vec<Frame>, FrameError> {
    let raw = fs::read_to_string(path).map_err(|source| FrameError::Read {
        path: path.display().to_string(),
        source,
    })?;

    if raw.trim_start().starts_with('[') {
        return serde_json::from_str::<Vec<Frame>>(&raw).map_err(|err| FrameError::Parse {
            path: path.display().to_string(),
            line: err.line(),
            message: err.to_string(),
        });
    }

    let mut frames = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let frame = parse_frame_str(line).map_err(|message| FrameError::Parse {
            path: path.display().to_string(),
            line: idx + 1,
            message,
        })?;
        frames.push(frame);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_accepts_strict_json() {
        let raw = r#"{"flows": [], "links": [], "services": []}"#;
        let frame = parse_frame_str(raw).expect("strict json parses");
        assert!(frame.is_empty());
    }

    #[test]
    fn test_parse_frame_falls_back_to_json5() {
        let raw = r#"{
            // one service, trailing comma
            services: [{id: "1", name: "frontend", identity: 1,}],
        }"#;
        let frame = parse_frame_str(raw).expect("json5 fallback parses");
        assert_eq!(frame.services.len(), 1);
        assert_eq!(frame.services[0].name, "frontend");
    }

    #[test]
    fn test_parse_frame_reports_strict_error_when_both_fail() {
        let err = parse_frame_str("definitely not a frame").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn test_flow_endpoint_fields_default() {
        let raw = r#"{"flows": [{"id": "f1", "verdict": "forwarded"}]}"#;
        let frame = parse_frame_str(raw).expect("partial flow parses");
        assert_eq!(frame.flows[0].verdict, Verdict::Forwarded);
        assert_eq!(frame.flows[0].source.identity, 0);
        assert!(frame.flows[0].http_status.is_none());
    }
}
