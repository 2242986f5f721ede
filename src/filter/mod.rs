//! Filter query language: parsing, aggregation and diffing
//!
//! Users narrow the flow map with a small expression language. One clause
//! selects an attribute class, an optional side of the connection and a
//! value; whitespace-separated clauses form an expression.
//!
//! # Syntax
//!
//! ```text
//! [!]{direction}:{kind}={query}
//! ```
//!
//! # Directions
//!
//! - `from:` - the source side must match
//! - `to:` - the destination side must match
//! - `both:` - either side may match (default when omitted)
//!
//! # Kinds
//!
//! - `label=` - endpoint label, `key` or `key=value`
//! - `ip=` - endpoint IP address
//! - `dns=` - DNS name of the endpoint
//! - `identity=` - numeric security identity
//! - `tcp-flag=` - TCP flag present on the flow (direction is ignored)
//! - `pod=` - pod name (default kind when omitted is `label`)
//!
//! # Examples
//!
//! ```text
//! from:label=app=frontend        # flows leaving frontend pods
//! !to:ip=10.0.0.1                # hide flows into this address
//! dns=api.cluster.local          # either side resolves to this name
//! from:pod=coredns-abc12 tcp-flag=syn   # two clauses, combined per MatchMode
//! ```

pub mod diff;
pub mod entry;
pub mod error;
pub mod filters;

pub use diff::{Change, FiltersDiff};
pub use entry::{FilterDirection, FilterEntry, FilterKind};
pub use error::FilterParseError;
pub use filters::{Filters, MatchMode};

/// Parses a whitespace-separated expression into clauses with the lenient
/// grammar. Quoted segments keep their inner whitespace; blank pieces are
/// dropped.
pub fn parse_expression(input: &str) -> Vec<FilterEntry> {
    split_preserving_quotes(input)
        .into_iter()
        .filter_map(|piece| FilterEntry::parse(piece.trim_matches('"')))
        .collect()
}

/// Split a string by whitespace while preserving quoted segments
fn split_preserving_quotes(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ' ' | '\t' if !in_quotes => {
                if i > start {
                    let part = &s[start..i];
                    if !part.trim().is_empty() {
                        parts.push(part.trim());
                    }
                }
                start = i + 1;
            }
            _ => {}
        }
    }

    if start < s.len() {
        let part = &s[start..];
        if !part.trim().is_empty() {
            parts.push(part.trim());
        }
    }

    parts
}
