use thiserror::Error;

/// Errors from the strict clause parser. The lenient parser never produces
/// these; it degrades unknown tokens to defaults instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterParseError {
    #[error("Unknown direction: '{0}'. Valid directions are: from, to, both")]
    UnknownDirection(String),

    #[error("Unknown filter kind: '{0}'. Valid kinds are: label, ip, dns, identity, tcp-flag, pod")]
    UnknownKind(String),

    #[error("Expected '{{direction}}:{{kind}}={{query}}' format, got: {0}")]
    MalformedClause(String),

    #[error("Empty query for filter kind '{0}'")]
    EmptyQuery(String),
}
