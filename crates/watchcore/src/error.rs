use std::path::PathBuf;

/// Errors raised while turning a JSON term into a query expression.
///
/// Shape errors mean the term was not laid out the way the term expects
/// (not an array, missing or mistyped argument). Value errors mean the
/// layout was right but the literal itself was rejected. Both carry the
/// offending literal rendered as JSON.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryParseError {
    #[error("invalid \"{term}\" term: {detail} (got {value})")]
    InvalidShape {
        term: String,
        detail: String,
        value: String,
    },

    #[error("invalid value for \"{term}\" term: {detail} (got {value})")]
    InvalidValue {
        term: String,
        detail: String,
        value: String,
    },

    #[error("unknown expression term '{0}'")]
    UnknownTerm(String),
}

impl QueryParseError {
    pub(crate) fn shape(term: &str, detail: impl Into<String>, value: &serde_json::Value) -> Self {
        Self::InvalidShape {
            term: term.to_string(),
            detail: detail.into(),
            value: value.to_string(),
        }
    }

    pub(crate) fn value(term: &str, detail: impl Into<String>, value: &serde_json::Value) -> Self {
        Self::InvalidValue {
            term: term.to_string(),
            detail: detail.into(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Config error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Query parse error: {0}")]
    QueryParse(#[from] QueryParseError),

    #[error("failed to validate command: {0}")]
    CommandValidation(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("client required capability `{0}` is not supported by this server")]
    CapabilityRequired(String),

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, WatchError>;
