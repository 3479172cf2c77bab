//! Error types for Archon Bridge

use thiserror::Error;

/// Archon Bridge error type
#[derive(Error, Debug)]
pub enum Error {
    /// Backend answered with a non-success HTTP status
    #[error("HTTP {code}")]
    Status { code: u16 },

    /// Connection refused, DNS failure, timeout, or any other transport fault
    #[error("{0}")]
    Transport(String),

    /// Success response whose body is not the expected JSON
    #[error("{0}")]
    Decode(String),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Operation attempted after the shared connection was released
    #[error("Connection to the knowledge base has been closed")]
    Closed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML configuration could not be parsed
    #[error("Invalid configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for Archon Bridge operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Error::Decode(error_chain(&err));
        }
        if let Some(status) = err.status() {
            return Error::Status {
                code: status.as_u16(),
            };
        }
        Error::Transport(error_chain(&err))
    }
}

/// Render an error followed by its `source()` chain, e.g.
/// `error sending request for url (...): operation timed out`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
