//! Error types for llm-api-bench

use thiserror::Error;

/// Crate error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or unsupported configuration, raised before any network activity
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection failure or timeout while talking to the API
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response from the API
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, as returned by the server
        body: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Batch config file could not be parsed
    #[error("invalid config file: {0}")]
    ConfigFile(#[from] toml::de::Error),

    /// Result record could not be serialized
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::Config("unsupported API type: foo".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: unsupported API type: foo"
        );
    }

    #[test]
    fn test_api_error_display() {
        let err = Error::Api {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "API error (429): rate limited");
    }
}
