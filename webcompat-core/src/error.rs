/// Top-level error type for the webcompat metrics engine.
///
/// All fallible operations in `webcompat-core` return [`Result<T, CompatError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum CompatError {
    /// Error from the issue cache (`SQLite` operations, schema setup).
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error fetching records from an upstream tracker.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the SQLite-backed issue cache.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Underlying `SQLite` operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization of a cached issue failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors talking to GitHub or Bugzilla.
///
/// Any of these aborts the run: no partial report is ever produced.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// Network-level failure (DNS, TLS, connection reset).
    #[error("{source_name} API request failed: {message}")]
    Network {
        /// Which upstream was being queried ("GitHub", "Bugzilla").
        source_name: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// The upstream answered with a non-success HTTP status.
    #[error("{source_name} API {status}: {body}")]
    Status {
        /// Which upstream was being queried.
        source_name: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The response body was not the JSON shape we expected.
    #[error("{source_name} API returned malformed JSON: {message}")]
    Decode {
        /// Which upstream was being queried.
        source_name: &'static str,
        /// Decoder error text.
        message: String,
    },

    /// Credentials required for the request are missing.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

/// Errors in configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, CompatError>`.
pub type Result<T> = std::result::Result<T, CompatError>;
