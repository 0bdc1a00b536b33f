// Shared plumbing for the upstream clients (GitHub, Bugzilla).

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ConfigError, FetchError};

pub const USER_AGENT: &str = concat!("webcompat-metrics/", env!("CARGO_PKG_VERSION"));

/// Build an HTTP client for `source_name`.
///
/// reqwest is compiled without a bundled TLS crypto provider; install the
/// aws-lc-rs one for the process unless a provider is already in place.
pub fn http_client(source_name: &'static str) -> Result<Client, FetchError> {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FetchError::Network {
            source_name,
            message: format!("cannot build HTTP client: {e}"),
        })
}

/// Join `path` onto a configured base URL and append query pairs.
pub fn endpoint(base: &str, path: &str, query: &[(&str, String)]) -> Result<Url, ConfigError> {
    let mut url = Url::parse(&format!("{}{path}", base.trim_end_matches('/')))
        .map_err(|e| ConfigError::Invalid(format!("{base}: {e}")))?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

/// Send a GET and decode a JSON body. Every failure is fatal to the run;
/// there is no retry.
pub async fn get_json<T: DeserializeOwned>(
    req: RequestBuilder,
    source_name: &'static str,
) -> Result<T, FetchError> {
    let resp = req
        .send()
        .await
        .map_err(|e| FetchError::Network {
            source_name,
            message: e.to_string(),
        })?;

    let status = resp.status();
    debug!(source = source_name, status = status.as_u16(), url = %resp.url(), "Upstream response");
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            source_name,
            status: status.as_u16(),
            body,
        });
    }

    let bytes = resp.bytes().await.map_err(|e| FetchError::Network {
        source_name,
        message: e.to_string(),
    })?;
    decode(&bytes, source_name)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8], source_name: &'static str) -> Result<T, FetchError> {
    serde_json::from_slice(bytes).map_err(|e| FetchError::Decode {
        source_name,
        message: e.to_string(),
    })
}
