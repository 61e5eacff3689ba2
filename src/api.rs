use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::graph::GraphSnapshot;

/// Upper bound on one request, connection setup included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures local to a single fetch attempt. Nothing here is retried
/// automatically; the caller may simply issue the same request again.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    Decode(String),
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    address: &'a str,
}

/// Blocking client for the `messages` endpoint. Cheap to clone; intended to be
/// handed to short-lived fetch threads.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.base_url)
    }

    /// Fetch the transaction subgraph around `address`. The address is sent
    /// as-is; normalization is the caller's concern. Repeating a fetch is
    /// idempotent by construction, the result just re-merges.
    pub fn fetch_subgraph(&self, address: &str) -> Result<GraphSnapshot, FetchError> {
        let response = self
            .http
            .post(self.messages_url())
            .json(&MessagesRequest { address })
            .send()
            .map_err(|error| FetchError::Network(error.to_string()))?
            .error_for_status()
            .map_err(|error| FetchError::Network(error.to_string()))?;

        let body = response
            .text()
            .map_err(|error| FetchError::Network(error.to_string()))?;

        serde_json::from_str(&body).map_err(|error| FetchError::Decode(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_url_handles_trailing_slash() {
        let client = ApiClient::new("http://localhost:3000/").expect("client builds");
        assert_eq!(client.messages_url(), "http://localhost:3000/messages");

        let client = ApiClient::new("http://localhost:3000").expect("client builds");
        assert_eq!(client.messages_url(), "http://localhost:3000/messages");
    }

    #[test]
    fn transport_failure_is_a_network_error() {
        // Port 9 (discard) is not expected to speak HTTP anywhere tests run.
        let client = ApiClient::new("http://127.0.0.1:9").expect("client builds");
        match client.fetch_subgraph("0xABC") {
            Err(FetchError::Network(_)) => {}
            other => panic!("expected a network error, got {other:?}"),
        }
    }
}
