//! Default `reqwest`-backed fetcher.

use async_trait::async_trait;

use lcars_core::{FetchResponse, Fetcher};
use lcars_types::LcarsError;

/// Concrete [`Fetcher`] over a shared `reqwest` client.
///
/// Performs exactly one request per call; retries belong to the retry
/// policy, never here.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestFetcher {
    /// A fetcher with a recommended user agent and no proxy.
    ///
    /// # Panics
    /// Panics if building the underlying client fails, which is unexpected
    /// in normal environments.
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .no_proxy()
            .user_agent("lcars/0.2 (+https://github.com/lcars-dev/lcars)")
            .build()
            .expect("failed to build reqwest client");
        Self { client }
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<FetchResponse, LcarsError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| LcarsError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| LcarsError::Network(e.to_string()))?
            .to_vec();
        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}
