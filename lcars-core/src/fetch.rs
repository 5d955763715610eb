//! The injected HTTP fetcher contract.

use async_trait::async_trait;

use lcars_types::LcarsError;

/// A raw HTTP response as the transport layer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, in arrival order.
    pub headers: Vec<(String, String)>,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// A 200 response with the given body and no headers.
    #[must_use]
    pub const fn ok(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body,
        }
    }

    /// An empty-bodied response with the given status.
    #[must_use]
    pub const fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

/// Injected HTTP client used by provider transports.
///
/// Implementations must not retry internally; the retry policy owns that.
/// Returning `Err` means the request never produced a status (connection
/// failure, timeout); HTTP error statuses come back as `Ok` responses.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform a single GET request.
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<FetchResponse, LcarsError>;
}
