use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use lcars_core::{FetchResponse, Fetcher};
use lcars_types::LcarsError;

/// Scripted fetcher: responses are queued per URL and consumed in order.
/// URLs with no queued response answer 404. Every request is logged.
#[derive(Default)]
pub struct MockFetcher {
    queues: Mutex<HashMap<String, VecDeque<Result<FetchResponse, LcarsError>>>>,
    log: Mutex<Vec<String>>,
}

impl MockFetcher {
    /// An empty fetcher; every request 404s until scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a full response for a URL.
    pub fn push(&self, url: &str, response: Result<FetchResponse, LcarsError>) {
        self.queues
            .lock()
            .expect("mutex poisoned")
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    /// Queue a response with the given status and body.
    pub fn push_status(&self, url: &str, status: u16, body: &[u8]) {
        self.push(
            url,
            Ok(FetchResponse {
                status,
                headers: Vec::new(),
                body: body.to_vec(),
            }),
        );
    }

    /// Queue a 200 response with the given body.
    pub fn push_ok(&self, url: &str, body: &[u8]) {
        self.push_status(url, 200, body);
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.log.lock().expect("mutex poisoned").clone()
    }

    /// Number of requests made so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.log.lock().expect("mutex poisoned").len()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(
        &self,
        url: &str,
        _headers: &[(String, String)],
    ) -> Result<FetchResponse, LcarsError> {
        self.log.lock().expect("mutex poisoned").push(url.to_string());
        let queued = self
            .queues
            .lock()
            .expect("mutex poisoned")
            .get_mut(url)
            .and_then(VecDeque::pop_front);
        queued.unwrap_or_else(|| Ok(FetchResponse::status(404)))
    }
}
