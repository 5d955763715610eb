use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the lcars workspace.
///
/// Variants follow the enrichment error taxonomy: validation problems are
/// reported synchronously and never retried, transient I/O retries under the
/// retry policy, permanent I/O and parse failures fail only the provider
/// attempt, and aggregates collect per-provider failures for fan-out calls.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LcarsError {
    /// Invalid input: ill-formed id, malformed URL, bad external id.
    #[error("validation: {0}")]
    Validation(String),

    /// An HTTP request completed with a non-success status.
    #[error("http {status} for {url}")]
    Http {
        /// Response status code.
        status: u16,
        /// The request URL.
        url: String,
    },

    /// Transport-level network failure (timeout, reset, DNS).
    #[error("network: {0}")]
    Network(String),

    /// A provider call exceeded its time budget.
    #[error("timed out: {what}")]
    Timeout {
        /// Label for the operation that timed out.
        what: String,
    },

    /// A response body did not match the expected schema.
    #[error("{provider} parse error: {msg}")]
    Parse {
        /// Provider name that produced the unparseable payload.
        provider: String,
        /// Human-readable parse failure.
        msg: String,
    },

    /// An individual provider reported a failure.
    #[error("{provider} failed: {msg}")]
    Provider {
        /// Provider name that failed.
        provider: String,
        /// Human-readable error message.
        msg: String,
    },

    /// A resource could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing resource, e.g. "episode ent_s1_e01".
        what: String,
    },

    /// Durable storage failed (cache write, key/value store).
    #[error("storage: {0}")]
    Storage(String),

    /// The provider's quota budget for the current window is exhausted.
    #[error("quota exceeded: remaining={remaining} reset_in_ms={reset_in_ms}")]
    QuotaExceeded {
        /// Remaining units at the time of rejection.
        remaining: u64,
        /// Milliseconds until the quota window resets.
        reset_in_ms: u64,
    },

    /// The operation was cancelled cooperatively.
    #[error("cancelled")]
    Cancelled,

    /// The retry policy ran out of attempts; carries the final failure.
    #[error("exhausted after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of attempts made, including the first.
        attempts: u32,
        /// The last error observed.
        last: Box<LcarsError>,
    },

    /// No providers are enabled or registered for the request.
    #[error("no providers available")]
    NoProviders,

    /// All attempted providers failed; contains the individual failures.
    #[error("all providers failed: {0:?}")]
    AllProvidersFailed(Vec<LcarsError>),

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),
}

impl LcarsError {
    /// Helper: build a `Provider` error with the provider name and message.
    pub fn provider(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `Parse` error for a provider payload.
    pub fn parse(provider: impl Into<String>, msg: impl std::fmt::Display) -> Self {
        Self::Parse {
            provider: provider.into(),
            msg: msg.to_string(),
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build a `Timeout` error.
    pub fn timeout(what: impl Into<String>) -> Self {
        Self::Timeout { what: what.into() }
    }

    /// Whether retrying the operation may succeed.
    ///
    /// Transient: network failures, timeouts, HTTP 429 and 5xx, and quota
    /// blocks (the window resets). Everything else is treated as permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout { .. } | Self::QuotaExceeded { .. } => true,
            Self::Http { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }

    /// Whether the failure is permanent for this provider/URL.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        !matches!(self, Self::Cancelled) && !self.is_transient()
    }

    /// Stable category tag for job results and telemetry.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Network(_) | Self::Timeout { .. } => "transient-io",
            Self::Http { status, .. } if *status == 429 || (500..=599).contains(status) => {
                "transient-io"
            }
            Self::Http { .. } => "permanent-io",
            Self::Parse { .. } => "parse",
            Self::Provider { .. } => "permanent-io",
            Self::NotFound { .. } => "no-data",
            Self::Storage(_) => "resource",
            Self::QuotaExceeded { .. } => "quota",
            Self::Cancelled => "cancelled",
            Self::Exhausted { .. } => "exhausted",
            Self::NoProviders => "no-providers",
            Self::AllProvidersFailed(_) => "all-failed",
            Self::Other(_) => "unknown",
        }
    }

    /// Flatten nested `AllProvidersFailed` structures into a plain vector.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::AllProvidersFailed(list) => list.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}
