//! lcars-providers
//!
//! One client per external metadata source, all sharing the
//! `lcars-middleware` transport stack: cache consultation, token-bucket
//! rate limiting, soft daily quotas, and retried fetches. Clients parse
//! provider-specific payloads into neutral `ProviderRecord`s, sanitize free
//! text, and stamp per-field validation entries.
#![warn(missing_docs)]

mod common;
mod manual;
mod memory_alpha;
mod stapi;
mod tmdb;
mod trekcore;

pub use crate::manual::ManualProvider;
pub use crate::memory_alpha::MemoryAlphaClient;
pub use crate::stapi::StapiClient;
pub use crate::tmdb::TmdbClient;
pub use crate::trekcore::TrekCoreClient;
