//! lcars-core
//!
//! Contracts and utilities shared across the lcars ecosystem.
//!
//! - `provider`: the `MetadataProvider` trait and provider profiles.
//! - `fetch` / `clock` / `catalog` / `store`: injected external interfaces.
//! - `cancel`: cooperative cancellation tokens.
//! - `sanitize`: free-text sanitization and value validators.
//! - `quality`: the per-record quality scorer.
//! - `merge`: the multi-source conflict resolver.
#![warn(missing_docs)]

pub mod cancel;
pub mod catalog;
pub mod clock;
pub mod fetch;
pub mod merge;
pub mod provider;
pub mod quality;
pub mod sanitize;
pub mod store;

pub use cancel::CancelToken;
pub use catalog::{Catalog, EpisodeEntry, Era, SeriesEntry};
pub use clock::{Clock, SystemClock};
pub use fetch::{FetchResponse, Fetcher};
pub use lcars_types::LcarsError;
pub use merge::merge_records;
pub use provider::{MetadataProvider, ProviderProfile};
pub use quality::{ProviderStats, QualityScorer};
pub use store::KvStore;
