//! The `MetadataProvider` trait implemented by provider-client crates.

use async_trait::async_trait;

use lcars_types::{
    EpisodeField, EpisodeId, LcarsError, MetadataSource, ProviderRecord, ProviderReliability,
};

use crate::cancel::CancelToken;

/// Static self-description a provider advertises for scoring and routing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProfile {
    /// The source tag.
    pub source: MetadataSource,
    /// Baseline confidence in the provider's data, in [0, 1].
    pub confidence_level: f64,
    /// Advertised reliability figures.
    pub reliability: ProviderReliability,
    /// Fields this provider can supply.
    pub fields: Vec<EpisodeField>,
}

impl ProviderProfile {
    /// Baseline profile for a source, used when a client has not been
    /// registered (e.g. scoring records restored from persistence).
    #[must_use]
    pub fn baseline(source: MetadataSource) -> Self {
        use EpisodeField as F;
        let (confidence, uptime, accuracy, latency_ms, fields): (_, _, _, _, &[F]) = match source {
            MetadataSource::MemoryAlpha => (
                0.9,
                0.98,
                0.95,
                800,
                &[
                    F::Title,
                    F::AirDate,
                    F::Synopsis,
                    F::PlotPoints,
                    F::GuestStars,
                    F::Directors,
                    F::Writers,
                    F::MemoryAlphaUrl,
                    F::Connections,
                ],
            ),
            MetadataSource::Tmdb => (
                0.85,
                0.99,
                0.9,
                300,
                &[
                    F::Title,
                    F::AirDate,
                    F::Synopsis,
                    F::GuestStars,
                    F::Directors,
                    F::Writers,
                    F::ProductionCode,
                    F::TmdbId,
                    F::ImdbId,
                ],
            ),
            MetadataSource::Imdb => (0.8, 0.99, 0.9, 400, &[F::Title, F::AirDate, F::ImdbId]),
            MetadataSource::TrekCore => (0.75, 0.95, 0.85, 1200, &[F::Title, F::Synopsis]),
            MetadataSource::Stapi => (
                0.7,
                0.97,
                0.88,
                500,
                &[
                    F::Title,
                    F::AirDate,
                    F::Season,
                    F::Episode,
                    F::ProductionCode,
                    F::Directors,
                    F::Writers,
                ],
            ),
            MetadataSource::StarTrekCom => (0.65, 0.9, 0.8, 900, &[F::Title, F::Synopsis]),
            MetadataSource::Manual => (
                0.95,
                1.0,
                0.99,
                1,
                &[
                    F::Title,
                    F::AirDate,
                    F::Synopsis,
                    F::PlotPoints,
                    F::GuestStars,
                    F::Directors,
                    F::Writers,
                    F::Connections,
                ],
            ),
            _ => unreachable!("MetadataSource variant not covered by ProviderProfile::baseline"),
        };
        Self {
            source,
            confidence_level: confidence,
            reliability: ProviderReliability {
                uptime,
                accuracy,
                latency_ms,
            },
            fields: fields.to_vec(),
        }
    }
}

/// A single external metadata source.
///
/// `fetch_episode` returning `Ok(None)` means the provider has no data for
/// the episode or declined the request; it is not an error and does not
/// consume retry budget. Unexpected errors propagate and are recorded as job
/// failures once the retry policy is exhausted.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Stable provider name for routing and error tagging.
    fn name(&self) -> &'static str;

    /// The source tag stamped onto produced records.
    fn source(&self) -> MetadataSource;

    /// Self-description used by the quality scorer.
    fn profile(&self) -> ProviderProfile {
        ProviderProfile::baseline(self.source())
    }

    /// Whether the provider is usable right now (configuration and
    /// credentials present). Unavailable providers are skipped, not failed.
    fn is_available(&self) -> bool {
        true
    }

    /// Fetch and parse one episode.
    async fn fetch_episode(
        &self,
        id: &EpisodeId,
        cancel: &CancelToken,
    ) -> Result<Option<ProviderRecord>, LcarsError>;
}
