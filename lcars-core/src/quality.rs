//! Per-record quality scoring.

use chrono::{DateTime, Utc};

use lcars_types::{EpisodeField, ProviderRecord, QualityBreakdown, QualityWeights};

use crate::provider::ProviderProfile;

/// Observed per-provider performance, when the caller tracks it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProviderStats {
    /// Fraction of calls that succeeded.
    pub success_rate: Option<f64>,
    /// Fraction of supplied values later confirmed accurate.
    pub accuracy_rate: Option<f64>,
}

/// Computes completeness/accuracy/freshness/reliability sub-scores and the
/// weighted overall for a provider record.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    weights: QualityWeights,
    half_life_days: f64,
    min_freshness: f64,
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self {
            weights: QualityWeights::default(),
            half_life_days: 30.0,
            min_freshness: 0.1,
        }
    }
}

impl QualityScorer {
    /// A scorer with custom weights and the default freshness curve.
    #[must_use]
    pub fn new(weights: QualityWeights) -> Self {
        Self {
            weights,
            ..Self::default()
        }
    }

    /// Override the freshness half-life and floor.
    #[must_use]
    pub const fn with_freshness(mut self, half_life_days: f64, min_freshness: f64) -> Self {
        self.half_life_days = half_life_days;
        self.min_freshness = min_freshness;
        self
    }

    /// Score one record against its provider profile.
    #[must_use]
    pub fn score(
        &self,
        record: &ProviderRecord,
        profile: &ProviderProfile,
        observed: Option<&ProviderStats>,
        now: DateTime<Utc>,
    ) -> QualityBreakdown {
        let completeness = Self::completeness(record);
        let accuracy = Self::accuracy(record, profile, observed);
        let freshness = self.freshness(record.fetched_at, now);
        let reliability = Self::reliability(profile, observed);
        let overall = (self.weights.completeness * completeness
            + self.weights.accuracy * accuracy
            + self.weights.freshness * freshness
            + self.weights.reliability * reliability)
            .clamp(0.0, 1.0);
        QualityBreakdown {
            completeness,
            accuracy,
            freshness,
            reliability,
            overall,
        }
    }

    /// Importance-weighted coverage over every scorable field.
    fn completeness(record: &ProviderRecord) -> f64 {
        let mut supplied = 0.0;
        let mut total = 0.0;
        for field in EpisodeField::ALL {
            total += field.importance();
            if record.field(field).is_some() {
                supplied += field.importance();
            }
        }
        if total == 0.0 { 0.0 } else { supplied / total }
    }

    /// Mean of the accuracy signals that exist for this record.
    fn accuracy(
        record: &ProviderRecord,
        profile: &ProviderProfile,
        observed: Option<&ProviderStats>,
    ) -> f64 {
        let mut signals = vec![profile.confidence_level];
        if !record.validations.is_empty() {
            let valid = record.validations.values().filter(|v| v.is_valid).count();
            signals.push(valid as f64 / record.validations.len() as f64);
        }
        if let Some(rate) = observed.and_then(|o| o.accuracy_rate) {
            signals.push(rate);
        }
        signals.iter().sum::<f64>() / signals.len() as f64
    }

    /// Exponential decay `0.5^(age_days / half_life)` with a floor.
    fn freshness(&self, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let age_ms = now.signed_duration_since(fetched_at).num_milliseconds();
        if age_ms <= 0 {
            return 1.0;
        }
        let age_days = age_ms as f64 / 86_400_000.0;
        let decayed = 0.5_f64.powf(age_days / self.half_life_days);
        decayed.max(self.min_freshness)
    }

    /// Mean of the source reliability signals.
    fn reliability(profile: &ProviderProfile, observed: Option<&ProviderStats>) -> f64 {
        let mut signals = vec![
            profile.confidence_level,
            profile.reliability.uptime,
            profile.reliability.accuracy,
        ];
        if let Some(rate) = observed.and_then(|o| o.success_rate) {
            signals.push(rate);
        }
        signals.iter().sum::<f64>() / signals.len() as f64
    }

    /// Actionable observations for sub-scores below their thresholds.
    #[must_use]
    pub fn recommendations(breakdown: &QualityBreakdown) -> Vec<String> {
        let mut out = Vec::new();
        if breakdown.completeness < 0.6 {
            out.push("query additional sources to fill missing fields".to_string());
        }
        if breakdown.accuracy < 0.7 {
            out.push("re-validate supplied fields against a second source".to_string());
        }
        if breakdown.freshness < 0.3 {
            out.push("refresh: record is stale".to_string());
        }
        if breakdown.reliability < 0.5 {
            out.push("prefer a higher-reliability source for this episode".to_string());
        }
        out
    }
}
