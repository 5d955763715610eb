//! Quality scoring vocabulary.

use serde::{Deserialize, Serialize};

/// Weights for combining the four quality sub-scores into an overall grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    /// Weight of field coverage.
    pub completeness: f64,
    /// Weight of validation/accuracy signals.
    pub accuracy: f64,
    /// Weight of data age.
    pub freshness: f64,
    /// Weight of source reliability.
    pub reliability: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            completeness: 0.4,
            accuracy: 0.3,
            freshness: 0.2,
            reliability: 0.1,
        }
    }
}

/// The four sub-scores plus the weighted overall, all in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    /// Importance-weighted field coverage.
    pub completeness: f64,
    /// Mean of the accuracy signals available for the record.
    pub accuracy: f64,
    /// Exponential age decay with a configured floor.
    pub freshness: f64,
    /// Mean of the source reliability signals.
    pub reliability: f64,
    /// Weighted sum of the four sub-scores.
    pub overall: f64,
}

impl QualityBreakdown {
    /// Map the overall score onto the letter-grade scale.
    #[must_use]
    pub fn grade(&self) -> QualityGrade {
        QualityGrade::from_score(self.overall)
    }
}

/// Coarse grade derived from the overall quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityGrade {
    /// Overall >= 0.9.
    Excellent,
    /// Overall >= 0.75.
    Good,
    /// Overall >= 0.6.
    Acceptable,
    /// Overall >= 0.4.
    Poor,
    /// Anything below 0.4.
    Insufficient,
}

impl QualityGrade {
    /// Grade thresholds per the scoring policy.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            Self::Excellent
        } else if score >= 0.75 {
            Self::Good
        } else if score >= 0.6 {
            Self::Acceptable
        } else if score >= 0.4 {
            Self::Poor
        } else {
            Self::Insufficient
        }
    }
}
