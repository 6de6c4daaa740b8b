use thiserror::Error;

use super::recommend::MIN_QUESTIONS_FOR_RECOMMENDATION;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("weak threshold must be within [0, 100], got {0}")]
    InvalidWeakThreshold(f64),

    #[error("strong threshold must be within [0, 100], got {0}")]
    InvalidStrongThreshold(f64),

    #[error("weak threshold ({weak}) must be <= strong threshold ({strong})")]
    InvalidThresholdBounds { weak: f64, strong: f64 },

    #[error("recommendation limit must be > 0")]
    InvalidRecommendationLimit,
}

/// Tunable knobs for the read-side analytics.
///
/// The streak bar and mastery buckets are fixed policy and live next to the
/// code that applies them.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSettings {
    weak_threshold: f64,
    strong_threshold: f64,
    recommendation_limit: usize,
    min_questions_for_recommendation: u32,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            weak_threshold: 60.0,
            strong_threshold: 80.0,
            recommendation_limit: 5,
            min_questions_for_recommendation: MIN_QUESTIONS_FOR_RECOMMENDATION,
        }
    }
}

impl AnalyticsSettings {
    /// Creates custom analytics settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a threshold is outside `[0, 100]`, the weak
    /// threshold exceeds the strong one, or the limit is zero.
    pub fn new(
        weak_threshold: f64,
        strong_threshold: f64,
        recommendation_limit: usize,
        min_questions_for_recommendation: u32,
    ) -> Result<Self, SettingsError> {
        if !weak_threshold.is_finite() || !(0.0..=100.0).contains(&weak_threshold) {
            return Err(SettingsError::InvalidWeakThreshold(weak_threshold));
        }
        if !strong_threshold.is_finite() || !(0.0..=100.0).contains(&strong_threshold) {
            return Err(SettingsError::InvalidStrongThreshold(strong_threshold));
        }
        if weak_threshold > strong_threshold {
            return Err(SettingsError::InvalidThresholdBounds {
                weak: weak_threshold,
                strong: strong_threshold,
            });
        }
        if recommendation_limit == 0 {
            return Err(SettingsError::InvalidRecommendationLimit);
        }
        Ok(Self {
            weak_threshold,
            strong_threshold,
            recommendation_limit,
            min_questions_for_recommendation,
        })
    }

    /// Same settings with different classifier thresholds.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the thresholds are invalid.
    pub fn with_thresholds(&self, weak: f64, strong: f64) -> Result<Self, SettingsError> {
        Self::new(
            weak,
            strong,
            self.recommendation_limit,
            self.min_questions_for_recommendation,
        )
    }

    #[must_use]
    pub fn weak_threshold(&self) -> f64 {
        self.weak_threshold
    }

    #[must_use]
    pub fn strong_threshold(&self) -> f64 {
        self.strong_threshold
    }

    #[must_use]
    pub fn recommendation_limit(&self) -> usize {
        self.recommendation_limit
    }

    #[must_use]
    pub fn min_questions_for_recommendation(&self) -> u32 {
        self.min_questions_for_recommendation
    }
}
