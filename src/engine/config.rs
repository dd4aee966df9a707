//! Analysis engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables of the analysis engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Similarity cutoff for the fixed-threshold similarity graph.
    pub fixed_threshold: f64,

    /// Number of evenly spaced thresholds in the [0, 1] sweep.
    pub sweep_steps: usize,

    /// Minimum similarity ratio for "did you mean" suggestions.
    pub suggestion_cutoff: f64,

    /// Maximum number of suggestions per undefined reference.
    pub max_suggestions: usize,

    /// Upper bound on enumerated simple cycles before the search is
    /// abandoned for the pending node.
    pub cycle_cap: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_threshold: 0.65,
            sweep_steps: 21,
            suggestion_cutoff: 0.7,
            max_suggestions: 3,
            cycle_cap: 10_000,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the fixed similarity threshold.
    pub fn with_fixed_threshold(mut self, threshold: f64) -> Self {
        self.fixed_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Builder: set the number of sweep steps.
    pub fn with_sweep_steps(mut self, steps: usize) -> Self {
        self.sweep_steps = steps.max(2);
        self
    }

    /// Builder: set the suggestion cutoff.
    pub fn with_suggestion_cutoff(mut self, cutoff: f64) -> Self {
        self.suggestion_cutoff = cutoff.clamp(0.0, 1.0);
        self
    }

    /// Builder: set the maximum number of suggestions.
    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    /// Builder: set the simple-cycle enumeration cap.
    pub fn with_cycle_cap(mut self, cap: usize) -> Self {
        self.cycle_cap = cap.max(1);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.fixed_threshold) {
            return Err(ConfigError::InvalidFixedThreshold);
        }
        if self.sweep_steps < 2 {
            return Err(ConfigError::InvalidSweepSteps);
        }
        if !(0.0..=1.0).contains(&self.suggestion_cutoff) {
            return Err(ConfigError::InvalidSuggestionCutoff);
        }
        if self.cycle_cap == 0 {
            return Err(ConfigError::InvalidCycleCap);
        }
        Ok(())
    }

    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let fixed_threshold = std::env::var("ANALYSIS_FIXED_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.fixed_threshold);

        let sweep_steps = std::env::var("ANALYSIS_SWEEP_STEPS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.sweep_steps);

        let suggestion_cutoff = std::env::var("ANALYSIS_SUGGESTION_CUTOFF")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.suggestion_cutoff);

        let max_suggestions = std::env::var("ANALYSIS_MAX_SUGGESTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_suggestions);

        let cycle_cap = std::env::var("ANALYSIS_CYCLE_CAP")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cycle_cap);

        Self {
            fixed_threshold,
            sweep_steps,
            suggestion_cutoff,
            max_suggestions,
            cycle_cap,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidFixedThreshold,
    InvalidSweepSteps,
    InvalidSuggestionCutoff,
    InvalidCycleCap,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFixedThreshold => {
                write!(f, "Fixed threshold must be between 0.0 and 1.0")
            }
            Self::InvalidSweepSteps => write!(f, "Threshold sweep needs at least 2 steps"),
            Self::InvalidSuggestionCutoff => {
                write!(f, "Suggestion cutoff must be between 0.0 and 1.0")
            }
            Self::InvalidCycleCap => write!(f, "Cycle cap must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!((config.fixed_threshold - 0.65).abs() < f64::EPSILON);
        assert_eq!(config.sweep_steps, 21);
        assert!((config.suggestion_cutoff - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.max_suggestions, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder_clamps() {
        let config = EngineConfig::new()
            .with_fixed_threshold(1.5)
            .with_sweep_steps(1)
            .with_suggestion_cutoff(-0.2);

        assert!((config.fixed_threshold - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.sweep_steps, 2);
        assert!((config.suggestion_cutoff - 0.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidSweepSteps;
        assert!(err.to_string().contains("at least 2 steps"));
    }
}
