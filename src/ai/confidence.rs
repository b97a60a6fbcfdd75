//! Confidence Scoring with Hedge Penalties
//!
//! Every adapter scores its raw text with the same heuristic:
//! - Start from a baseline
//! - Subtract a penalty for each hedging phrase present
//! - Add a bonus for long, detailed answers
//! - Add the adapter's bias, then clamp to [0, 1]
//!
//! The score is a proxy for answer quality that drives escalation. It is
//! computed from the text only, never from provider metadata.

use serde::{Deserialize, Serialize};

use crate::constants::confidence as defaults;
use crate::types::{Result, SarmaError};

/// Tunable parameters for the hedge heuristic (`ai.confidence`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Score before penalties and bonuses
    pub baseline: f32,
    /// Deducted once per distinct phrase found
    pub phrase_penalty: f32,
    /// Added for detailed answers
    pub detail_bonus: f32,
    /// Length (characters) above which the detail bonus applies
    pub detail_threshold_chars: usize,
    /// Hedging phrases, matched case-insensitively
    pub uncertainty_phrases: Vec<String>,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            baseline: defaults::BASELINE,
            phrase_penalty: defaults::PHRASE_PENALTY,
            detail_bonus: defaults::DETAIL_BONUS,
            detail_threshold_chars: defaults::DETAIL_THRESHOLD_CHARS,
            uncertainty_phrases: defaults::UNCERTAINTY_PHRASES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ConfidenceConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.baseline) {
            return Err(SarmaError::Config(format!(
                "confidence.baseline must be between 0.0 and 1.0, got {}",
                self.baseline
            )));
        }
        if self.phrase_penalty < 0.0 || self.detail_bonus < 0.0 {
            return Err(SarmaError::Config(
                "confidence.phrase_penalty and confidence.detail_bonus must be non-negative"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Score with the adjustments that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceScore {
    pub confidence: f32,
    /// Hedging phrases that were penalised
    pub penalties: Vec<String>,
    pub detail_bonus_applied: bool,
}

/// Shared hedge-phrase scorer
#[derive(Debug, Clone, Default)]
pub struct ConfidenceScorer {
    config: ConfidenceConfig,
}

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ConfidenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConfidenceConfig {
        &self.config
    }

    /// Score `text`, shifting by `bias` before clamping
    pub fn score(&self, text: &str, bias: f32) -> ConfidenceScore {
        let lower = text.to_lowercase();
        let penalties: Vec<String> = self
            .config
            .uncertainty_phrases
            .iter()
            .filter(|phrase| lower.contains(&phrase.to_lowercase()))
            .cloned()
            .collect();

        let detail_bonus_applied = text.chars().count() > self.config.detail_threshold_chars;

        let mut confidence =
            self.config.baseline - self.config.phrase_penalty * penalties.len() as f32;
        if detail_bonus_applied {
            confidence += self.config.detail_bonus;
        }

        ConfidenceScore {
            confidence: clamp_confidence(confidence + bias),
            penalties,
            detail_bonus_applied,
        }
    }

    /// Convenience wrapper returning only the number
    pub fn assess(&self, text: &str, bias: f32) -> f32 {
        self.score(text, bias).confidence
    }
}

/// Clamp to [0, 1]; NaN maps to 0
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_short_answer_scores_baseline() {
        let scorer = ConfidenceScorer::new();
        assert!((scorer.assess("Grilled chicken with rice.", 0.0) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_each_phrase_penalised_once() {
        let scorer = ConfidenceScorer::new();
        let score = scorer.score("It might be rice, or it might be quinoa. Possibly both.", 0.0);
        assert_eq!(score.penalties, vec!["might be", "possibly"]);
        assert!((score.confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_phrases_match_case_insensitively() {
        let scorer = ConfidenceScorer::new();
        let score = scorer.score("UNCLEAR what the sauce is", 0.0);
        assert_eq!(score.penalties, vec!["unclear"]);
    }

    #[test]
    fn test_detail_bonus_and_bias() {
        let scorer = ConfidenceScorer::new();
        let long = "a".repeat(201);
        let score = scorer.score(&long, 0.0);
        assert!(score.detail_bonus_applied);
        assert!((score.confidence - 0.85).abs() < 1e-6);
        assert!((scorer.assess(&long, 0.05) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_bias_clamped_to_one() {
        let scorer = ConfidenceScorer::new();
        assert_eq!(scorer.assess("x", 5.0), 1.0);
    }

    #[test]
    fn test_custom_phrases() {
        let scorer = ConfidenceScorer::with_config(ConfidenceConfig {
            uncertainty_phrases: vec!["maybe".to_string()],
            ..Default::default()
        });
        assert!((scorer.assess("maybe pasta, possibly", 0.0) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_nan() {
        assert_eq!(clamp_confidence(f32::NAN), 0.0);
        assert_eq!(clamp_confidence(-0.3), 0.0);
    }

    proptest! {
        #[test]
        fn confidence_always_in_unit_range(text in ".{0,400}", bias in -2.0f32..2.0) {
            let confidence = ConfidenceScorer::new().assess(&text, bias);
            prop_assert!((0.0..=1.0).contains(&confidence));
        }
    }
}
