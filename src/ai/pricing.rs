//! Provider Pricing
//!
//! Per-token and per-image rates used to turn usage into a USD cost.
//! Each adapter kind ships list-price defaults; `ai.<slot>.pricing`
//! overrides them.

use serde::{Deserialize, Serialize};

use crate::constants::pricing::{gemini_flash, gpt4o, local};
use crate::types::{Result, SarmaError};

/// USD rates for one model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    /// USD per one million input tokens
    pub input_per_million: f64,
    /// USD per one million output tokens
    pub output_per_million: f64,
    /// USD per input image
    pub per_image: f64,
}

impl Pricing {
    pub const GEMINI_FLASH: Pricing = Pricing {
        input_per_million: gemini_flash::INPUT_PER_MILLION,
        output_per_million: gemini_flash::OUTPUT_PER_MILLION,
        per_image: gemini_flash::PER_IMAGE,
    };

    pub const GPT4O: Pricing = Pricing {
        input_per_million: gpt4o::INPUT_PER_MILLION,
        output_per_million: gpt4o::OUTPUT_PER_MILLION,
        per_image: gpt4o::PER_IMAGE,
    };

    /// Self-hosted models cost nothing per call
    pub const LOCAL: Pricing = Pricing {
        input_per_million: local::INPUT_PER_MILLION,
        output_per_million: local::OUTPUT_PER_MILLION,
        per_image: local::PER_IMAGE,
    };

    /// Cost of one call. Never negative, never NaN.
    pub fn cost(&self, input_tokens: u32, output_tokens: u32, images: u32) -> f64 {
        let input = f64::from(input_tokens) / 1_000_000.0 * self.input_per_million;
        let output = f64::from(output_tokens) / 1_000_000.0 * self.output_per_million;
        let image = f64::from(images) * self.per_image;
        let total = input + output + image;
        if total.is_finite() { total.max(0.0) } else { 0.0 }
    }

    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("input_per_million", self.input_per_million),
            ("output_per_million", self.output_per_million),
            ("per_image", self.per_image),
        ];
        for (name, rate) in rates {
            if !rate.is_finite() || rate < 0.0 {
                return Err(SarmaError::Config(format!(
                    "pricing.{} must be a non-negative number, got {}",
                    name, rate
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_gemini_image_call_cost() {
        let cost = Pricing::GEMINI_FLASH.cost(1_000_000, 0, 0);
        assert!((cost - 0.075).abs() < 1e-12);

        let cost = Pricing::GEMINI_FLASH.cost(0, 0, 1000);
        assert!((cost - 0.0025).abs() < 1e-12);
    }

    #[test]
    fn test_premium_costs_more_than_fast() {
        let fast = Pricing::GEMINI_FLASH.cost(800, 300, 1);
        let premium = Pricing::GPT4O.cost(800, 300, 1);
        assert!(premium > fast);
    }

    #[test]
    fn test_local_is_free() {
        assert_eq!(Pricing::LOCAL.cost(10_000, 10_000, 3), 0.0);
    }

    #[test]
    fn test_validate_rejects_negative_rates() {
        let bad = Pricing {
            input_per_million: -1.0,
            ..Pricing::GPT4O
        };
        assert!(bad.validate().is_err());
        assert!(Pricing::GPT4O.validate().is_ok());
    }

    proptest! {
        #[test]
        fn cost_is_never_negative(
            input in any::<u32>(),
            output in any::<u32>(),
            images in 0u32..100,
            rate in -10.0f64..10.0,
        ) {
            let pricing = Pricing {
                input_per_million: rate,
                output_per_million: rate,
                per_image: rate,
            };
            let cost = pricing.cost(input, output, images);
            prop_assert!(cost >= 0.0);
            prop_assert!(cost.is_finite());
        }
    }
}
