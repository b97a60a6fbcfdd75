//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.
//! Anything marked as a tuning parameter is only a default: the
//! matching config key overrides it at runtime.

/// Routing and escalation constants
pub mod routing {
    /// Escalate image analysis when the primary confidence falls below this
    /// (tuning parameter: `ai.routing.confidence_threshold`)
    pub const CONFIDENCE_THRESHOLD: f32 = 0.7;

    /// Maximum escalations per logical request
    pub const MAX_ESCALATIONS: u8 = 1;
}

/// Confidence heuristic constants
pub mod confidence {
    /// Starting score before phrase penalties and detail bonus
    pub const BASELINE: f32 = 0.8;

    /// Deducted once per uncertainty phrase found in the response
    pub const PHRASE_PENALTY: f32 = 0.1;

    /// Added when the response is longer than `DETAIL_THRESHOLD_CHARS`
    pub const DETAIL_BONUS: f32 = 0.05;

    /// Response length (characters) that earns the detail bonus
    pub const DETAIL_THRESHOLD_CHARS: usize = 200;

    /// Phrases that signal the model is hedging
    pub const UNCERTAINTY_PHRASES: &[&str] = &[
        "might be",
        "could be",
        "possibly",
        "probably",
        "not sure",
        "unclear",
        "difficult to tell",
    ];

    /// Bias applied by the premium adapter on top of the shared heuristic
    pub const PREMIUM_BIAS: f32 = 0.05;
}

/// Parser constants
pub mod parser {
    /// Confidence assigned to records extracted from well-formed JSON
    pub const JSON_CONFIDENCE: f32 = 0.8;

    /// Confidence assigned to records recovered by the prose fallback
    pub const FALLBACK_CONFIDENCE: f32 = 0.6;

    /// Confidence assigned when nothing could be extracted at all
    pub const EMPTY_CONFIDENCE: f32 = 0.0;

    /// Maximum repair passes attempted on malformed JSON
    pub const MAX_REPAIR_ATTEMPTS: usize = 3;

    /// Characters of raw output quoted in parse notes
    pub const NOTE_PREVIEW_CHARS: usize = 120;

    /// Quick-estimate description when the model names no meal
    pub const UNKNOWN_MEAL: &str = "Unknown meal";
}

/// Per-provider pricing defaults (USD)
///
/// Published list prices at the time of writing. Override through
/// `ai.<slot>.pricing` when they change.
pub mod pricing {
    pub mod gemini_flash {
        pub const INPUT_PER_MILLION: f64 = 0.075;
        pub const OUTPUT_PER_MILLION: f64 = 0.30;
        /// $0.0025 per 1K images
        pub const PER_IMAGE: f64 = 0.0025 / 1000.0;
    }

    pub mod gpt4o {
        pub const INPUT_PER_MILLION: f64 = 5.00;
        pub const OUTPUT_PER_MILLION: f64 = 15.00;
        /// One 1024x1024 image at high detail
        pub const PER_IMAGE: f64 = 0.01275;
    }

    pub mod local {
        pub const INPUT_PER_MILLION: f64 = 0.0;
        pub const OUTPUT_PER_MILLION: f64 = 0.0;
        pub const PER_IMAGE: f64 = 0.0;
    }
}

/// Provider defaults
pub mod provider {
    /// Default sampling temperature
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    /// Default output token cap
    pub const DEFAULT_MAX_TOKENS: u32 = 2048;

    /// Characters per token when a provider does not report usage
    pub const CHARS_PER_TOKEN: usize = 4;

    /// Transient failures retried once at the adapter boundary
    pub const MAX_TRANSIENT_RETRIES: usize = 1;

    /// Delay before the transient retry (milliseconds)
    pub const RETRY_DELAY_MS: u64 = 500;
}

/// HTTP/Network constants
pub mod network {
    /// Budget for one provider call, retry included (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 10;

    /// Timeout for downloading a remote meal photo (seconds)
    pub const IMAGE_FETCH_TIMEOUT_SECS: u64 = 10;

    /// Largest remote image accepted for inlining (bytes)
    pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;
}

/// Capability service constants
pub mod services {
    /// Default number of recipe suggestions
    pub const DEFAULT_SUGGESTION_COUNT: usize = 5;

    /// Default diet-trend window (days)
    pub const DEFAULT_TREND_PERIOD_DAYS: u32 = 7;
}
