//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/sarma/) and project (.sarma/) level configuration.

use serde::{Deserialize, Serialize};

use crate::ai::{ConfidenceConfig, ProviderConfig, ProviderKind, RoutingConfig};
use crate::types::Result;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// AI provider, routing and scoring settings
    pub ai: AiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            ai: AiConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `SarmaError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        self.ai.fast.validate("fast")?;
        self.ai.premium.validate("premium")?;
        self.ai.routing.validate()?;
        self.ai.confidence.validate()?;
        Ok(())
    }
}

// =============================================================================
// AI Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Cheap, fast provider tried first
    pub fast: ProviderConfig,

    /// High-quality provider for premium and escalated calls
    pub premium: ProviderConfig,

    pub routing: RoutingConfig,

    pub confidence: ConfidenceConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            fast: ProviderConfig::for_kind(ProviderKind::Gemini),
            premium: ProviderConfig::for_kind(ProviderKind::OpenAi),
            routing: RoutingConfig::default(),
            confidence: ConfidenceConfig::default(),
        }
    }
}
