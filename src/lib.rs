//! Sarma - Multi-Model AI Core for Nutrition
//!
//! Routes meal-photo analysis, recipe generation and nutrition chat between a
//! cheap, fast vision model and an expensive, high-quality one, and turns
//! free-form model output into typed records.
//!
//! ## Core Features
//!
//! - **Provider Adapters**: Gemini, OpenAI and Ollama behind one trait, with
//!   per-call timeout, one transient retry and cost accounting
//! - **Confidence Escalation**: low-confidence fast answers are redone once on
//!   the premium model when the caller's tier allows it
//! - **Tolerant Parsing**: JSON extraction with repair, then regex fallback,
//!   never failing
//! - **Explicit Capabilities**: missing credentials surface as
//!   `NotConfigured`, never as a degraded answer
//!
//! ## Quick Start
//!
//! ```ignore
//! use sarma::{AiServices, ConfigLoader, QualityTier};
//! use sarma::ai::ImageInput;
//!
//! let config = ConfigLoader::load()?;
//! let services = AiServices::from_config(&config.ai)?;
//! let analyzer = services.meal_analyzer()?;
//!
//! let image = ImageInput::parse("https://example.com/lunch.jpg")?;
//! let analysis = analyzer.analyze_meal(&image, QualityTier::Premium, None).await;
//! println!("{} kcal", analysis.nutrition.calories);
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: provider adapters, routing, confidence, parsing, prompts
//! - [`services`]: meal analyzer, recipe generator, chat assistant
//! - [`config`]: layered configuration
//! - [`types`]: error taxonomy and domain records

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod services;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{AiConfig, Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, LlmError, Result, SarmaError};

// Routing
pub use ai::{
    ImageInput, ProviderAdapter, ProviderEnvelope, ProviderRole, ProviderRouter, QualityTier,
    RoutingDecision,
};

// Domain Records
pub use types::{
    MealSummary, MealType, NutritionRecord, QuickEstimate, RecipePreference, RecipeRecord,
    RecipeRequest, RecipeSuggestion, UserContext,
};

// Services
pub use services::{AiMetadata, AiServices, ChatAssistant, MealAnalyzer, RecipeGenerator};
