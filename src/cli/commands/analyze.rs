//! Analyze Command
//!
//! Nutrition analysis of a meal photo, full or quick.
//!
//! Usage:
//!   sarma analyze <image> [--tier premium] [--provider fast]
//!   sarma estimate <image>

use crate::ai::QualityTier;
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, load_image};
use crate::types::Result;

pub async fn run(
    ctx: &CommandContext,
    image: &str,
    tier: QualityTier,
    provider: Option<&str>,
) -> Result<()> {
    let analyzer = ctx.services.meal_analyzer()?;
    let provider = provider
        .map(|name| analyzer.resolve_provider(name))
        .transpose()?;
    let image = load_image(image)?;

    let analysis = analyzer.analyze_meal(&image, tier, provider).await;
    Output::new().emit(&analysis, ctx.format)
}

pub async fn estimate(ctx: &CommandContext, image: &str) -> Result<()> {
    let analyzer = ctx.services.meal_analyzer()?;
    let image = load_image(image)?;

    let estimate = analyzer.quick_calorie_estimate(&image).await;
    Output::new().emit(&estimate, ctx.format)
}
