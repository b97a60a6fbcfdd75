//! Recipe Commands
//!
//! Usage:
//!   sarma recipe [--ingredient chicken] [--diet vegan] [--goal "more protein"] [--hq]
//!   sarma recipe-photo <image> [--preference healthier]
//!   sarma suggest-recipes [--context profile.json] [--count 5]

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, load_image, read_json_or_default};
use crate::types::{RecipePreference, RecipeRequest, Result, UserContext};

pub async fn run(
    ctx: &CommandContext,
    request: &RecipeRequest,
    use_high_quality: bool,
) -> Result<()> {
    let generator = ctx.services.recipe_generator()?;
    let response = generator.generate_recipe(request, use_high_quality).await;
    Output::new().emit(&response, ctx.format)
}

pub async fn from_photo(
    ctx: &CommandContext,
    image: &str,
    preference: RecipePreference,
) -> Result<()> {
    let generator = ctx.services.recipe_generator()?;
    let image = load_image(image)?;

    let response = generator.generate_from_photo(&image, preference).await;
    Output::new().emit(&response, ctx.format)
}

pub async fn suggest(
    ctx: &CommandContext,
    context_file: Option<&Path>,
    count: usize,
    use_high_quality: bool,
) -> Result<()> {
    let generator = ctx.services.recipe_generator()?;
    let preferences: UserContext = read_json_or_default(context_file)?;

    let response = generator
        .suggest_recipes(&preferences, count, use_high_quality)
        .await;
    Output::new().emit(&response, ctx.format)
}
