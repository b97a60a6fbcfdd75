//! Chat Commands
//!
//! Usage:
//!   sarma chat <message> [--history turns.json] [--context profile.json] [--hq]
//!   sarma suggest-meal <meal-type> [--context profile.json]
//!   sarma advice <question> [--context profile.json] [--fast]
//!   sarma trends <meals.json> [--days 7]

use std::path::Path;

use crate::ai::ChatMessage;
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, read_json, read_json_or_default};
use crate::constants::services::DEFAULT_TREND_PERIOD_DAYS;
use crate::types::{MealSummary, MealType, Result, UserContext};

/// Optional profile file; an absent file means no context at all
fn user_context(path: Option<&Path>) -> Result<Option<UserContext>> {
    path.map(read_json::<UserContext>).transpose()
}

pub async fn run(
    ctx: &CommandContext,
    message: &str,
    history_file: Option<&Path>,
    context_file: Option<&Path>,
    use_high_quality: bool,
) -> Result<()> {
    let assistant = ctx.services.chat_assistant()?;
    let history: Vec<ChatMessage> = read_json_or_default(history_file)?;
    let context = user_context(context_file)?;

    let response = assistant
        .chat(message, &history, context.as_ref(), use_high_quality)
        .await;
    Output::new().emit(&response, ctx.format)
}

pub async fn suggest_meal(
    ctx: &CommandContext,
    meal_type: MealType,
    context_file: Option<&Path>,
    use_high_quality: bool,
) -> Result<()> {
    let assistant = ctx.services.chat_assistant()?;
    let context = user_context(context_file)?;

    let response = assistant
        .suggest_meal(meal_type, context.as_ref(), use_high_quality)
        .await;
    Output::new().emit(&response, ctx.format)
}

pub async fn advice(
    ctx: &CommandContext,
    question: &str,
    context_file: Option<&Path>,
    use_high_quality: bool,
) -> Result<()> {
    let assistant = ctx.services.chat_assistant()?;
    let context = user_context(context_file)?;

    let response = assistant
        .nutrition_advice(question, context.as_ref(), use_high_quality)
        .await;
    Output::new().emit(&response, ctx.format)
}

pub async fn trends(
    ctx: &CommandContext,
    meals_file: &Path,
    days: Option<u32>,
    use_high_quality: bool,
) -> Result<()> {
    let assistant = ctx.services.chat_assistant()?;
    let meals: Vec<MealSummary> = read_json(meals_file)?;
    let days = days.unwrap_or(DEFAULT_TREND_PERIOD_DAYS);

    let response = assistant
        .analyze_diet_trends(&meals, days, use_high_quality)
        .await;
    Output::new().emit(&response, ctx.format)
}
