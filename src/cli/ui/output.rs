use console::style;
use serde::Serialize;

use crate::cli::util::OutputFormat;
use crate::services::{
    AiMetadata, Capabilities, ChatResponse, DietTrendAnalysis, MealAnalysis, MealSuggestion,
    NutritionAdvice, QuickEstimateResult, RecipeResponse, SuggestionsResponse,
};
use crate::types::{NutritionRecord, Result, SarmaError};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        println!("  {:<14} {}", style(label).dim(), value);
    }

    /// Print a response in the requested format
    pub fn emit<T: Serialize + ConsoleView>(&self, value: &T, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => println!(
                "{}",
                serde_yaml::to_string(value).map_err(|e| SarmaError::Parse {
                    message: format!("YAML output failed: {}", e),
                })?
            ),
            OutputFormat::Console => value.render(self),
        }
        Ok(())
    }

    fn metadata(&self, meta: &AiMetadata) {
        self.section("AI");
        self.field("provider", format!("{} ({})", meta.provider, meta.model));
        self.field("confidence", format!("{:.2}", meta.confidence));
        self.field("cost", format!("${:.6}", meta.cost_usd));
        self.field("tokens", meta.tokens_used);
        self.field("time", format!("{} ms", meta.response_time_ms));
        if let Some(error) = &meta.error {
            self.error(error);
        }
    }

    fn nutrition(&self, n: &NutritionRecord) {
        self.field("calories", format!("{:.0} kcal", n.calories));
        self.field("protein", format!("{:.1} g", n.protein_g));
        self.field("carbs", format!("{:.1} g", n.carbs_g));
        self.field("fat", format!("{:.1} g", n.fat_g));
        for (label, value, unit) in [
            ("fiber", n.fiber_g, "g"),
            ("sugar", n.sugar_g, "g"),
            ("sodium", n.sodium_mg, "mg"),
        ] {
            if let Some(v) = value {
                self.field(label, format!("{:.1} {}", v, unit));
            }
        }
    }

    fn text(&self, title: &str, body: &str, meta: &AiMetadata) {
        self.header(title);
        if body.is_empty() {
            self.warning("No answer from the model");
        } else {
            println!("{}", body);
        }
        self.metadata(meta);
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

/// Styled terminal rendering of a response
pub trait ConsoleView {
    fn render(&self, out: &Output);
}

impl ConsoleView for MealAnalysis {
    fn render(&self, out: &Output) {
        let n = &self.nutrition;
        out.header(n.meal_name.as_deref().unwrap_or("Meal analysis"));
        out.nutrition(n);
        if !n.ingredients.is_empty() {
            out.section("Ingredients");
            for ingredient in &n.ingredients {
                match n.portions.get(ingredient) {
                    Some(portion) => println!("  • {} ({})", ingredient, portion),
                    None => println!("  • {}", ingredient),
                }
            }
        }
        if let Some(notes) = &n.notes {
            out.info(notes);
        }
        out.metadata(&self.ai_metadata);
        if self.routing.escalated {
            out.warning(&format!(
                "Escalated: {}",
                self.routing.escalation_reason.as_deref().unwrap_or("low confidence")
            ));
        }
        out.field("total cost", format!("${:.6}", self.routing.total_cost_usd));
    }
}

impl ConsoleView for QuickEstimateResult {
    fn render(&self, out: &Output) {
        out.header("Quick estimate");
        out.field("calories", format!("{:.0} kcal", self.estimate.calories));
        out.field("meal", &self.estimate.description);
        out.field("cost", format!("${:.6}", self.cost_usd));
        out.field("time", format!("{} ms", self.response_time_ms));
        if let Some(error) = &self.estimate.error {
            out.error(error);
        }
    }
}

impl ConsoleView for RecipeResponse {
    fn render(&self, out: &Output) {
        let r = &self.recipe;
        out.header(&r.name);
        if !r.description.is_empty() {
            println!("{}", r.description);
        }
        out.field(
            "time",
            format!("{} min ({} prep)", r.total_time_min(), r.prep_time_min),
        );
        out.field("servings", r.servings);
        out.field("difficulty", r.difficulty);

        out.section("Ingredients");
        for ingredient in &r.ingredients {
            println!("  • {}", ingredient);
        }
        out.section("Instructions");
        for (i, step) in r.instructions.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
        out.section("Per serving");
        out.nutrition(&r.nutrition);
        out.metadata(&self.ai_metadata);
    }
}

impl ConsoleView for SuggestionsResponse {
    fn render(&self, out: &Output) {
        out.header("Recipe ideas");
        if self.suggestions.is_empty() {
            out.warning("No suggestions could be read from the response");
        }
        for s in &self.suggestions {
            println!(
                "\n{} {}",
                style(&s.name).bold(),
                style(format!(
                    "~{:.0} kcal, {} min, {}",
                    s.estimated_calories, s.prep_time_min, s.difficulty
                ))
                .dim()
            );
            if !s.description.is_empty() {
                println!("  {}", s.description);
            }
            for benefit in &s.key_benefits {
                println!("  {} {}", style("+").green(), benefit);
            }
        }
        out.metadata(&self.ai_metadata);
    }
}

impl ConsoleView for ChatResponse {
    fn render(&self, out: &Output) {
        out.text("Sarma", &self.response, &self.ai_metadata);
    }
}

impl ConsoleView for MealSuggestion {
    fn render(&self, out: &Output) {
        out.text(
            &format!("{} suggestion", self.meal_type),
            &self.suggestion,
            &self.ai_metadata,
        );
    }
}

impl ConsoleView for NutritionAdvice {
    fn render(&self, out: &Output) {
        out.text("Advice", &self.advice, &self.ai_metadata);
    }
}

impl ConsoleView for DietTrendAnalysis {
    fn render(&self, out: &Output) {
        out.text(
            &format!(
                "Diet trends ({} meals, {} days)",
                self.meals_analyzed, self.time_period_days
            ),
            &self.analysis,
            &self.ai_metadata,
        );
    }
}

impl ConsoleView for Capabilities {
    fn render(&self, out: &Output) {
        out.header("Sarma Status");
        out.section("Providers");
        for slot in &self.providers {
            let mark = if slot.configured {
                style("✓").green()
            } else {
                style("✗").red()
            };
            println!("  {} {:<8} {} ({})", mark, slot.slot, slot.name, slot.model);
            if let Some(reason) = &slot.reason {
                println!("    {}", style(reason).dim());
            }
        }
        out.section("Capabilities");
        for (name, ready) in [
            ("meal analysis", self.meal_analysis),
            ("recipes", self.recipe_generation),
            ("chat", self.chat),
        ] {
            out.field(name, if ready { "ready" } else { "not configured" });
        }
    }
}
