//! User context and meal history rendering for prompts

use crate::types::{MealSummary, UserContext};

/// Whole numbers print without a trailing ".0"
fn number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{:.1}", n)
    }
}

/// Render the user's profile as labelled lines, skipping missing fields
pub fn format_user_context(context: Option<&UserContext>) -> String {
    let Some(ctx) = context else {
        return "No user context available".to_string();
    };

    let mut parts = Vec::new();
    if !ctx.health_goals.is_empty() {
        parts.push(format!("**Health Goals:** {}", ctx.health_goals.join(", ")));
    }
    if !ctx.dietary_restrictions.is_empty() {
        parts.push(format!(
            "**Dietary Restrictions:** {}",
            ctx.dietary_restrictions.join(", ")
        ));
    }
    if let Some(goal) = ctx.daily_calorie_goal.filter(|g| *g > 0) {
        parts.push(format!("**Daily Calorie Goal:** {} kcal", goal));
    }
    if let Some(count) = ctx.recent_meals.filter(|c| *c > 0) {
        parts.push(format!("**Recent Meals:** {} meals logged", count));
    }
    if let Some(avg) = ctx.average_daily_calories.filter(|a| *a > 0.0) {
        parts.push(format!("**Avg Daily Calories:** {} kcal", number(avg)));
    }
    if let Some(prefs) = ctx.preferences.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        parts.push(format!("**Preferences:** {}", prefs));
    }

    if parts.is_empty() {
        "No detailed context available".to_string()
    } else {
        parts.join("\n")
    }
}

/// One numbered line per meal: name, macros when known, log time when known
pub fn summarize_meals(meals: &[MealSummary]) -> String {
    if meals.is_empty() {
        return "No meals logged".to_string();
    }

    meals
        .iter()
        .enumerate()
        .map(|(i, meal)| {
            let mut line = format!(
                "{}. {}",
                i + 1,
                meal.name.as_deref().unwrap_or("Unnamed meal")
            );
            if let Some(n) = &meal.nutrition {
                line.push_str(&format!(
                    " - {} cal, {}g protein, {}g carbs, {}g fat",
                    number(n.calories),
                    number(n.protein_g),
                    number(n.carbs_g),
                    number(n.fat_g)
                ));
            }
            if let Some(at) = &meal.logged_at {
                line.push_str(&format!(" ({})", at));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MealMacros;

    #[test]
    fn test_full_context() {
        let ctx = UserContext {
            health_goals: vec!["lose weight".into(), "more energy".into()],
            dietary_restrictions: vec!["vegetarian".into()],
            daily_calorie_goal: Some(1800),
            recent_meals: Some(12),
            average_daily_calories: Some(1950.0),
            preferences: Some("loves spicy food".into()),
        };
        let text = format_user_context(Some(&ctx));
        assert_eq!(
            text,
            "**Health Goals:** lose weight, more energy\n\
             **Dietary Restrictions:** vegetarian\n\
             **Daily Calorie Goal:** 1800 kcal\n\
             **Recent Meals:** 12 meals logged\n\
             **Avg Daily Calories:** 1950 kcal\n\
             **Preferences:** loves spicy food"
        );
    }

    #[test]
    fn test_missing_fields_omitted() {
        let ctx = UserContext {
            daily_calorie_goal: Some(2200),
            ..Default::default()
        };
        assert_eq!(
            format_user_context(Some(&ctx)),
            "**Daily Calorie Goal:** 2200 kcal"
        );
        assert_eq!(
            format_user_context(Some(&UserContext::default())),
            "No detailed context available"
        );
        assert_eq!(format_user_context(None), "No user context available");
    }

    #[test]
    fn test_meal_lines() {
        let meals = vec![
            MealSummary {
                name: Some("Oatmeal".into()),
                nutrition: Some(MealMacros {
                    calories: 300.0,
                    protein_g: 10.0,
                    carbs_g: 54.0,
                    fat_g: 6.5,
                }),
                logged_at: Some("2026-10-18T08:00:00Z".into()),
            },
            MealSummary::default(),
        ];
        assert_eq!(
            summarize_meals(&meals),
            "1. Oatmeal - 300 cal, 10g protein, 54g carbs, 6.5g fat (2026-10-18T08:00:00Z)\n\
             2. Unnamed meal"
        );
        assert_eq!(summarize_meals(&[]), "No meals logged");
    }
}
