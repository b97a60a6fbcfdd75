pub mod context;
pub mod error;
pub mod nutrition;
pub mod recipe;
pub mod utils;

pub use context::{MealMacros, MealSummary, UserContext};
pub use error::{ErrorCategory, ErrorClassifier, LlmError, Result, SarmaError};
pub use nutrition::{MealType, NutritionRecord, QuickEstimate};
pub use recipe::{Difficulty, RecipePreference, RecipeRecord, RecipeRequest, RecipeSuggestion};
pub use utils::{
    coerce_f64, estimate_tokens, json_f64, json_opt_f64, json_string, json_string_list,
    json_string_map, json_string_or, json_u32, preview, split_list,
};
