use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sarma::ai::QualityTier;
use sarma::cli::commands;
use sarma::cli::{CommandContext, OutputFormat};
use sarma::constants::services::DEFAULT_SUGGESTION_COUNT;
use sarma::types::{MealType, RecipePreference, RecipeRequest, SarmaError};

/// Exit code for "the AI capability is not configured"
const EXIT_NOT_CONFIGURED: u8 = 2;

#[derive(Parser)]
#[command(name = "sarma")]
#[command(
    version,
    about = "Meal analysis, recipes and nutrition chat over fast and premium AI models"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Config file (skips global/project lookup)")]
    config: Option<PathBuf>,

    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the nutrition of a meal photo
    Analyze {
        #[arg(help = "Image file, http(s) URL or data URL")]
        image: String,
        #[arg(long, default_value = "free", help = "Quality tier: free, premium")]
        tier: QualityTier,
        #[arg(long, help = "Force a provider by slot or adapter name (disables escalation)")]
        provider: Option<String>,
    },

    /// Quick calorie estimate of a meal photo (fast model only)
    Estimate {
        #[arg(help = "Image file, http(s) URL or data URL")]
        image: String,
    },

    /// Generate a recipe from constraints
    Recipe {
        #[arg(long = "ingredient", help = "Ingredient to include (repeatable)")]
        ingredients: Vec<String>,
        #[arg(long = "diet", help = "Dietary restriction (repeatable)")]
        dietary_restrictions: Vec<String>,
        #[arg(long = "goal", help = "Health goal (repeatable)")]
        health_goals: Vec<String>,
        #[arg(long)]
        cuisine: Option<String>,
        #[arg(long)]
        max_calories: Option<u32>,
        #[arg(long, help = "breakfast, lunch, dinner, snack")]
        meal_type: Option<MealType>,
        #[arg(long, help = "Use the premium model")]
        hq: bool,
    },

    /// Generate a recipe from a dish photo (premium model)
    RecipePhoto {
        image: String,
        #[arg(long, default_value = "similar", help = "similar, healthier, different")]
        preference: RecipePreference,
    },

    /// Suggest recipe ideas for a user profile
    SuggestRecipes {
        #[arg(long, help = "User context JSON file")]
        context: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_SUGGESTION_COUNT)]
        count: usize,
        #[arg(long)]
        hq: bool,
    },

    /// Chat with the nutrition assistant
    Chat {
        message: String,
        #[arg(long, help = "Prior turns as a JSON array of {role, content}")]
        history: Option<PathBuf>,
        #[arg(long, help = "User context JSON file")]
        context: Option<PathBuf>,
        #[arg(long)]
        hq: bool,
    },

    /// Suggest a meal
    SuggestMeal {
        meal_type: MealType,
        #[arg(long, help = "User context JSON file")]
        context: Option<PathBuf>,
        #[arg(long)]
        hq: bool,
    },

    /// Ask a nutrition or health question (premium model unless --fast)
    Advice {
        question: String,
        #[arg(long, help = "User context JSON file")]
        context: Option<PathBuf>,
        #[arg(long)]
        fast: bool,
    },

    /// Analyze eating patterns in logged meals
    Trends {
        #[arg(help = "JSON array of logged meals")]
        meals: PathBuf,
        #[arg(long, help = "Period covered, in days (default: 7)")]
        days: Option<u32>,
        #[arg(long)]
        hq: bool,
    },

    /// Show configured providers and capabilities
    Status {
        #[arg(long, help = "Also check provider reachability")]
        check: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(long = "as", default_value = "toml", help = "Output format: toml, json")]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mSarma encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<SarmaError>() {
            Some(err @ SarmaError::NotConfigured { .. }) => {
                eprintln!("\x1b[33mNot configured:\x1b[0m {}", err);
                eprintln!("Set the provider API keys, then check with 'sarma status'.");
                ExitCode::from(EXIT_NOT_CONFIGURED)
            }
            _ => {
                eprintln!("\x1b[31mError:\x1b[0m {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Commands::Config { action } = &cli.command {
        match action {
            ConfigAction::Show { global, format } => commands::config::show(*global, format)?,
            ConfigAction::Path => commands::config::path()?,
            ConfigAction::Init { global, force } => commands::config::init(*global, *force)?,
        }
        return Ok(());
    }

    let ctx = CommandContext::load(cli.config.as_deref(), cli.format)?;
    let rt = Runtime::new()?;

    rt.block_on(async move {
        match cli.command {
            Commands::Analyze {
                image,
                tier,
                provider,
            } => commands::analyze::run(&ctx, &image, tier, provider.as_deref()).await,
            Commands::Estimate { image } => commands::analyze::estimate(&ctx, &image).await,
            Commands::Recipe {
                ingredients,
                dietary_restrictions,
                health_goals,
                cuisine,
                max_calories,
                meal_type,
                hq,
            } => {
                let request = RecipeRequest {
                    ingredients,
                    dietary_restrictions,
                    health_goals,
                    cuisine,
                    max_calories,
                    meal_type,
                };
                commands::recipe::run(&ctx, &request, hq).await
            }
            Commands::RecipePhoto { image, preference } => {
                commands::recipe::from_photo(&ctx, &image, preference).await
            }
            Commands::SuggestRecipes { context, count, hq } => {
                commands::recipe::suggest(&ctx, context.as_deref(), count, hq).await
            }
            Commands::Chat {
                message,
                history,
                context,
                hq,
            } => {
                commands::chat::run(&ctx, &message, history.as_deref(), context.as_deref(), hq)
                    .await
            }
            Commands::SuggestMeal {
                meal_type,
                context,
                hq,
            } => commands::chat::suggest_meal(&ctx, meal_type, context.as_deref(), hq).await,
            Commands::Advice {
                question,
                context,
                fast,
            } => commands::chat::advice(&ctx, &question, context.as_deref(), !fast).await,
            Commands::Trends { meals, days, hq } => {
                commands::chat::trends(&ctx, &meals, days, hq).await
            }
            Commands::Status { check } => commands::status::run(&ctx, check).await,
            Commands::Config { .. } => Ok(()),
        }
    })?;

    Ok(())
}
