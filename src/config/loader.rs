//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/sarma/config.toml)
//! 3. Project config (.sarma/config.toml)
//! 4. Environment variables (SARMA_* prefix, `__` between levels)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, SarmaError};

const ENV_PREFIX: &str = "SARMA_";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // SARMA_AI__ROUTING__CONFIDENCE_THRESHOLD -> ai.routing.confidence_threshold
        figment = figment.merge(Self::env_provider());

        Self::extract(figment)
    }

    /// Load configuration from a specific file only (plus environment)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(SarmaError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Self::env_provider());
        Self::extract(figment)
    }

    fn env_provider() -> Env {
        Env::prefixed(ENV_PREFIX).split("__").lowercase(true)
    }

    fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .extract()
            .map_err(|e| SarmaError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/sarma/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("sarma"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    pub fn project_dir() -> PathBuf {
        PathBuf::from(".sarma")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths and where credentials come from
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());

        println!();
        println!("Environment overrides: {}<SECTION>__<KEY>", ENV_PREFIX);
        for var in ["GEMINI_API_KEY", "OPENAI_API_KEY"] {
            let set = if env::var(var).is_ok() { "✓" } else { "✗" };
            println!("  {} {}", set, var);
        }
    }

    /// Show current effective configuration
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load()?;

        if as_json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| SarmaError::Config(e.to_string()))?
            );
        }

        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write the commented global config; existing files survive unless `force`
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            SarmaError::Config("Cannot determine global config directory".to_string())
        })?;
        let path = global_dir.join("config.toml");
        Self::write_config(&global_dir, &path, force)?;
        Ok(path)
    }

    /// Write the commented project config under `.sarma/`
    pub fn init_project(force: bool) -> Result<PathBuf> {
        let path = Self::project_config_path();
        Self::write_config(&Self::project_dir(), &path, force)?;
        Ok(path)
    }

    fn write_config(dir: &Path, path: &Path, force: bool) -> Result<()> {
        fs::create_dir_all(dir)?;
        if path.exists() && !force {
            info!("Config exists: {}", path.display());
            return Ok(());
        }
        fs::write(path, Self::default_config_toml())?;
        info!("Created config: {}", path.display());
        Ok(())
    }

    /// Default config content (TOML); every key shown at its default
    fn default_config_toml() -> String {
        r#"# Sarma Configuration
# Project settings in .sarma/config.toml override ~/.config/sarma/config.toml.
# Any key can also be set from the environment, e.g.
#   SARMA_AI__ROUTING__CONFIDENCE_THRESHOLD=0.75

version = "1.0"

# Fast, cheap provider tried first
[ai.fast]
kind = "gemini"
# model = "gemini-2.0-flash-exp"
# api_key = ""            # falls back to GEMINI_API_KEY
timeout_secs = 30
temperature = 0.7
max_tokens = 2048
max_retries = 1

# High-quality provider for premium and escalated calls
[ai.premium]
kind = "openai"
# model = "gpt-4o"
# api_key = ""            # falls back to OPENAI_API_KEY
# api_base = "https://api.openai.com/v1"
timeout_secs = 30
temperature = 0.7
max_tokens = 2048
max_retries = 1

# Override list prices (USD)
# [ai.premium.pricing]
# input_per_million = 5.0
# output_per_million = 15.0
# per_image = 0.01275

[ai.routing]
# Escalate image analysis when confidence is below this
confidence_threshold = 0.7
# "cheap-first": premium requests start on the fast provider and escalate
# "direct": premium requests go straight to the premium provider
escalation_strategy = "cheap-first"

[ai.confidence]
baseline = 0.8
phrase_penalty = 0.1
detail_bonus = 0.05
detail_threshold_chars = 200
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{EscalationStrategy, ProviderKind};
    use tempfile::TempDir;

    #[test]
    fn test_default_template_parses() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, ConfigLoader::default_config_toml()).unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.ai.fast.kind, ProviderKind::Gemini);
        assert_eq!(
            config.ai.routing.escalation_strategy,
            EscalationStrategy::CheapFirst
        );
        assert!(!config.ai.confidence.uncertainty_phrases.is_empty());
    }

    #[test]
    fn test_load_from_file_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "[ai.routing]\nconfidence_threshold = 0.55\n\n[ai.fast]\nkind = \"ollama\"\n",
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.ai.routing.confidence_threshold, 0.55);
        assert_eq!(config.ai.fast.kind, ProviderKind::Ollama);
        assert_eq!(config.ai.premium.kind, ProviderKind::OpenAi);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[ai.fast]\ntemperature = 5.0\n").unwrap();
        assert!(matches!(
            ConfigLoader::load_from_file(&path),
            Err(SarmaError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::load_from_file(Path::new("/nonexistent/sarma.toml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_write_config_respects_force() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join(".sarma");
        let path = dir.join("config.toml");

        ConfigLoader::write_config(&dir, &path, false).unwrap();
        assert!(path.exists());

        fs::write(&path, "version = \"custom\"\n").unwrap();
        ConfigLoader::write_config(&dir, &path, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "version = \"custom\"\n");

        ConfigLoader::write_config(&dir, &path, true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[ai.routing]"));
    }

    #[test]
    fn test_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SARMA_AI__ROUTING__CONFIDENCE_THRESHOLD", "0.65");
            jail.set_env("SARMA_AI__PREMIUM__MODEL", "gpt-4o-mini");
            let config = ConfigLoader::load().map_err(|e| e.to_string())?;
            assert_eq!(config.ai.routing.confidence_threshold, 0.65);
            assert_eq!(config.ai.premium.model_name(), "gpt-4o-mini");
            Ok(())
        });
    }
}
