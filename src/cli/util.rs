//! CLI Common Utilities
//!
//! Shared configuration loading, image and JSON input handling for command
//! handlers.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::ai::ImageInput;
use crate::ai::provider::mime_from_path;
use crate::config::{Config, ConfigLoader};
use crate::services::AiServices;
use crate::types::{Result, SarmaError};

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// The response object as pretty JSON
    #[default]
    Json,
    Yaml,
    /// Styled summary for terminals
    Console,
}

/// Command execution context
///
/// Loaded once per invocation and passed to every capability command.
pub struct CommandContext {
    pub config: Config,
    pub services: AiServices,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load configuration (explicit file or the layered defaults) and build
    /// the service registry
    pub fn load(config_path: Option<&Path>, format: OutputFormat) -> Result<Self> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        let services = AiServices::from_config(&config.ai)?;

        Ok(Self {
            config,
            services,
            format,
        })
    }
}

/// Image argument: http(s) URL, `data:` URL or local file path
pub fn load_image(source: &str) -> Result<ImageInput> {
    let trimmed = source.trim();
    if trimmed.starts_with("http://")
        || trimmed.starts_with("https://")
        || trimmed.starts_with("data:")
    {
        return ImageInput::parse(trimmed);
    }

    let path = PathBuf::from(trimmed);
    if !path.is_file() {
        return Err(SarmaError::Config(format!(
            "Image not found: {} (expected a file path, http(s) URL or data URL)",
            path.display()
        )));
    }
    let bytes = std::fs::read(&path)?;
    Ok(ImageInput::from_bytes(&bytes, mime_from_path(&path)))
}

/// Deserialize a JSON file (meal lists, chat history, user context)
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        SarmaError::Config(format!("Cannot read {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Optional JSON file argument, `T::default()` when absent
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    path.map(read_json).transpose().map(Option::unwrap_or_default)
}
