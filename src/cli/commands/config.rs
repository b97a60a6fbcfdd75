//! Config Command
//!
//! Manage Sarma configuration.
//!
//! Usage:
//!   sarma config show [-g] [-f json]
//!   sarma config path
//!   sarma config init [-g] [--force]

use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show configuration
pub fn show(global: bool, format: &str) -> Result<()> {
    if !global {
        return ConfigLoader::show_config(format == "json");
    }

    match ConfigLoader::global_config_path() {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(&path)?;
            println!("# Global Config: {}\n", path.display());
            println!("{}", content);
        }
        Some(_) => {
            println!("No global config found.");
            println!("Run 'sarma config init --global' to create one.");
        }
        None => println!("Cannot determine global config directory."),
    }
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

pub fn init(global: bool, force: bool) -> Result<()> {
    let (scope, path) = if global {
        ("global", ConfigLoader::init_global(force)?)
    } else {
        ("project", ConfigLoader::init_project(force)?)
    };
    let output = Output::new();
    output.success(&format!("Initialized {} configuration", scope));
    println!("  Config: {}", path.display());
    if !force {
        output.info("Existing files are kept; pass --force to overwrite");
    }
    Ok(())
}
