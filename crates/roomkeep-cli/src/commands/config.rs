//! Config command handlers

use std::path::Path;

use anyhow::{Context, Result};

use roomkeep_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: &Path, output: &Output) -> Result<()> {
    let config = Config::load_from_path(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => output.json(&serde_json::json!({
            "data_dir": config.data_dir,
            "database_file": config.database_file,
            "database_path": config.database_path(),
            "log_level": config.log_level,
            "config_file": config_path,
        }))?,
        OutputFormat::Quiet => {
            println!("{}", config.database_path().display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:      {}", config.data_dir.display());
            println!("  database_file: {}", config.database_file);
            println!("  log_level:     {}", config.log_level);
            println!();
            println!("Database:    {}", config.database_path().display());
            println!("Config file: {}", config_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: &str, value: &str, config_path: &Path, output: &Output) -> Result<()> {
    let mut config = Config::load_from_path(config_path).context("Failed to load configuration")?;
    config.set(key, value)?;
    config
        .save_to_path(config_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}
