//! Configuration management for the Augury CLI.
//!
//! Configuration is loaded from (in order of precedence):
//! 1. Command-line arguments
//! 2. Environment variables (AUGURY_*)
//! 3. Config file (~/.config/augury/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};

use augury_core::ServiceConfig;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "AUGURY_";

/// Loads configuration from all sources.
///
/// Reports configuration errors but falls back to defaults.
pub fn load() -> ServiceConfig {
    let config_path = config_path();

    match load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\x1b[33mWarning:\x1b[0m Configuration error, using defaults");
            eprintln!("  Config file: {}", config_path.display());
            eprintln!("  Error: {e}");
            eprintln!();
            eprintln!("  To fix, edit or delete the config file:");
            eprintln!("    rm {}", config_path.display());
            eprintln!();
            ServiceConfig::default()
        }
    }
}

/// Loads configuration layered over the file at `path`.
///
/// A missing file is not an error.
pub fn load_from(path: &Path) -> Result<ServiceConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ServiceConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()
}

/// Returns the path to the config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Returns the path to the config directory.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("augury")
}

/// Prints the effective configuration and its sources.
pub fn show_config(config: &ServiceConfig) -> Result<(), toml::ser::Error> {
    let config_path = config_path();

    println!("Augury Configuration");
    println!("====================\n");

    println!("Config file: {}", config_path.display());
    if config_path.exists() {
        println!("Status: Found\n");
    } else {
        println!("Status: Not found (using defaults)\n");
    }

    println!("Current settings:");
    for line in toml::to_string_pretty(config)?.lines() {
        println!("  {line}");
    }

    println!("\nEnvironment variables:");
    for key in [
        "MAX_MODELS_IN_MEMORY",
        "MODEL_CACHE_TTL_SECS",
        "MAX_BATCH_SIZE",
        "PREDICTION_TIMEOUT_SECS",
        "RESULT_CACHE_TTL_SECS",
        "MODEL_DIR",
        "DEMO_FALLBACK",
        "PRELOAD_MODELS",
        "MAX_TRACKED_MODELS",
    ] {
        println!("  {ENV_PREFIX}{key}");
    }
    Ok(())
}
