//! Configuration file discovery and serialization.

use std::path::{Path, PathBuf};

use super::{Config, ConfigError};

/// File looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "mcp-gateways.toml";

/// Locate a configuration file: the working directory first, then the
/// platform config directory (`<config_dir>/mcp-gateways/config.toml`).
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("mcp-gateways").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Render the configuration as TOML
pub fn to_toml(config: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Write the configuration to `path`, creating parent directories
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_toml(config)?)?;
    Ok(())
}
