//! Loads [`BotConfig`] from an optional TOML file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colony::BotConfig;

/// Defaults when `path` is `None`; otherwise the parsed and validated file.
pub fn load(path: Option<&Path>) -> Result<BotConfig> {
    let Some(path) = path else {
        return Ok(BotConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: BotConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    config.validate().with_context(|| format!("invalid config in {}", path.display()))?;
    Ok(config)
}
