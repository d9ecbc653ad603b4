use crate::fs::write_if_missing;
use crate::paths::AutohostPaths;
use anyhow::{Context, Result};
use autohost_core::config::AutohostConfig;
use tracing::debug;

/// Loads `<root>/config/autohost.toml`, falling back to defaults when it does not exist.
pub fn load(paths: &AutohostPaths) -> Result<AutohostConfig> {
    let path = paths.config_file();
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(AutohostConfig::default());
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn render(config: &AutohostConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config")
}

/// Writes the default config unless the file already exists. Returns whether it wrote.
pub fn write_default(paths: &AutohostPaths) -> Result<bool> {
    let content = format!(
        "# autohost configuration. Every key is optional.\n\n{}",
        render(&AutohostConfig::default())?
    );
    write_if_missing(paths.config_file(), content)
}
