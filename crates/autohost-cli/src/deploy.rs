use crate::style;
use anyhow::{Context, Result};
use autohost_utils::docker;
use autohost_utils::fs::copy_dir_recursive;
use autohost_utils::paths::AutohostPaths;
use crossterm::style::Stylize;
use std::path::Path;

/// Copies `<from>/<template>` to `<root>/services/<template>` and starts it with compose.
pub fn run(paths: &AutohostPaths, template: &str, from: Option<&Path>) -> Result<()> {
    if template.is_empty() || template.contains(['/', '\\']) || template.starts_with('.') {
        anyhow::bail!("invalid template name `{template}`");
    }
    let source = from.unwrap_or_else(|| Path::new("templates")).join(template);
    if !source.is_dir() {
        anyhow::bail!("template {} does not exist", source.display());
    }

    println!("{} Deploying {}", style::PACKAGE, template.bold());
    let target = paths.services_dir().join(template);
    copy_dir_recursive(&source, &target)
        .with_context(|| format!("Failed to copy {} to {}", source.display(), target.display()))?;
    println!("  {} copied to {}", style::DOT, target.display());

    let compose = ["docker-compose.yml", "docker-compose.yaml", "compose.yml", "compose.yaml"]
        .iter()
        .map(|name| target.join(name))
        .find(|p| p.is_file())
        .with_context(|| format!("no compose file in {}", target.display()))?;
    docker::compose(&compose).args(["up", "-d"]).run()?;

    println!("{} Deployed {} from {}", style::ROCKET, template.bold(), target.display());
    Ok(())
}
