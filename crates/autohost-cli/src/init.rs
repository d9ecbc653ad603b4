use crate::style;
use anyhow::Result;
use autohost_utils::config;
use autohost_utils::paths::AutohostPaths;
use crossterm::style::Stylize;

pub fn run(paths: &AutohostPaths) -> Result<()> {
    let created = paths.ensure_layout()?;
    let wrote_config = config::write_default(paths)?;

    if created.is_empty() && !wrote_config {
        println!(
            "{} autohost is already initialized at {}",
            style::CHECK,
            paths.root().display().to_string().bold()
        );
        return Ok(());
    }

    println!(
        "{} Initialized autohost at {}",
        style::CHECK,
        paths.root().display().to_string().bold()
    );
    for dir in &created {
        println!("  {} {}", style::DOT, dir.display());
    }
    if wrote_config {
        println!("  {} {}", style::DOT, paths.config_file().display());
    }
    println!("\nRun `autohost setup` to provision this host.");

    Ok(())
}
