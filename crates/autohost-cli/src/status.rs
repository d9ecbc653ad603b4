use crate::{hints, style};
use anyhow::Result;
use autohost_utils::docker;
use autohost_utils::paths::AutohostPaths;
use autohost_utils::state::StatusStore;
use crossterm::style::Stylize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct Summary {
    pub initialized: bool,
    pub docker: bool,
    pub cloudflare_tunnel: bool,
    pub cloudflare_domain: Option<String>,
    pub root: PathBuf,
    pub config: PathBuf,
}

pub fn collect(paths: &AutohostPaths) -> Summary {
    let status = StatusStore::new(paths.status_file()).load();
    Summary {
        initialized: paths.is_initialized(),
        docker: docker::is_installed(),
        cloudflare_tunnel: status.cloudflare_tunnel,
        cloudflare_domain: status.cloudflare_domain.filter(|d| !d.is_empty()),
        root: paths.root().to_path_buf(),
        config: paths.config_file(),
    }
}

pub fn run(paths: &AutohostPaths, json: bool) -> Result<()> {
    let summary = collect(paths);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if !summary.initialized {
        println!(
            "{} autohost is not initialized; run `{}`.",
            style::WARN,
            hints::init_command(paths)
        );
        return Ok(());
    }

    println!("{} {}\n", style::PACKAGE, "autohost status".bold());
    if summary.docker {
        println!("{} Docker installed", style::CHECK);
    } else {
        println!("{} Docker is not available", style::CROSS);
    }
    if summary.cloudflare_tunnel {
        println!("{} Cloudflare Tunnel configured", style::CHECK);
    } else {
        println!("{} Cloudflare Tunnel not configured", style::CROSS);
    }
    match &summary.cloudflare_domain {
        Some(domain) => println!("{} Linked domain: {}", style::DOT, domain.as_str().bold()),
        None => println!("{} No domain linked yet", style::DOT),
    }

    println!("\nRoot:   {}", summary.root.display());
    println!("Config: {}", summary.config.display());
    Ok(())
}
