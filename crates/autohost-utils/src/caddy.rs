//! Caddy reverse proxy: installation, the autohost-owned Caddyfile, and per-host site files.

use crate::Outcome;
use crate::fs::{atomic_write, ensure_line_in_file, write_if_missing};
use crate::paths::AutohostPaths;
use crate::process::Cmd;
use crate::which::{require, which};
use anyhow::{Context, Result};
use autohost_core::names::safe_name;
use autohost_core::template::{
    CADDYFILE_HEADER, caddy_import_line, caddy_service_block, caddy_site,
};
use std::path::{Path, PathBuf};
use tracing::info;

pub fn is_installed() -> bool {
    which("caddy").is_some()
}

/// Installs Caddy from its apt repository and enables the system service.
pub fn install(repo: &str) -> Result<Outcome> {
    if is_installed() {
        return Ok(Outcome::Unchanged("Caddy is already installed".into()));
    }
    let repo = repo.trim_end_matches('/');
    Cmd::shell(format!(
        "sudo apt install -y debian-keyring debian-archive-keyring apt-transport-https curl && \
         curl -1sLf '{repo}/gpg.key' | sudo gpg --dearmor -o /usr/share/keyrings/caddy-stable-archive-keyring.gpg && \
         curl -1sLf '{repo}/debian.deb.txt' | sudo tee /etc/apt/sources.list.d/caddy-stable.list && \
         sudo apt update && sudo apt install -y caddy"
    ))
    .run()
    .context("Caddy installation failed")?;

    Cmd::sudo("systemctl").args(["enable", "caddy"]).run()?;
    Cmd::sudo("systemctl").args(["start", "caddy"]).run()?;
    Ok(Outcome::Changed("Caddy installed and running".into()))
}

/// Creates `<root>/caddy/Caddyfile` with a commented header if missing.
pub fn ensure_caddyfile(paths: &AutohostPaths) -> Result<PathBuf> {
    let path = paths.caddyfile();
    write_if_missing(&path, CADDYFILE_HEADER)?;
    Ok(path)
}

/// Appends a reverse-proxy block for `host` unless the Caddyfile already mentions it.
pub fn add_service(paths: &AutohostPaths, host: &str, port: u16) -> Result<bool> {
    let path = ensure_caddyfile(paths)?;
    let mut content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if declares_site(&content, host) {
        return Ok(false);
    }
    content.push_str(&caddy_service_block(host, port));
    atomic_write(&path, content)?;
    Ok(true)
}

fn declares_site(caddyfile: &str, host: &str) -> bool {
    caddyfile.lines().any(|line| {
        let trimmed = line.trim();
        !trimmed.starts_with('#')
            && trimmed
                .trim_end_matches('{')
                .split([',', ' '])
                .any(|addr| addr.trim() == host)
    })
}

/// Runs Caddy in the foreground with the autohost Caddyfile.
pub fn run_foreground(paths: &AutohostPaths) -> Result<()> {
    require("caddy")?;
    let path = ensure_caddyfile(paths)?;
    Cmd::new("caddy")
        .args(["run", "--config"])
        .arg(path.display().to_string())
        .run()
}

/// Writes `<root>/caddy/sites/<safe fqdn>.caddy`.
pub fn write_site(paths: &AutohostPaths, fqdn: &str, port: u16) -> Result<PathBuf> {
    let path = paths
        .caddy_sites_dir()
        .join(format!("{}.caddy", safe_name(fqdn)));
    atomic_write(&path, caddy_site(fqdn, port))?;
    Ok(path)
}

/// Makes the master Caddyfile import every generated site. Returns whether it changed.
pub fn ensure_import(master_file: &Path, sites_dir: &Path) -> Result<bool> {
    ensure_line_in_file(master_file, &caddy_import_line(sites_dir))
}

pub fn reload() -> Result<()> {
    Cmd::sudo("systemctl").args(["reload", "caddy"]).run()
}

/// Site file, import line and reload for one exposed host.
pub fn expose_site(
    paths: &AutohostPaths,
    master_file: &Path,
    fqdn: &str,
    port: u16,
) -> Result<PathBuf> {
    require("caddy")?;
    let site = write_site(paths, fqdn, port)?;
    if ensure_import(master_file, &paths.caddy_sites_dir())? {
        info!(file = %master_file.display(), "added autohost import to Caddyfile");
    }
    reload()?;
    Ok(site)
}
