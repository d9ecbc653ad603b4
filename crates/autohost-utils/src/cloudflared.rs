//! Cloudflare Tunnel through the `cloudflared` CLI.

use crate::Outcome;
use crate::fs::atomic_write;
use crate::paths::{AutohostPaths, cloudflared_dir};
use crate::process::Cmd;
use crate::state::{StatusStore, TunnelRecord, write_json};
use crate::which::{require, which};
use anyhow::{Context, Result};
use autohost_core::template::cloudflared_config;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Tunnel created by `autohost cloudflare tunnel`.
pub const DEFAULT_TUNNEL: &str = "autohost-tunnel";

pub fn is_installed() -> bool {
    which("cloudflared").is_some()
}

pub fn install(binary_url: &str) -> Result<Outcome> {
    if is_installed() {
        return Ok(Outcome::Unchanged("cloudflared is already installed".into()));
    }
    Cmd::shell(format!(
        "set -e\ntmp=\"$(mktemp)\"\ncurl -fsSL {binary_url} -o \"$tmp\"\nchmod +x \"$tmp\"\nsudo mv \"$tmp\" /usr/local/bin/cloudflared\n"
    ))
    .run()
    .context("cloudflared installation failed")?;
    Ok(Outcome::Changed(
        "cloudflared installed; run `autohost cloudflare login` next".into(),
    ))
}

pub fn login() -> Result<()> {
    require("cloudflared")?;
    Cmd::new("cloudflared").args(["tunnel", "login"]).run()
}

pub fn credentials_path(dir: &Path, tunnel: &str) -> PathBuf {
    dir.join(format!("{tunnel}.json"))
}

/// Creates the tunnel unless its credentials file already exists.
pub fn ensure_tunnel(dir: &Path, tunnel: &str) -> Result<bool> {
    require("cloudflared")?;
    if credentials_path(dir, tunnel).is_file() {
        return Ok(false);
    }
    info!(tunnel, "creating Cloudflare tunnel");
    Cmd::new("cloudflared")
        .args(["tunnel", "create", tunnel])
        .run()
        .with_context(|| format!("Failed to create tunnel {tunnel}"))?;
    Ok(true)
}

pub fn route_dns(tunnel: &str, hostname: &str) -> Result<()> {
    Cmd::new("cloudflared")
        .args(["tunnel", "route", "dns", tunnel, hostname])
        .run()
        .with_context(|| format!("Failed to route {hostname} to tunnel {tunnel}"))
}

/// `autohost cloudflare tunnel <domain>`: tunnel, credentials backup, DNS route and state.
pub fn setup_tunnel(paths: &AutohostPaths, domain: &str) -> Result<()> {
    let dir = cloudflared_dir()?;
    ensure_tunnel(&dir, DEFAULT_TUNNEL)?;

    let credentials = credentials_path(&dir, DEFAULT_TUNNEL);
    let backup = paths
        .cloudflare_dir()
        .join(format!("{DEFAULT_TUNNEL}.json"));
    let copied = std::fs::read(&credentials)
        .with_context(|| format!("Failed to read {}", credentials.display()))
        .and_then(|bytes| atomic_write(&backup, bytes));
    if let Err(e) = copied {
        warn!("Could not back up tunnel credentials: {e:#}");
    }

    route_dns(DEFAULT_TUNNEL, domain)?;

    write_json(
        &paths.tunnel_file(),
        &TunnelRecord {
            tunnel: DEFAULT_TUNNEL.to_string(),
            domain: domain.to_string(),
        },
    )?;
    StatusStore::new(paths.status_file()).update(|status| {
        status.cloudflare_tunnel = true;
        status.cloudflare_domain = Some(domain.to_string());
    })?;
    Ok(())
}

/// `autohost secure-expose`: one hostname routed through a named tunnel to a local service.
/// Returns the written `config.yml`.
pub fn secure_expose(tunnel: &str, hostname: &str, service: &str) -> Result<PathBuf> {
    let dir = cloudflared_dir()?;
    ensure_tunnel(&dir, tunnel)?;

    let config_path = dir.join("config.yml");
    atomic_write(
        &config_path,
        cloudflared_config(tunnel, &credentials_path(&dir, tunnel), hostname, service),
    )?;
    route_dns(tunnel, hostname)?;
    Ok(config_path)
}
