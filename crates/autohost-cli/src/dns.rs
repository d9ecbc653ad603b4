use crate::style;
use anyhow::{Context, Result};
use autohost_core::AutohostConfig;
use autohost_core::Corefile;
use autohost_core::names::split_host_zone;
use autohost_utils::coredns::CoreDns;
use autohost_utils::paths::AutohostPaths;
use autohost_utils::tailscale;
use crossterm::style::Stylize;

pub fn list(paths: &AutohostPaths) -> Result<()> {
    let path = paths.corefile();
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("No Corefile yet at {}", path.display());
            return Ok(());
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    let doc = Corefile::new(text);
    let zones = doc.zones();
    if zones.is_empty() {
        println!("No zones in {}", path.display());
        return Ok(());
    }

    for zone in zones {
        println!("{}", zone.as_str().bold());
        let mappings = doc
            .mappings(&zone)
            .with_context(|| format!("Failed to read zone {zone}"))?;
        if mappings.is_empty() {
            println!("  (no records)");
        }
        for mapping in mappings {
            println!("  {} {} -> {}", style::DOT, mapping.name, mapping.address);
        }
    }
    Ok(())
}

pub fn add(
    paths: &AutohostPaths,
    config: &AutohostConfig,
    fqdn: &str,
    addr: Option<&str>,
) -> Result<()> {
    let fqdn = fqdn.trim();
    let Some((_, zone)) = split_host_zone(fqdn) else {
        anyhow::bail!("invalid name `{fqdn}`: expected host.zone, e.g. app.maza-server");
    };
    let addr = match addr {
        Some(addr) => addr.to_string(),
        None => tailscale::ipv4()?,
    };

    let coredns = CoreDns::new(paths, &config.coredns);
    coredns.ensure_corefile()?;
    if coredns.ensure_domain(zone, fqdn, &addr)? {
        println!("{} {fqdn} -> {addr} (CoreDNS restarted)", style::CHECK);
    } else {
        println!("{} {fqdn} -> {addr} already present", style::CHECK);
    }
    Ok(())
}
