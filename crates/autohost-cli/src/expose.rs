use crate::style;
use anyhow::{Context, Result};
use autohost_core::AutohostConfig;
use autohost_core::names::split_host_zone;
use autohost_core::template::SplitDnsPlan;
use autohost_utils::caddy;
use autohost_utils::cloudflared;
use autohost_utils::coredns::CoreDns;
use autohost_utils::paths::AutohostPaths;
use autohost_utils::tailscale;
use autohost_utils::terraform::{SplitDns, SplitDnsRequest};
use crossterm::style::Stylize;
use std::path::Path;

pub struct TailscaleExpose<'a> {
    pub fqdn: &'a str,
    pub port: u16,
    pub caddy: bool,
    pub tailnet: Option<String>,
}

/// Serves `fqdn` from this host's CoreDNS on its tailnet address and publishes the zone to
/// the tailnet as split DNS.
pub fn via_tailscale(
    paths: &AutohostPaths,
    config: &AutohostConfig,
    request: &TailscaleExpose<'_>,
) -> Result<()> {
    let fqdn = request.fqdn.trim();
    println!("{} Provider: Tailscale (split DNS + CoreDNS)", style::PACKAGE);

    let ip = tailscale::ipv4().context("Could not read this node's tailnet address; is it logged in?")?;
    println!("  {} tailnet address: {}", style::DOT, ip.as_str().bold());

    let Some((host, zone)) = split_host_zone(fqdn) else {
        anyhow::bail!("invalid subdomain `{fqdn}`: expected host.zone, e.g. app.maza-server");
    };
    println!("  {} zone: {zone} | host: {host}", style::DOT);

    let coredns = CoreDns::new(paths, &config.coredns);
    coredns.ensure_corefile()?;
    coredns.ensure_container().context("CoreDNS container")?;
    let changed = coredns
        .ensure_domain(zone, fqdn, &ip)
        .context("CoreDNS update")?;
    if changed {
        println!("{} CoreDNS updated and restarted", style::CHECK);
    } else {
        println!("{} CoreDNS already serves {fqdn}", style::CHECK);
    }

    println!("{} Applying split DNS with Terraform...", style::PACKAGE);
    SplitDns::new(paths, config).apply(&SplitDnsRequest {
        tailnet: request.tailnet.clone(),
        plan: SplitDnsPlan {
            domain: zone.to_string(),
            nameservers: vec![ip.clone()],
            search_paths: vec![zone.to_string()],
        },
    })?;
    println!("{} Split DNS applied to the tailnet", style::CHECK);

    if request.caddy {
        match caddy::expose_site(paths, Path::new(&config.caddy.master_file), fqdn, request.port) {
            Ok(site) => println!("{} Caddy site {} written and reloaded", style::CHECK, site.display()),
            Err(e) => println!("{} Could not configure Caddy: {e:#}", style::WARN),
        }
    } else {
        println!("{} Skipped Caddy (--no-caddy)", style::DOT);
    }

    println!(
        "\n{} {} resolves to {} on your tailnet{}",
        style::ROCKET,
        fqdn.bold(),
        ip,
        if request.caddy {
            format!(" and proxies to localhost:{}", request.port)
        } else {
            String::new()
        }
    );
    println!("   Corefile: {}", coredns.corefile().display());
    Ok(())
}

pub fn via_cloudflare(
    domain: Option<&str>,
    service: Option<&str>,
    tunnel_name: Option<&str>,
) -> Result<()> {
    let (Some(domain), Some(service), Some(tunnel)) = (domain, service, tunnel_name) else {
        anyhow::bail!("the cloudflare provider needs --domain, --service and --tunnel-name");
    };
    secure_expose(tunnel, domain, service)
}

pub fn secure_expose(tunnel: &str, domain: &str, service: &str) -> Result<()> {
    let config = cloudflared::secure_expose(tunnel, domain, service)?;
    println!(
        "{} {} is routed through tunnel {} to {service}",
        style::ROCKET,
        domain.bold(),
        tunnel.bold()
    );
    println!("   Config: {}", config.display());
    println!("   Run `cloudflared tunnel run {tunnel}` to serve it.");
    Ok(())
}
