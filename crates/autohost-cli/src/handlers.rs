use anyhow::Result;
use autohost_core::names::split_and_trim;
use autohost_core::template::SplitDnsPlan;
use autohost_utils::paths::AutohostPaths;
use autohost_utils::terraform::{SplitDns, SplitDnsRequest};
use autohost_utils::{Outcome, caddy, cloudflared, config, docker, tailscale};
use crossterm::style::Stylize;
use tracing::debug;

use crate::cli::{
    AppCommands, CaddyCommands, CiCommands, Cli, CloudflareCommands, Commands, ConfigCommands,
    DnsCommands, DockerCommands, Provider, TailscaleCommands,
};
use crate::expose::TailscaleExpose;
use crate::hints::require_initialized;
use crate::{app, ci, deploy, dns, doctor, expose, init, setup, status, style};

fn report(outcome: &Outcome) {
    let marker = match outcome {
        Outcome::Skipped(_) => style::WARN,
        Outcome::Changed(_) | Outcome::Unchanged(_) => style::CHECK,
    };
    println!("{marker} {}", outcome.message());
}

/// Dispatches a parsed command line. Returns the process exit code.
pub fn run(cli: Cli) -> Result<i32> {
    let paths = AutohostPaths::resolve(cli.home.clone())?;
    let config = config::load(&paths)?;
    debug!(root = %paths.root().display(), "resolved autohost root");

    match &cli.command {
        Commands::Init => init::run(&paths)?,
        Commands::Setup { yes } => setup::run(&paths, &config, *yes)?,
        Commands::Doctor { json } => return doctor::run(&paths, *json),
        Commands::Status { json } => status::run(&paths, *json)?,
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                println!("# {}", paths.config_file().display());
                print!("{}", config::render(&config)?);
            }
            ConfigCommands::Schema => {
                let schema = schemars::schema_for!(autohost_core::AutohostConfig);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
        },
        Commands::Docker { command } => match command {
            DockerCommands::Install { add_group } => {
                require_initialized(&paths)?;
                report(&docker::install(&config.installers.docker_script)?);
                if *add_group {
                    report(&docker::add_user_to_group()?);
                }
            }
        },
        Commands::Caddy { command } => match command {
            CaddyCommands::Install => {
                report(&caddy::install(&config.installers.caddy_repo)?);
            }
            CaddyCommands::AddService { name, port, host } => {
                require_initialized(&paths)?;
                let host = host.clone().unwrap_or_else(|| format!("{name}.localhost"));
                if caddy::add_service(&paths, &host, *port)? {
                    println!(
                        "{} {} -> 127.0.0.1:{port} added to {}",
                        style::CHECK,
                        host.as_str().bold(),
                        paths.caddyfile().display()
                    );
                } else {
                    println!("{} {host} is already in {}", style::CHECK, paths.caddyfile().display());
                }
            }
            CaddyCommands::Start => {
                require_initialized(&paths)?;
                caddy::run_foreground(&paths)?;
            }
        },
        Commands::Tailscale { command } => match command {
            TailscaleCommands::Install => {
                report(&tailscale::install(&config.installers.tailscale_script)?);
            }
            TailscaleCommands::Login => tailscale::login()?,
            TailscaleCommands::Logout => tailscale::logout()?,
            TailscaleCommands::Status => tailscale::status()?,
            TailscaleCommands::Ip => println!("{}", tailscale::ipv4()?),
            TailscaleCommands::SplitDns {
                domain,
                nameservers,
                search_paths,
                tailnet,
            } => {
                require_initialized(&paths)?;
                let workspace = SplitDns::new(&paths, &config).apply(&SplitDnsRequest {
                    tailnet: tailnet.clone(),
                    plan: SplitDnsPlan {
                        domain: domain.trim().to_string(),
                        nameservers: split_and_trim(nameservers),
                        search_paths: search_paths
                            .as_deref()
                            .map(split_and_trim)
                            .unwrap_or_default(),
                    },
                })?;
                println!(
                    "{} Split DNS for {} applied ({})",
                    style::CHECK,
                    domain.as_str().bold(),
                    workspace.display()
                );
            }
        },
        Commands::Cloudflare { command } => match command {
            CloudflareCommands::Install => {
                report(&cloudflared::install(&config.installers.cloudflared_binary)?);
            }
            CloudflareCommands::Login => cloudflared::login()?,
            CloudflareCommands::Tunnel { domain } => {
                require_initialized(&paths)?;
                cloudflared::setup_tunnel(&paths, domain)?;
                println!(
                    "{} {} is routed through tunnel {}",
                    style::ROCKET,
                    domain.as_str().bold(),
                    cloudflared::DEFAULT_TUNNEL
                );
            }
        },
        Commands::SecureExpose {
            domain,
            service,
            tunnel_name,
        } => {
            require_initialized(&paths)?;
            expose::secure_expose(tunnel_name, domain, service)?;
        }
        Commands::Expose {
            subdomain,
            port,
            provider,
            no_caddy,
            tailnet,
            domain,
            service,
            tunnel_name,
        } => {
            require_initialized(&paths)?;
            match provider {
                Provider::Tailscale => expose::via_tailscale(
                    &paths,
                    &config,
                    &TailscaleExpose {
                        fqdn: subdomain,
                        port: *port,
                        caddy: !no_caddy,
                        tailnet: tailnet.clone(),
                    },
                )?,
                Provider::Cloudflare => expose::via_cloudflare(
                    domain.as_deref(),
                    service.as_deref(),
                    tunnel_name.as_deref(),
                )?,
            }
        }
        Commands::Dns { command } => match command {
            DnsCommands::List => dns::list(&paths)?,
            DnsCommands::Add { fqdn, addr } => {
                require_initialized(&paths)?;
                dns::add(&paths, &config, fqdn, addr.as_deref())?;
            }
        },
        Commands::App { command } => {
            if !matches!(command, AppCommands::List) {
                require_initialized(&paths)?;
            }
            match command {
                AppCommands::List => app::list(&paths)?,
                AppCommands::Install { name, start } => app::install(&paths, name, *start)?,
                AppCommands::Start { name } => app::start(&paths, name)?,
                AppCommands::Stop { name } => app::stop(&paths, name)?,
                AppCommands::Remove { name, yes } => app::remove(&paths, name, *yes)?,
                AppCommands::Status { name } => app::status(&paths, name)?,
            }
        }
        Commands::Deploy { template, from } => {
            require_initialized(&paths)?;
            deploy::run(&paths, template, from.as_deref())?;
        }
        Commands::Ci { command } => match command {
            CiCommands::Init { branch, dir } => ci::init(dir, branch.as_deref())?,
        },
    }

    Ok(0)
}
