use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "autohost")]
#[command(about = "Provision a self-hosting box: Docker, Caddy, Tailscale, CoreDNS and Cloudflare Tunnel", long_about = None)]
pub struct Cli {
    /// Root directory for autohost state (default: $AUTOHOST_HOME or ~/.autohost)
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Show debug logs
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the autohost directory layout and default config
    Init,
    /// Provision this host step by step
    Setup {
        /// Accept every default without prompting
        #[arg(long, short)]
        yes: bool,
    },
    /// Check prerequisites
    Doctor {
        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what autohost has provisioned
    Status {
        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Docker engine
    Docker {
        #[command(subcommand)]
        command: DockerCommands,
    },
    /// Caddy reverse proxy
    Caddy {
        #[command(subcommand)]
        command: CaddyCommands,
    },
    /// Tailscale overlay network
    Tailscale {
        #[command(subcommand)]
        command: TailscaleCommands,
    },
    /// Cloudflare Tunnel
    Cloudflare {
        #[command(subcommand)]
        command: CloudflareCommands,
    },
    /// Route a public hostname through a Cloudflare tunnel to a local service
    SecureExpose {
        /// Public hostname (e.g. app.example.com)
        #[arg(long)]
        domain: String,
        /// Local service URL (e.g. http://localhost:3000)
        #[arg(long)]
        service: String,
        /// Tunnel to create or reuse
        #[arg(long, default_value = "autohost")]
        tunnel_name: String,
    },
    /// Make a local port reachable under a name
    ///
    /// With the tailscale provider the name is served by CoreDNS on this host's
    /// tailnet address and published to the tailnet as split DNS. A Caddy site
    /// proxying to the port is added unless --no-caddy is given.
    Expose {
        /// Fully-qualified name, e.g. app.maza-server
        #[arg(long)]
        subdomain: String,
        /// Local port the service listens on
        #[arg(long)]
        port: u16,
        #[arg(long, value_enum, default_value_t = Provider::Tailscale)]
        provider: Provider,
        /// Skip the Caddy site
        #[arg(long)]
        no_caddy: bool,
        /// Tailnet to configure (default: $TAILSCALE_TAILNET or the API key's tailnet)
        #[arg(long)]
        tailnet: Option<String>,
        /// Public hostname (cloudflare provider)
        #[arg(long)]
        domain: Option<String>,
        /// Local service URL (cloudflare provider)
        #[arg(long)]
        service: Option<String>,
        /// Tunnel name (cloudflare provider)
        #[arg(long)]
        tunnel_name: Option<String>,
    },
    /// CoreDNS zone records
    Dns {
        #[command(subcommand)]
        command: DnsCommands,
    },
    /// Templated applications
    App {
        #[command(subcommand)]
        command: AppCommands,
    },
    /// Copy a compose template into services/ and start it
    Deploy {
        /// Template name
        template: String,
        /// Directory holding the templates (default: ./templates)
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Continuous deployment
    Ci {
        #[command(subcommand)]
        command: CiCommands,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    Tailscale,
    Cloudflare,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the JSON schema of autohost.toml
    Schema,
}

#[derive(Subcommand)]
pub enum DockerCommands {
    /// Install the Docker engine
    Install {
        /// Also add the invoking user to the docker group
        #[arg(long)]
        add_group: bool,
    },
}

#[derive(Subcommand)]
pub enum CaddyCommands {
    /// Install Caddy from its apt repository
    Install,
    /// Add a reverse-proxy block to the autohost Caddyfile
    AddService {
        /// Service name, used as <name>.localhost when --host is omitted
        #[arg(long)]
        name: String,
        /// Local port to proxy to
        #[arg(long)]
        port: u16,
        /// Site address
        #[arg(long)]
        host: Option<String>,
    },
    /// Run Caddy in the foreground with the autohost Caddyfile
    Start,
}

#[derive(Subcommand)]
pub enum TailscaleCommands {
    /// Install Tailscale
    Install,
    /// Bring this node up on the tailnet
    Login,
    /// Log this node out
    Logout,
    /// Show tailnet status
    Status,
    /// Print this node's tailnet IPv4 address
    Ip,
    /// Configure split DNS for a domain through Terraform
    SplitDns {
        /// Domain to route, e.g. maza-server
        #[arg(long)]
        domain: String,
        /// Comma-separated nameserver addresses
        #[arg(long)]
        nameservers: String,
        /// Comma-separated search paths
        #[arg(long)]
        search_paths: Option<String>,
        /// Tailnet to configure
        #[arg(long)]
        tailnet: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CloudflareCommands {
    /// Install cloudflared
    Install,
    /// Authenticate cloudflared with Cloudflare
    Login,
    /// Create the autohost tunnel and route a domain to it
    Tunnel {
        /// Domain to route through the tunnel
        domain: String,
    },
}

#[derive(Subcommand)]
pub enum DnsCommands {
    /// List zones and records in the Corefile
    List,
    /// Map a name to an address and restart CoreDNS if anything changed
    Add {
        /// Fully-qualified name, e.g. app.maza-server
        fqdn: String,
        /// Address (default: this node's tailnet IPv4)
        #[arg(long)]
        addr: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AppCommands {
    /// List available templates
    List,
    /// Install an app from its template
    Install {
        name: String,
        /// Start the app after installing
        #[arg(long)]
        start: bool,
    },
    /// Start an installed app
    Start { name: String },
    /// Stop an installed app
    Stop { name: String },
    /// Stop and remove an app's containers
    Remove {
        name: String,
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Show whether an app is running
    Status { name: String },
}

#[derive(Subcommand)]
pub enum CiCommands {
    /// Write a GitHub Actions deploy workflow for a self-hosted runner
    Init {
        /// Branch that triggers deploys
        #[arg(long)]
        branch: Option<String>,
        /// Repository root (default: current directory)
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}
