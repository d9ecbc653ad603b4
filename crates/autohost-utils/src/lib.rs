//! Side-effecting building blocks for autohost: files, processes and the tools it drives.

/// Templated application stacks.
pub mod apps;
/// Caddy installation and site files.
pub mod caddy;
/// Cloudflare Tunnel.
pub mod cloudflared;
/// Config file loading.
pub mod config;
/// The CoreDNS container and its Corefile.
pub mod coredns;
/// Docker engine and containers.
pub mod docker;
/// Filesystem utilities.
pub mod fs;
/// Root directory layout.
pub mod paths;
/// External process execution.
pub mod process;
/// Persistent JSON state.
pub mod state;
/// Tailscale CLI.
pub mod tailscale;
/// Split DNS via Terraform.
pub mod terraform;
/// PATH lookup.
pub mod which;

/// Result of an idempotent provisioning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Changed(String),
    Unchanged(String),
    Skipped(String),
}

impl Outcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Changed(m) | Self::Unchanged(m) | Self::Skipped(m) => m,
        }
    }
}
