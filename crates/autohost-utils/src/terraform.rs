//! Tailscale split DNS, reconciled by Terraform with the `tailscale/tailscale` provider.

use crate::fs::{atomic_write, set_mode};
use crate::paths::AutohostPaths;
use crate::process::Cmd;
use crate::which::{require, which};
use anyhow::{Context, Result};
use autohost_core::config::AutohostConfig;
use autohost_core::template::{SplitDnsPlan, TERRAFORM_GITIGNORE, terraform_main_tf};
use std::path::PathBuf;
use tracing::info;

pub const TAILNET_ENV: &str = "TAILSCALE_TAILNET";

#[derive(Debug, Clone)]
pub struct SplitDnsRequest {
    pub tailnet: Option<String>,
    pub plan: SplitDnsPlan,
}

pub struct SplitDns<'a> {
    paths: &'a AutohostPaths,
    config: &'a AutohostConfig,
}

impl<'a> SplitDns<'a> {
    pub fn new(paths: &'a AutohostPaths, config: &'a AutohostConfig) -> Self {
        Self { paths, config }
    }

    /// Renders the workspace and runs `terraform init` + `apply`. Returns the workspace.
    pub fn apply(&self, request: &SplitDnsRequest) -> Result<PathBuf> {
        let plan = &request.plan;
        if plan.domain.trim().is_empty() || plan.nameservers.is_empty() {
            anyhow::bail!("a domain and at least one nameserver are required");
        }

        let key_env = &self.config.tailscale.api_key_env;
        if !std::env::var(key_env).is_ok_and(|v| !v.trim().is_empty()) {
            anyhow::bail!("{key_env} is not set; export a Tailscale API key first");
        }

        let tailnet = resolve_tailnet(
            request.tailnet.as_deref(),
            std::env::var(TAILNET_ENV).ok().as_deref(),
            &self.config.tailscale.default_tailnet,
        );

        let terraform = self.ensure_terraform()?;
        let workspace = self.paths.split_dns_workspace(&tailnet, &plan.domain);
        std::fs::create_dir_all(&workspace)
            .with_context(|| format!("Failed to create {}", workspace.display()))?;
        atomic_write(workspace.join(".gitignore"), TERRAFORM_GITIGNORE)?;
        atomic_write(
            workspace.join("main.tf"),
            terraform_main_tf(plan, &self.config.terraform.provider_version),
        )?;

        info!(domain = %plan.domain, tailnet = %tailnet, "applying split DNS");
        let terraform = terraform.display().to_string();
        Cmd::new(terraform.as_str())
            .args(["init", "-upgrade"])
            .current_dir(&workspace)
            .env(TAILNET_ENV, tailnet.as_str())
            .run()
            .context("terraform init failed")?;
        Cmd::new(terraform.as_str())
            .args(["apply", "-auto-approve"])
            .current_dir(&workspace)
            .env(TAILNET_ENV, tailnet.as_str())
            .run()
            .context("terraform apply failed")?;

        Ok(workspace)
    }

    /// `terraform` from PATH, else `<root>/bin/terraform`, else downloaded there.
    pub fn ensure_terraform(&self) -> Result<PathBuf> {
        if let Some(path) = which("terraform") {
            return Ok(path);
        }
        let bin_dir = self.paths.bin_dir();
        let local = bin_dir.join("terraform");
        if local.is_file() {
            return Ok(local);
        }

        let tf = &self.config.terraform;
        let url = download_url(
            &tf.download_base,
            &tf.version,
            std::env::consts::OS,
            std::env::consts::ARCH,
        )?;
        require("curl")?;
        require("unzip")?;
        std::fs::create_dir_all(&bin_dir)
            .with_context(|| format!("Failed to create {}", bin_dir.display()))?;

        info!(%url, "downloading Terraform");
        let archive = bin_dir.join("terraform.zip");
        let archive_str = archive.display().to_string();
        Cmd::new("curl")
            .args(["-fsSL", url.as_str(), "-o", archive_str.as_str()])
            .run()
            .context("Terraform download failed")?;
        let unzip = Cmd::new("unzip")
            .args(["-o", "-q", archive_str.as_str(), "terraform", "-d"])
            .arg(bin_dir.display().to_string())
            .run();
        let _ = std::fs::remove_file(&archive);
        unzip.context("Failed to unpack Terraform")?;

        set_mode(&local, 0o755)?;
        Ok(local)
    }
}

/// Flag, else environment, else the configured default (`-`, the key's own tailnet).
pub fn resolve_tailnet(flag: Option<&str>, env: Option<&str>, default: &str) -> String {
    [flag, env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Release archive URL for the given Rust target OS and architecture.
pub fn download_url(base: &str, version: &str, os: &str, arch: &str) -> Result<String> {
    let os = match os {
        "linux" => "linux",
        "macos" => "darwin",
        "windows" => "windows",
        other => anyhow::bail!("unsupported operating system for Terraform: {other}"),
    };
    let arch = match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => anyhow::bail!("unsupported architecture for Terraform: {os}/{other}"),
    };
    let base = base.trim_end_matches('/');
    Ok(format!(
        "{base}/{version}/terraform_{version}_{os}_{arch}.zip"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tailnet_precedence() {
        assert_eq!(resolve_tailnet(Some("org.ts.net"), Some("env"), "-"), "org.ts.net");
        assert_eq!(resolve_tailnet(Some(" "), Some("env.ts.net"), "-"), "env.ts.net");
        assert_eq!(resolve_tailnet(None, None, "-"), "-");
    }

    #[test]
    fn download_url_maps_targets() {
        assert_eq!(
            download_url("https://releases.hashicorp.com/terraform/", "1.9.8", "macos", "aarch64")
                .unwrap(),
            "https://releases.hashicorp.com/terraform/1.9.8/terraform_1.9.8_darwin_arm64.zip"
        );
        assert_eq!(
            download_url("https://r", "1.9.8", "linux", "x86_64").unwrap(),
            "https://r/1.9.8/terraform_1.9.8_linux_amd64.zip"
        );
        assert!(download_url("https://r", "1.9.8", "linux", "riscv64").is_err());
        assert!(download_url("https://r", "1.9.8", "freebsd", "x86_64").is_err());
    }

    #[test]
    fn missing_inputs_fail_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AutohostPaths::new(dir.path());
        let config = AutohostConfig::default();
        let request = SplitDnsRequest {
            tailnet: None,
            plan: SplitDnsPlan {
                domain: "maza-server".into(),
                nameservers: vec![],
                search_paths: vec![],
            },
        };
        assert!(SplitDns::new(&paths, &config).apply(&request).is_err());
        assert!(!paths.state_dir().exists());
    }
}
