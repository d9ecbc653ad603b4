//! The on-disk layout under the autohost root (`~/.autohost` by default).

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding the root directory.
pub const HOME_ENV: &str = "AUTOHOST_HOME";

/// Directories created by `autohost init`.
pub const LAYOUT: &[&str] = &[
    "config",
    "templates",
    "apps",
    "services",
    "logs",
    "state",
    "backups",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutohostPaths {
    root: PathBuf,
}

impl AutohostPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root from the `--home` flag, else `AUTOHOST_HOME`, else `~/.autohost`.
    pub fn resolve(flag: Option<PathBuf>) -> Result<Self> {
        if let Some(root) = flag {
            return Ok(Self::new(root));
        }
        if let Some(root) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(root));
        }
        let home = home_dir().context("Could not determine the home directory")?;
        Ok(Self::new(home.join(".autohost")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `autohost init` has run: the `state` directory exists.
    pub fn is_initialized(&self) -> bool {
        self.state_dir().is_dir()
    }

    /// Creates every layout directory, returning the ones that did not exist yet.
    pub fn ensure_layout(&self) -> Result<Vec<PathBuf>> {
        let mut created = Vec::new();
        for sub in LAYOUT {
            let dir = self.root.join(sub);
            if !dir.is_dir() {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
                created.push(dir);
            }
        }
        Ok(created)
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("autohost.toml")
    }

    pub fn tunnel_file(&self) -> PathBuf {
        self.config_dir().join("tunnel.json")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    pub fn apps_dir(&self) -> PathBuf {
        self.root.join("apps")
    }

    pub fn app_dir(&self, app: &str) -> PathBuf {
        self.apps_dir().join(app)
    }

    pub fn services_dir(&self) -> PathBuf {
        self.root.join("services")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join("state")
    }

    pub fn status_file(&self) -> PathBuf {
        self.state_dir().join("status.json")
    }

    /// Terraform workspace for one split-DNS domain of one tailnet.
    pub fn split_dns_workspace(&self, tailnet: &str, domain: &str) -> PathBuf {
        self.state_dir()
            .join("tailscale")
            .join(tailnet)
            .join(format!("split-dns-{}", domain.replace('.', "-")))
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn corefile(&self) -> PathBuf {
        self.root.join("coredns").join("Corefile")
    }

    pub fn caddy_dir(&self) -> PathBuf {
        self.root.join("caddy")
    }

    pub fn caddyfile(&self) -> PathBuf {
        self.caddy_dir().join("Caddyfile")
    }

    pub fn caddy_sites_dir(&self) -> PathBuf {
        self.caddy_dir().join("sites")
    }

    pub fn cloudflare_dir(&self) -> PathBuf {
        self.root.join("cloudflare")
    }
}

/// Returns the user's home directory.
pub fn home_dir() -> Option<PathBuf> {
    directories::UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// `~/.cloudflared`, where `cloudflared` keeps credentials and its config.
pub fn cloudflared_dir() -> Result<PathBuf> {
    Ok(home_dir()
        .context("Could not determine the home directory")?
        .join(".cloudflared"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_and_layout_is_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AutohostPaths::resolve(Some(dir.path().join("root"))).unwrap();
        assert!(!paths.is_initialized());

        let created = paths.ensure_layout().unwrap();
        assert_eq!(created.len(), LAYOUT.len());
        assert!(paths.is_initialized());
        assert!(paths.ensure_layout().unwrap().is_empty());
    }

    #[test]
    fn split_dns_workspace_dashes_the_domain() {
        let paths = AutohostPaths::new("/srv/autohost");
        assert_eq!(
            paths.split_dns_workspace("-", "home.lan"),
            PathBuf::from("/srv/autohost/state/tailscale/-/split-dns-home-lan")
        );
        assert_eq!(
            paths.corefile(),
            PathBuf::from("/srv/autohost/coredns/Corefile")
        );
    }
}
