//! The CoreDNS container that answers for exposed zones, and its Corefile on disk.

use crate::docker::{self, ContainerState};
use crate::fs::{atomic_write, write_if_missing};
use crate::paths::AutohostPaths;
use crate::process::Cmd;
use crate::which::require;
use anyhow::{Context, Result};
use autohost_core::config::CoreDnsConfig;
use autohost_core::corefile::Corefile;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Ensures `fqdn` resolves to `address` in `zone`, persisting and calling `reload` only when
/// the Corefile actually changed.
///
/// # Errors
///
/// Fails without writing when the file cannot be read or the document cannot be patched.
pub fn apply_and_maybe_reload(
    path: &Path,
    zone: &str,
    fqdn: &str,
    address: &str,
    reload: impl FnOnce() -> Result<()>,
) -> Result<bool> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut doc = Corefile::new(text);

    let changed = doc
        .ensure_domain(zone, fqdn, address)
        .with_context(|| format!("Failed to update {}", path.display()))?;
    if !changed {
        debug!(zone, fqdn, "Corefile already up to date");
        return Ok(false);
    }

    atomic_write(path, doc.as_str())?;
    info!(zone, fqdn, address, "Corefile updated");
    reload()?;
    Ok(true)
}

pub struct CoreDns<'a> {
    corefile: PathBuf,
    config: &'a CoreDnsConfig,
}

impl<'a> CoreDns<'a> {
    pub fn new(paths: &AutohostPaths, config: &'a CoreDnsConfig) -> Self {
        Self {
            corefile: paths.corefile(),
            config,
        }
    }

    pub fn corefile(&self) -> &Path {
        &self.corefile
    }

    /// Writes the zone-less skeleton the first time. Returns whether it wrote.
    pub fn ensure_corefile(&self) -> Result<bool> {
        let wrote = write_if_missing(&self.corefile, Corefile::skeleton().as_str())?;
        if wrote {
            info!(path = %self.corefile.display(), "created Corefile");
        }
        Ok(wrote)
    }

    /// Creates the container if absent and starts it if stopped.
    pub fn ensure_container(&self) -> Result<ContainerState> {
        let name = &self.config.container_name;
        let state = docker::container_state(name)?;
        match state {
            ContainerState::Running => debug!(name, "CoreDNS container already running"),
            ContainerState::Stopped => {
                info!(name, "starting CoreDNS container");
                Cmd::new("docker").args(["start", name.as_str()]).run()?;
            }
            ContainerState::Missing => {
                info!(name, image = %self.config.image, "creating CoreDNS container");
                Cmd::new("docker")
                    .args(["run", "-d", "--name", name.as_str()])
                    .args(["--restart", "unless-stopped", "--network", "host"])
                    .arg("-v")
                    .arg(format!("{}:/Corefile:ro", self.corefile.display()))
                    .arg(self.config.image.as_str())
                    .args(["-conf", "/Corefile"])
                    .run()?;
            }
        }
        Ok(state)
    }

    /// Restarts the container so it re-reads the Corefile.
    pub fn reload(&self) -> Result<()> {
        let name = &self.config.container_name;
        require("docker")?;
        if docker::container_state(name)? == ContainerState::Missing {
            anyhow::bail!("CoreDNS container `{name}` does not exist");
        }
        info!(name, "restarting CoreDNS container");
        Cmd::new("docker").args(["restart", name.as_str()]).run()
    }

    pub fn ensure_domain(&self, zone: &str, fqdn: &str, address: &str) -> Result<bool> {
        apply_and_maybe_reload(&self.corefile, zone, fqdn, address, || self.reload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn skeleton_at(dir: &Path) -> PathBuf {
        let path = dir.join("Corefile");
        std::fs::write(&path, Corefile::skeleton().as_str()).unwrap();
        path
    }

    #[test]
    fn reloads_only_when_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = skeleton_at(dir.path());
        let reloads = Cell::new(0);
        let reload = || {
            reloads.set(reloads.get() + 1);
            Ok(())
        };

        assert!(
            apply_and_maybe_reload(&path, "maza-server", "app.maza-server", "100.64.0.5", reload)
                .unwrap()
        );
        let after_first = std::fs::read_to_string(&path).unwrap();
        assert!(after_first.contains("100.64.0.5 app.maza-server"));

        assert!(
            !apply_and_maybe_reload(&path, "maza-server", "app.maza-server", "100.64.0.5", reload)
                .unwrap()
        );
        assert_eq!(reloads.get(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), after_first);
    }

    #[test]
    fn missing_file_is_an_error_without_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Corefile");
        let result = apply_and_maybe_reload(&path, "z", "a.z", "10.0.0.1", || {
            panic!("reload must not run")
        });
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn malformed_document_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Corefile");
        std::fs::write(&path, "z:53 {\n    bind 10.0.0.1\n").unwrap();

        let err = apply_and_maybe_reload(&path, "z", "a.z", "10.0.0.1", || Ok(())).unwrap_err();
        assert!(format!("{err:#}").contains("no matching closing brace"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "z:53 {\n    bind 10.0.0.1\n"
        );
    }

    #[test]
    fn ensure_corefile_writes_skeleton_once() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AutohostPaths::new(dir.path());
        let config = CoreDnsConfig::default();
        let coredns = CoreDns::new(&paths, &config);

        assert!(coredns.ensure_corefile().unwrap());
        std::fs::write(coredns.corefile(), "# edited\n").unwrap();
        assert!(!coredns.ensure_corefile().unwrap());
        assert_eq!(
            std::fs::read_to_string(coredns.corefile()).unwrap(),
            "# edited\n"
        );
    }
}
