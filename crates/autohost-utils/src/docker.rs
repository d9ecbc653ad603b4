//! Docker engine installation and container inspection.

use crate::Outcome;
use crate::process::Cmd;
use crate::which::{require, which};
use anyhow::{Context, Result};
use autohost_core::os_release::OsRelease;
use std::path::Path;
use tracing::{info, warn};

const OS_RELEASE: &str = "/etc/os-release";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Missing,
    Stopped,
    Running,
}

pub fn is_installed() -> bool {
    which("docker").is_some()
}

/// The CLI is installed and the daemon answers.
pub fn daemon_available() -> bool {
    Cmd::new("docker").arg("version").succeeds()
}

/// Running inside a container, where installing an engine makes no sense.
pub fn in_container() -> bool {
    Path::new("/.dockerenv").exists()
        || std::env::var("AUTOHOST_IN_CONTAINER").is_ok_and(|v| v == "true")
}

pub fn container_state(name: &str) -> Result<ContainerState> {
    require("docker")?;
    match Cmd::new("docker")
        .args(["inspect", "-f", "{{.State.Running}}", name])
        .output()
    {
        Ok(out) if out == "true" => Ok(ContainerState::Running),
        Ok(_) => Ok(ContainerState::Stopped),
        Err(_) => Ok(ContainerState::Missing),
    }
}

/// Installs the engine with the official convenience script and enables the daemon.
pub fn install(script_url: &str) -> Result<Outcome> {
    if in_container() {
        return Ok(Outcome::Skipped(
            "running inside a container; use the host's Docker socket instead".into(),
        ));
    }
    if daemon_available() {
        return Ok(Outcome::Unchanged("Docker is already installed".into()));
    }

    ensure_curl()?;

    info!(url = script_url, "installing Docker");
    Cmd::shell(format!(
        "set -e\ntmp=\"$(mktemp)\"\ncurl -fsSL {script_url} -o \"$tmp\"\nsh \"$tmp\"\nrm -f \"$tmp\"\n"
    ))
    .run()
    .context("Docker install script failed")?;

    let enable = if which("systemctl").is_some() {
        Cmd::sudo("systemctl").args(["enable", "--now", "docker"])
    } else {
        Cmd::sudo("service").args(["docker", "start"])
    };
    if let Err(e) = enable.run() {
        warn!("Failed to start the Docker daemon: {e:#}");
    }

    Cmd::new("docker")
        .arg("--version")
        .output()
        .context("Docker CLI is not available after installation")?;

    if Cmd::new("docker").arg("info").succeeds() {
        Ok(Outcome::Changed("Docker installed and running".into()))
    } else {
        Ok(Outcome::Changed(
            "Docker installed, but the daemon is not responding yet".into(),
        ))
    }
}

fn ensure_curl() -> Result<()> {
    if which("curl").is_some() {
        return Ok(());
    }
    let release = std::fs::read_to_string(OS_RELEASE)
        .map(|s| OsRelease::parse(&s))
        .unwrap_or_default();
    let Some(script) = release.family().curl_install_script() else {
        require("curl")?;
        return Ok(());
    };
    info!(distro = %release.id, "installing curl");
    Cmd::shell(script).run().context("Failed to install curl")
}

/// User who should join the `docker` group: `SUDO_USER`, else the current non-root user.
pub fn target_user() -> Option<String> {
    let candidate = std::env::var("SUDO_USER")
        .ok()
        .filter(|u| !u.is_empty())
        .or_else(|| {
            let uid = nix::unistd::getuid();
            if uid.is_root() {
                return None;
            }
            nix::unistd::User::from_uid(uid).ok().flatten().map(|u| u.name)
        })?;
    (candidate != "root").then_some(candidate)
}

pub fn add_user_to_group() -> Result<Outcome> {
    if in_container() {
        return Ok(Outcome::Skipped(
            "group membership is not changed inside containers".into(),
        ));
    }
    let Some(user) = target_user() else {
        return Ok(Outcome::Skipped(
            "no non-root user to add to the docker group".into(),
        ));
    };

    if let Err(e) =
        Cmd::shell("getent group docker >/dev/null 2>&1 || sudo groupadd docker").run()
    {
        warn!("Could not verify the docker group: {e:#}");
    }
    Cmd::sudo("usermod")
        .args(["-aG", "docker", user.as_str()])
        .run()
        .with_context(|| format!("Failed to add {user} to the docker group"))?;

    Ok(Outcome::Changed(format!(
        "added {user} to the docker group; log out and back in to apply"
    )))
}

/// `docker compose -f <file> <args..>` run from the compose file's directory.
pub fn compose(file: &Path) -> Cmd {
    let dir = file.parent().unwrap_or_else(|| Path::new("."));
    Cmd::new("docker")
        .arg("compose")
        .arg("-f")
        .arg(file.display().to_string())
        .current_dir(dir)
}
