use crate::Outcome;
use crate::process::Cmd;
use crate::which::{require, which};
use anyhow::{Context, Result};

pub fn is_installed() -> bool {
    which("tailscale").is_some()
}

pub fn install(script_url: &str) -> Result<Outcome> {
    if is_installed() {
        return Ok(Outcome::Unchanged("Tailscale is already installed".into()));
    }
    Cmd::shell(format!("curl -fsSL {script_url} | sh"))
        .run()
        .context("Tailscale install script failed")?;
    Ok(Outcome::Changed(
        "Tailscale installed; run `autohost tailscale login` next".into(),
    ))
}

pub fn login() -> Result<()> {
    require("tailscale")?;
    Cmd::sudo("tailscale").arg("up").run()
}

pub fn logout() -> Result<()> {
    require("tailscale")?;
    Cmd::sudo("tailscale").arg("logout").run()
}

pub fn status() -> Result<()> {
    require("tailscale")?;
    Cmd::sudo("tailscale").arg("status").run()
}

/// This node's overlay IPv4 address.
pub fn ipv4() -> Result<String> {
    require("tailscale")?;
    let out = Cmd::new("tailscale")
        .args(["ip", "-4"])
        .output()
        .context("Could not read the Tailscale address (is this node logged in?)")?;
    first_address(&out).context("`tailscale ip -4` printed no address (is this node logged in?)")
}

fn first_address(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_first_non_empty_line() {
        assert_eq!(
            first_address("\n100.101.102.103\n100.64.0.9\n").as_deref(),
            Some("100.101.102.103")
        );
        assert_eq!(first_address("  \n"), None);
    }
}
