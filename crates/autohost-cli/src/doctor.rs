use crate::hints;
use crate::style;
use anyhow::Result;
use autohost_core::{Check, Report, Severity, Status};
use autohost_utils::paths::AutohostPaths;
use autohost_utils::{caddy, cloudflared, docker, tailscale};
use autohost_utils::which::which;
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use std::collections::BTreeSet;

struct DoctorCompactTheme;

impl cliclack::Theme for DoctorCompactTheme {
    fn format_log(&self, text: &str, symbol: &str) -> String {
        // The default adds a spacer line after every log line.
        self.format_log_with_spacing(text, symbol, false)
    }
}

struct DoctorThemeGuard;

impl DoctorThemeGuard {
    fn install() -> Self {
        cliclack::set_theme(DoctorCompactTheme);
        Self
    }
}

impl Drop for DoctorThemeGuard {
    fn drop(&mut self) {
        cliclack::reset_theme();
    }
}

fn binary_check(
    id: &str,
    name: &str,
    installed: bool,
    severity: Severity,
    remediation: &str,
) -> Check {
    if installed {
        let path = which(name)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| name.to_string());
        Check::pass(id, severity, format!("{name} is installed")).with_details(path)
    } else {
        Check::fail(id, severity, format!("{name} is not installed")).with_remediation(remediation)
    }
}

pub fn collect(paths: &AutohostPaths) -> Report {
    let mut report = Report::default();

    report.push(if paths.is_initialized() {
        Check::pass("autohost.init", Severity::Critical, "autohost is initialized")
            .with_details(paths.root().display().to_string())
    } else {
        Check::fail("autohost.init", Severity::Critical, "autohost is not initialized")
            .with_details(paths.root().display().to_string())
            .with_remediation(hints::init_command(paths))
    });

    let docker_cli = docker::is_installed();
    report.push(binary_check(
        "docker.cli",
        "docker",
        docker_cli,
        Severity::Critical,
        "autohost docker install",
    ));
    report.push(if !docker_cli {
        Check::skip("docker.daemon", Severity::Critical, "Docker daemon not checked")
            .with_details("the docker CLI is missing")
    } else if docker::daemon_available() {
        Check::pass("docker.daemon", Severity::Critical, "Docker daemon is reachable")
    } else {
        Check::fail("docker.daemon", Severity::Critical, "Docker daemon is not reachable")
            .with_details("`docker version` failed; the daemon may be stopped or you may lack permission")
            .with_remediation("sudo systemctl start docker")
            .with_remediation("autohost docker install --add-group")
    });

    report.push(binary_check(
        "curl",
        "curl",
        which("curl").is_some(),
        Severity::Critical,
        "sudo apt install -y curl",
    ));
    report.push(binary_check(
        "tailscale",
        "tailscale",
        tailscale::is_installed(),
        Severity::Warning,
        "autohost tailscale install",
    ));
    report.push(binary_check(
        "caddy",
        "caddy",
        caddy::is_installed(),
        Severity::Warning,
        "autohost caddy install",
    ));
    report.push(binary_check(
        "cloudflared",
        "cloudflared",
        cloudflared::is_installed(),
        Severity::Info,
        "autohost cloudflare install",
    ));

    let local_terraform = paths.bin_dir().join("terraform");
    let terraform = which("terraform").or_else(|| local_terraform.is_file().then_some(local_terraform));
    report.push(if let Some(path) = terraform {
        Check::pass("terraform", Severity::Info, "terraform is installed")
            .with_details(path.display().to_string())
    } else {
        Check::skip("terraform", Severity::Info, "terraform is not installed")
            .with_details("it is downloaded on the first `autohost tailscale split-dns`")
    });

    report
}

pub fn run(paths: &AutohostPaths, json: bool) -> Result<i32> {
    let report = collect(paths);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_human(&report);
    }

    Ok(i32::from(report.has_critical_failures()))
}

fn problems(report: &Report) -> Vec<&Check> {
    report
        .checks
        .iter()
        .filter(|c| c.status == Status::Fail)
        .collect()
}

/// Remediation commands of failed checks, deduplicated, in report order.
fn next_steps(report: &Report) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    problems(report)
        .into_iter()
        .flat_map(|c| c.remediation.iter().map(String::as_str))
        .filter(|cmd| seen.insert(*cmd))
        .collect()
}

fn render_human(report: &Report) {
    if std::io::stdout().is_tty() {
        render_human_cliclack(report);
    } else {
        render_human_plain(report);
    }
}

fn render_human_plain(report: &Report) {
    for check in &report.checks {
        let status = match check.status {
            Status::Pass => "PASS".green(),
            Status::Fail => "FAIL".red(),
            Status::Skip => "SKIP".yellow(),
        };
        println!("[{status}] {} ({})", check.summary, check.id.as_str().dim());
        if let Some(details) = &check.details {
            println!("  {details}");
        }
    }

    if !report.has_critical_failures() {
        println!("{} All critical checks passed.", style::CHECK);
    }

    let problems = problems(report);
    if problems.is_empty() {
        return;
    }

    println!();
    println!("{} Problems:", style::WARN);
    for p in &problems {
        let sev = match p.severity {
            Severity::Critical => "critical".red(),
            Severity::Warning => "warning".yellow(),
            Severity::Info => "info".cyan(),
        };
        println!("- {sev}: {}", p.summary);
    }

    let steps = next_steps(report);
    if !steps.is_empty() {
        println!();
        println!("{} Suggested next steps:", style::PACKAGE);
        for cmd in steps {
            println!("  - {}", cmd.bold());
        }
    }
}

fn render_human_cliclack(report: &Report) {
    let _theme = DoctorThemeGuard::install();

    for check in &report.checks {
        let line = format!("{} ({})", check.summary, check.id);
        let _ = match (check.status, check.severity) {
            (Status::Pass, _) => cliclack::log::success(line),
            (Status::Skip, _) => cliclack::log::info(line),
            (Status::Fail, Severity::Critical) => cliclack::log::error(line),
            (Status::Fail, Severity::Warning) => cliclack::log::warning(line),
            (Status::Fail, Severity::Info) => cliclack::log::info(line),
        };
        if let Some(details) = &check.details {
            let _ = cliclack::log::remark(details);
        }
    }

    if !report.has_critical_failures() {
        let _ = cliclack::log::success("All critical checks passed.");
    }

    let steps = next_steps(report);
    if steps.is_empty() {
        return;
    }
    if steps.len() == 1 {
        let _ = cliclack::log::info("Fix:");
    } else {
        let _ = cliclack::log::info("Fixes:");
    }
    for cmd in steps {
        let _ = cliclack::log::remark(cmd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_root_is_a_critical_failure() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AutohostPaths::new(dir.path().join("missing"));
        let report = collect(&paths);

        let init = report.checks.iter().find(|c| c.id == "autohost.init").unwrap();
        assert_eq!(init.status, Status::Fail);
        assert!(report.has_critical_failures());
        assert!(next_steps(&report).iter().any(|cmd| cmd.ends_with("init")));
    }

    #[test]
    fn next_steps_are_deduplicated() {
        let mut report = Report::default();
        report.push(Check::fail("a", Severity::Warning, "a").with_remediation("fix it"));
        report.push(Check::fail("b", Severity::Warning, "b").with_remediation("fix it"));
        report.push(Check::pass("c", Severity::Warning, "c").with_remediation("never"));
        assert_eq!(next_steps(&report), vec!["fix it"]);
    }
}
