use crate::progress::{ProgressRenderer, StepEvent, StepResult};
use crate::style;
use anyhow::Result;
use autohost_core::{AutohostConfig, Check, Report, Severity, Status};
use autohost_utils::paths::AutohostPaths;
use autohost_utils::{Outcome, caddy, cloudflared, docker, tailscale};
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input, Select};
use std::io::IsTerminal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Tailscale,
    Cloudflare { domain: String },
    Skip,
}

/// Everything the plan needs to know, gathered before any step runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answers {
    pub install_docker: bool,
    pub add_to_docker_group: bool,
    pub caddy: bool,
    pub access: Access,
}

impl Answers {
    pub fn defaults() -> Self {
        Self {
            install_docker: true,
            add_to_docker_group: true,
            caddy: true,
            access: Access::Tailscale,
        }
    }

    fn prompt(docker_present: bool) -> Result<Self> {
        let install_docker = docker_present
            || Confirm::new()
                .with_prompt("Docker is not installed. Install it now?")
                .default(true)
                .interact()?;

        let add_to_docker_group = Confirm::new()
            .with_prompt("Add your user to the docker group to run Docker without sudo?")
            .default(true)
            .interact()?;

        let caddy = Confirm::new()
            .with_prompt("Install Caddy as the reverse proxy?")
            .default(true)
            .interact()?;

        let choice = Select::new()
            .with_prompt("How should this host be reached?")
            .items(&[
                "Tailscale (private)",
                "Cloudflare Tunnel (public, needs a domain)",
                "Skip for now",
            ])
            .default(0)
            .interact()?;
        let access = match choice {
            0 => Access::Tailscale,
            1 => {
                let domain: String = Input::new()
                    .with_prompt("Hostname for the tunnel (e.g. blog.example.com)")
                    .interact_text()?;
                Access::Cloudflare {
                    domain: domain.trim().to_string(),
                }
            }
            _ => Access::Skip,
        };

        Ok(Self {
            install_docker,
            add_to_docker_group,
            caddy,
            access,
        })
    }
}

type Action<'a> = Box<dyn FnOnce() -> Result<Outcome> + 'a>;

pub struct Step<'a> {
    pub id: &'static str,
    pub description: &'static str,
    action: Action<'a>,
}

impl<'a> Step<'a> {
    pub fn new(
        id: &'static str,
        description: &'static str,
        action: impl FnOnce() -> Result<Outcome> + 'a,
    ) -> Self {
        Self {
            id,
            description,
            action: Box::new(action),
        }
    }

    fn skipped(id: &'static str, description: &'static str, why: &'static str) -> Self {
        Self::new(id, description, move || Ok(Outcome::Skipped(why.to_string())))
    }
}

/// The ordered provisioning plan for the given answers.
pub fn plan<'a>(
    paths: &'a AutohostPaths,
    config: &'a AutohostConfig,
    answers: &'a Answers,
) -> Vec<Step<'a>> {
    let mut steps = vec![Step::new("directories", "Creating autohost directories", move || {
        let created = paths.ensure_layout()?;
        autohost_utils::config::write_default(paths)?;
        Ok(if created.is_empty() {
            Outcome::Unchanged(format!("{} is ready", paths.root().display()))
        } else {
            Outcome::Changed(format!("created {} directories", created.len()))
        })
    })];

    steps.push(if answers.install_docker {
        Step::new("docker", "Installing Docker", move || {
            docker::install(&config.installers.docker_script)
        })
    } else {
        Step::new("docker", "Checking Docker", move || {
            anyhow::bail!("Docker is required; install it manually and run setup again")
        })
    });

    steps.push(if answers.add_to_docker_group {
        Step::new("docker-group", "Adding user to the docker group", docker::add_user_to_group)
    } else {
        Step::skipped("docker-group", "Docker group", "declined")
    });

    steps.push(if answers.caddy {
        Step::new("caddy", "Installing Caddy", move || {
            let outcome = caddy::install(&config.installers.caddy_repo)?;
            caddy::ensure_caddyfile(paths)?;
            Ok(outcome)
        })
    } else {
        Step::skipped("caddy", "Caddy", "declined")
    });

    steps.push(match &answers.access {
        Access::Tailscale => Step::new("access", "Installing Tailscale", move || {
            tailscale::install(&config.installers.tailscale_script)
        }),
        Access::Cloudflare { domain } => {
            Step::new("access", "Setting up Cloudflare Tunnel", move || {
                cloudflared::install(&config.installers.cloudflared_binary)?;
                cloudflared::setup_tunnel(paths, domain)?;
                Ok(Outcome::Changed(format!("{domain} routed through the tunnel")))
            })
        }
        Access::Skip => Step::skipped("access", "Remote access", "declined"),
    });

    steps
}

/// Runs steps in order, stopping at the first failure. Every step that ran gets a check.
pub fn execute(steps: Vec<Step<'_>>, renderer: &mut ProgressRenderer) -> Report {
    let mut report = Report::default();
    for step in steps {
        renderer.handle_event(StepEvent::Started {
            id: step.id,
            description: step.description,
        });
        let result = match (step.action)() {
            Ok(Outcome::Changed(msg) | Outcome::Unchanged(msg)) => StepResult::Pass(msg),
            Ok(Outcome::Skipped(msg)) => StepResult::Skip(msg),
            Err(e) => StepResult::Fail(format!("{e:#}")),
        };
        let check = match &result {
            StepResult::Pass(msg) => Check::pass(step.id, Severity::Critical, msg.as_str()),
            StepResult::Skip(msg) => Check::skip(step.id, Severity::Critical, msg.as_str()),
            StepResult::Fail(msg) => Check::fail(step.id, Severity::Critical, msg.as_str()),
        };
        let failed = check.status == Status::Fail;
        report.push(check);
        renderer.handle_event(StepEvent::Finished {
            id: step.id,
            result,
        });
        if failed {
            break;
        }
    }
    report
}

pub fn run(paths: &AutohostPaths, config: &AutohostConfig, yes: bool) -> Result<()> {
    let interactive = std::io::stdin().is_terminal() && std::io::stdout().is_terminal();

    let answers = if yes {
        Answers::defaults()
    } else if interactive {
        cliclack::intro("autohost setup")?;
        Answers::prompt(docker::is_installed())?
    } else {
        anyhow::bail!("setup needs a terminal for its questions; pass --yes to accept the defaults");
    };

    let mut renderer = ProgressRenderer::new(interactive);
    let report = execute(plan(paths, config, &answers), &mut renderer);
    if let Some(failed) = report.first_failure() {
        anyhow::bail!("setup step `{}` failed: {}", failed.id, failed.summary);
    }

    if interactive {
        cliclack::outro("Host provisioned")?;
    } else {
        println!("{} {}", style::CHECK, "Host provisioned".bold());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn plan_order_is_fixed() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AutohostPaths::new(dir.path());
        let config = AutohostConfig::default();
        let answers = Answers {
            install_docker: true,
            add_to_docker_group: false,
            caddy: false,
            access: Access::Skip,
        };
        let ids: Vec<_> = plan(&paths, &config, &answers)
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["directories", "docker", "docker-group", "caddy", "access"]);
    }

    #[test]
    fn first_failure_stops_the_plan() {
        let ran = RefCell::new(Vec::new());
        let steps = vec![
            Step::new("one", "first", || {
                ran.borrow_mut().push("one");
                Ok(Outcome::Changed("done".into()))
            }),
            Step::new("two", "second", || {
                ran.borrow_mut().push("two");
                anyhow::bail!("boom")
            }),
            Step::new("three", "third", || {
                ran.borrow_mut().push("three");
                Ok(Outcome::Unchanged("fine".into()))
            }),
        ];

        let report = execute(steps, &mut ProgressRenderer::new(false));
        let failed = report.first_failure().unwrap();
        assert_eq!(failed.id, "two");
        assert!(failed.summary.contains("boom"));
        assert_eq!(report.checks.len(), 2);
        assert_eq!(*ran.borrow(), ["one", "two"]);
    }

    #[test]
    fn skipped_steps_do_not_fail() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AutohostPaths::new(dir.path());
        let steps = vec![
            Step::new("directories", "dirs", || {
                paths.ensure_layout()?;
                Ok(Outcome::Changed("created".into()))
            }),
            Step::skipped("caddy", "Caddy", "declined"),
        ];
        let report = execute(steps, &mut ProgressRenderer::new(false));
        assert!(report.first_failure().is_none());
        assert_eq!(report.checks[1].status, Status::Skip);
        assert!(paths.is_initialized());
    }
}
