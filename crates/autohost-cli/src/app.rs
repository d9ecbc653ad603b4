use crate::style;
use anyhow::Result;
use autohost_core::compose::describe_ports;
use autohost_utils::apps::{self, AppState, EnvFile, TemplateSource};
use autohost_utils::paths::AutohostPaths;
use crossterm::style::Stylize;
use dialoguer::Confirm;
use std::io::IsTerminal;

pub fn list(paths: &AutohostPaths) -> Result<()> {
    for app in apps::list(paths)? {
        let source = match &app.source {
            TemplateSource::Embedded => "built-in".to_string(),
            TemplateSource::Custom(path) => path.display().to_string(),
        };
        let installed = if app.installed {
            "installed".green()
        } else {
            "available".dim()
        };
        println!("{} {} [{installed}] ({source})", style::DOT, app.name.as_str().bold());
    }
    Ok(())
}

fn confirm(prompt: String, default: bool) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        return Ok(default);
    }
    Ok(Confirm::new().with_prompt(prompt).default(default).interact()?)
}

pub fn install(paths: &AutohostPaths, name: &str, start: bool) -> Result<()> {
    let installed = apps::install(paths, name)?;
    println!(
        "{} {} installed in {}",
        style::CHECK,
        name.bold(),
        installed.dir.display()
    );
    match installed.env {
        EnvFile::Generated => println!("  {} generated .env with fresh secrets", style::DOT),
        EnvFile::Empty => println!("  {} created an empty .env", style::DOT),
        EnvFile::Kept => println!("  {} kept the existing .env", style::DOT),
    }

    if start || confirm(format!("Start {name} now with Docker?"), false)? {
        run_start(paths, name)?;
    }
    Ok(())
}

fn run_start(paths: &AutohostPaths, name: &str) -> Result<()> {
    apps::start(paths, name)?;
    let ports = apps::ports(paths, name).unwrap_or_default();
    println!("{} {}: {}", style::ROCKET, name.bold(), describe_ports(&ports));
    Ok(())
}

pub fn start(paths: &AutohostPaths, name: &str) -> Result<()> {
    run_start(paths, name)
}

pub fn stop(paths: &AutohostPaths, name: &str) -> Result<()> {
    apps::stop(paths, name)?;
    println!("{} {} stopped", style::CHECK, name.bold());
    Ok(())
}

pub fn remove(paths: &AutohostPaths, name: &str, yes: bool) -> Result<()> {
    apps::compose_path(paths, name)?;
    if !yes && !confirm(format!("Remove {name}'s containers?"), false)? {
        println!("Cancelled.");
        return Ok(());
    }
    apps::remove(paths, name)?;
    println!("{} {} removed", style::CHECK, name.bold());
    Ok(())
}

pub fn status(paths: &AutohostPaths, name: &str) -> Result<()> {
    let state = match apps::status(paths, name)? {
        AppState::Running => "running".green(),
        AppState::Stopped => "stopped".yellow(),
    };
    println!("{} {}: {state}", style::PACKAGE, name.bold());
    Ok(())
}
