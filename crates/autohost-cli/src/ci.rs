use crate::style;
use anyhow::Result;
use autohost_core::template::deploy_workflow;
use autohost_utils::fs::atomic_write;
use dialoguer::Input;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

const DEFAULT_BRANCH: &str = "main";

pub fn workflow_path(repo: &Path) -> PathBuf {
    repo.join(".github").join("workflows").join("deploy.yml")
}

pub fn init(repo: &Path, branch: Option<&str>) -> Result<()> {
    let branch = match branch {
        Some(b) if !b.trim().is_empty() => b.trim().to_string(),
        Some(_) => DEFAULT_BRANCH.to_string(),
        None if std::io::stdin().is_terminal() => {
            let answer: String = Input::new()
                .with_prompt("Branch that triggers deploys")
                .default(DEFAULT_BRANCH.to_string())
                .interact_text()?;
            answer.trim().to_string()
        }
        None => DEFAULT_BRANCH.to_string(),
    };

    let path = workflow_path(repo);
    atomic_write(&path, deploy_workflow(&branch))?;
    println!("{} Wrote {} (deploys on `{branch}`)", style::CHECK, path.display());
    println!("Register a self-hosted GitHub Actions runner on this host to run it.");
    Ok(())
}
