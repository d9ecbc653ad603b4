//! Blocking execution of external programs.
//!
//! Every provisioning step shells out. Commands inherit the terminal unless their output is
//! captured, and a non-zero exit is reported as [`CommandFailed`].

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
#[error("`{command}` failed with {status}")]
pub struct CommandFailed {
    pub command: String,
    pub status: String,
    pub stderr: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
            envs: Vec::new(),
        }
    }

    /// `sh -c <script>`.
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    /// Prefixes the command with `sudo` unless already running as root.
    pub fn sudo(program: impl Into<String>) -> Self {
        if nix::unistd::geteuid().is_root() {
            Self::new(program)
        } else {
            Self::new("sudo").arg(program)
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Human-readable rendering used in logs and errors.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        for (k, v) in &self.envs {
            cmd.env(k, v);
        }
        cmd
    }

    /// Runs with inherited stdio and fails on a non-zero exit.
    pub fn run(&self) -> Result<()> {
        debug!(command = %self.display(), dir = ?self.dir, "running");
        let status = self
            .command()
            .status()
            .with_context(|| format!("Failed to execute `{}`", self.program))?;
        if !status.success() {
            return Err(CommandFailed {
                command: self.display(),
                status: status.to_string(),
                stderr: None,
            }
            .into());
        }
        Ok(())
    }

    /// Captures stdout (trimmed). Stderr is kept for the error when the command fails.
    pub fn output(&self) -> Result<String> {
        debug!(command = %self.display(), dir = ?self.dir, "capturing");
        let output = self
            .command()
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute `{}`", self.program))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CommandFailed {
                command: self.display(),
                status: output.status.to_string(),
                stderr: (!stderr.is_empty()).then_some(stderr),
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Whether the command runs and exits zero, with all output discarded.
    pub fn succeeds(&self) -> bool {
        debug!(command = %self.display(), "probing");
        self.command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_trimmed() {
        let out = Cmd::shell("printf '  hello \\n'").output().unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn failure_carries_command_and_stderr() {
        let err = Cmd::shell("echo boom >&2; exit 3").output().unwrap_err();
        let failed = err.downcast_ref::<CommandFailed>().unwrap();
        assert!(failed.command.starts_with("sh -c"));
        assert_eq!(failed.stderr.as_deref(), Some("boom"));
    }

    #[test]
    fn env_and_dir_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let out = Cmd::shell("echo \"$GREETING\" > out.txt && cat out.txt")
            .current_dir(dir.path())
            .env("GREETING", "hi")
            .output()
            .unwrap();
        assert_eq!(out, "hi");
        assert!(dir.path().join("out.txt").is_file());
    }

    #[test]
    fn succeeds_is_false_for_missing_program() {
        assert!(!Cmd::new("autohost-definitely-missing-binary").succeeds());
        assert!(Cmd::new("true").succeeds());
    }
}
