use crate::config::CommandConfig;
use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::process::{Command, Stdio};

/// The local package database and installer.
pub trait PackageManager {
    fn is_installed(&mut self, base_name: &str) -> Result<bool>;
    /// `Ok(false)` when the installer ran but exited non-zero.
    fn install(&mut self, rpm: &Path) -> Result<bool>;
    fn remove(&mut self, name: &str) -> Result<bool>;
}

/// Runs `rpm -qa` and `sudo dnf ...`, or whatever the config says instead.
pub struct Dnf {
    commands: CommandConfig,
}

impl Dnf {
    pub fn new(commands: CommandConfig) -> Self {
        Self { commands }
    }

    fn command(argv: &[String], target: &str) -> Result<Command> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("Package manager command is empty"))?;
        let mut cmd = Command::new(program);
        cmd.args(args).arg(target);
        Ok(cmd)
    }

    fn run(argv: &[String], target: &str) -> Result<bool> {
        let status = Self::command(argv, target)?
            .status()
            .with_context(|| format!("Failed to execute {}", argv.join(" ")))?;
        log::debug!("{} {} exited with {}", argv.join(" "), target, status);
        Ok(status.success())
    }
}

impl PackageManager for Dnf {
    fn is_installed(&mut self, base_name: &str) -> Result<bool> {
        let output = Self::command(&self.commands.query, &format!("{}*", base_name))?
            .stderr(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute {}", self.commands.query.join(" ")))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(!stdout.trim().is_empty())
    }

    fn install(&mut self, rpm: &Path) -> Result<bool> {
        Self::run(&self.commands.install, &rpm.to_string_lossy())
    }

    fn remove(&mut self, name: &str) -> Result<bool> {
        Self::run(&self.commands.remove, name)
    }
}

/// Strips `-version-release` from an NVR: `python3-foo-1.2-1.fc40` -> `python3-foo`.
/// Names with fewer than three dash-separated parts keep everything before the first dash.
pub fn base_name(build_name: &str) -> &str {
    let mut parts = build_name.rsplitn(3, '-');
    let _release = parts.next();
    let version = parts.next();
    match (version, parts.next()) {
        (Some(_), Some(name)) if !name.is_empty() => name,
        _ => build_name.split('-').next().unwrap_or(build_name),
    }
}
