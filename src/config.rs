use crate::cli::Cli;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_KOJI_URL: &str = "https://koji.fedoraproject.org";
pub const DEFAULT_PKGS_URL: &str = "https://kojipkgs.fedoraproject.org";

/// Runtime settings. Every field has a default, so a partial `config.toml` is fine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub koji_url: String,
    pub pkgs_url: String,
    pub arch: String,
    pub dist_marker: String,
    pub download_dir: Option<PathBuf>,
    pub commands: CommandConfig,
}

/// Command lines for the local package manager. The target (glob, file, name)
/// is appended as the last argument.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CommandConfig {
    pub query: Vec<String>,
    pub install: Vec<String>,
    pub remove: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            koji_url: DEFAULT_KOJI_URL.to_string(),
            pkgs_url: DEFAULT_PKGS_URL.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            dist_marker: ".fc".to_string(),
            download_dir: None,
            commands: CommandConfig::default(),
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        let words = |s: &[&str]| -> Vec<String> { s.iter().map(|w| w.to_string()).collect() };
        Self {
            query: words(&["rpm", "-qa"]),
            install: words(&["sudo", "dnf", "install", "-y"]),
            remove: words(&["sudo", "dnf", "remove", "-y"]),
        }
    }
}

impl Config {
    pub fn get_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "kojinstall", "kojinstall")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Defaults, then the config file, then environment, then command line flags.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env(|key| std::env::var(key).ok());
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn load() -> Result<Self> {
        match Self::get_path() {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Self::from_toml(&content)
                    .with_context(|| format!("Invalid config file {}", path.display()))
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// `lookup` is `std::env::var` in production; tests pass a closure over a map.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("KOJINSTALL_KOJI_URL") {
            self.koji_url = url;
        }
        if let Some(url) = lookup("KOJINSTALL_PKGS_URL") {
            self.pkgs_url = url;
        }
        if let Some(arch) = lookup("KOJINSTALL_ARCH") {
            self.arch = arch;
        }
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.koji_url {
            self.koji_url = url.clone();
        }
        if let Some(url) = &cli.pkgs_url {
            self.pkgs_url = url.clone();
        }
        if let Some(arch) = &cli.arch {
            self.arch = arch.clone();
        }
        if let Some(dir) = &cli.download_dir {
            self.download_dir = Some(dir.clone());
        }
    }

    pub fn search_url(&self) -> String {
        format!("{}/koji/search", self.koji_url.trim_end_matches('/'))
    }

    pub fn buildinfo_url(&self) -> String {
        format!("{}/koji/buildinfo", self.koji_url.trim_end_matches('/'))
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Links from the build page are usually host-relative (`/packages/...`).
    /// Anything that already looks absolute is returned untouched.
    pub fn qualify(&self, href: &str) -> Result<String> {
        if href.starts_with("http://") || href.starts_with("https://") {
            return Ok(href.to_string());
        }
        let base = Url::parse(&self.pkgs_url)
            .with_context(|| format!("Invalid package host URL: {}", self.pkgs_url))?;
        let joined = base
            .join(href)
            .with_context(|| format!("Cannot resolve {} against {}", href, self.pkgs_url))?;
        Ok(joined.to_string())
    }
}
