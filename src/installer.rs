use crate::logger::Logger;
use crate::rpm::PackageManager;
use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use url::Url;

/// The downloaded RPM on disk. Removed when dropped, on every exit path.
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed temporary file {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!("Could not remove {}: {}", self.path.display(), e),
        }
    }
}

/// Last path segment of the artifact URL, e.g. `foo-1.2-1.fc40.aarch64.rpm`.
pub fn file_name_from_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url).with_context(|| format!("Invalid artifact URL: {}", url))?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Artifact URL has no file name: {}", url))
}

/// Streams `url` into `dir`, hands the file to the package manager, and
/// removes it again. `Ok(false)` means the installer itself failed.
pub async fn install_from_url<M: PackageManager>(
    http: &reqwest::Client,
    url: &str,
    dir: &Path,
    packages: &mut M,
) -> Result<bool> {
    let file_name = file_name_from_url(url)?;
    let artifact = TempArtifact::new(dir.join(&file_name));

    Logger::info(format!("Downloading {}", Logger::brand_text(&file_name)));
    download(http, url, artifact.path()).await?;

    Logger::info("Installing package...");
    let installed = packages
        .install(artifact.path())
        .context("Failed to run the package installer")?;

    if installed {
        Logger::success(format!("Installed {}", Logger::brand_text(&file_name)));
    } else {
        Logger::error("Package installation failed");
    }
    Ok(installed)
}

async fn download(http: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let mut res = http
        .get(url)
        .send()
        .await
        .and_then(|res| res.error_for_status())
        .with_context(|| format!("Failed to download {}", url))?;

    let pb = match res.content_length() {
        Some(len) => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.cyan} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let mut file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("Failed to create {}", dest.display()))?;

    while let Some(chunk) = res
        .chunk()
        .await
        .with_context(|| format!("Download of {} was interrupted", url))?
    {
        file.write_all(&chunk).await?;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;
    pb.finish_and_clear();

    log::debug!("Saved {} to {}", url, dest.display());
    Ok(())
}
