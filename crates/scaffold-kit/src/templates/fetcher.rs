//! Repository download from a hosting site or a local directory
//!
//! Remote repositories are fetched as zip archives of a single ref (no history),
//! or with a shallow `git clone` when `FetchMode::Git` is selected. Local
//! sources are copied as-is. Progress and warnings are broadcast as
//! `FetchEvent`s; callers subscribe around the fetch they care about.

use super::copier::copy_dir_all;
use super::source::{RemoteRepo, RepoSource};
use crate::runtime::probe::executable_exists;
use anyhow::{Context, Result};
use std::fmt;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::sync::broadcast;
use zip::ZipArchive;

/// Buffered events per subscriber before older ones are dropped
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
}

/// Progress or warning emitted while fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchEvent {
    pub level: EventLevel,
    pub message: String,
}

impl fmt::Display for FetchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// How remote repositories are downloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Zip archive of the ref over HTTPS
    #[default]
    Archive,
    /// Shallow clone with the `git` executable (branches and tags only)
    Git,
}

/// Downloads template repositories into local directories
pub struct RepoFetcher {
    client: reqwest::Client,
    mode: FetchMode,
    events: broadcast::Sender<FetchEvent>,
}

impl RepoFetcher {
    /// Create a new fetcher with a custom user agent
    pub fn new(user_agent: &str) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            mode: FetchMode::default(),
            events,
        }
    }

    pub fn with_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    /// Receive events emitted from now on. Drop the receiver to unsubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<FetchEvent> {
        self.events.subscribe()
    }

    fn emit(&self, level: EventLevel, message: impl Into<String>) {
        // No subscribers is fine
        let _ = self.events.send(FetchEvent {
            level,
            message: message.into(),
        });
    }

    fn info(&self, message: impl Into<String>) {
        self.emit(EventLevel::Info, message);
    }

    fn warn(&self, message: impl Into<String>) {
        self.emit(EventLevel::Warn, message);
    }

    /// Download `source` into `dest`, which must be absent or an empty directory
    pub async fn fetch(&self, source: &RepoSource, dest: &Path) -> Result<()> {
        ensure_empty_destination(dest)?;

        match source {
            RepoSource::Remote(repo) => match self.mode {
                FetchMode::Archive => self.fetch_archive(repo, dest).await,
                FetchMode::Git => self.fetch_git(repo, dest).await,
            },
            RepoSource::Local(path) => self.fetch_local(path, dest).await,
        }
    }

    async fn fetch_archive(&self, repo: &RemoteRepo, dest: &Path) -> Result<()> {
        let url = repo.archive_url()?;
        self.info(format!("Downloading {}", url));

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            anyhow::bail!(
                "Could not find repository {} or ref '{}' ({})",
                repo.git_url(),
                repo.reference,
                url
            );
        }
        if !response.status().is_success() {
            anyhow::bail!("Failed to fetch {}: HTTP {}", url, response.status());
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to download {}", url))?;

        let count = self.extract_archive(&bytes, repo.subdir.as_deref(), dest)?;
        self.info(format!("Extracted {} files to {}", count, dest.display()));
        Ok(())
    }

    /// Unpack a host archive, dropping its single top-level directory.
    /// Returns the number of files written.
    fn extract_archive(&self, zip_bytes: &[u8], subdir: Option<&str>, dest: &Path) -> Result<usize> {
        let mut archive =
            ZipArchive::new(Cursor::new(zip_bytes)).context("Failed to read repository archive")?;
        let subdir = subdir.map(Path::new);

        let mut written = 0;
        let mut matched = false;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;

            let Some(enclosed) = file.enclosed_name() else {
                self.warn(format!("Skipping unsafe archive entry '{}'", file.name()));
                continue;
            };

            // Archives from hosting sites wrap everything in `<repo>-<ref>/`
            let mut components = enclosed.components();
            components.next();
            let mut relative = components.as_path().to_path_buf();

            if let Some(subdir) = subdir {
                match relative.strip_prefix(subdir) {
                    Ok(inner) => relative = inner.to_path_buf(),
                    Err(_) => continue,
                }
                matched = true;
            }

            if relative.as_os_str().is_empty() {
                continue;
            }

            let target = dest.join(&relative);

            if file.is_dir() {
                std::fs::create_dir_all(&target)
                    .with_context(|| format!("Failed to create directory: {}", target.display()))?;
                continue;
            }

            if file.is_symlink() {
                self.warn(format!("Skipping symlink '{}'", relative.display()));
                continue;
            }

            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }

            let mut out = std::fs::File::create(&target)
                .with_context(|| format!("Failed to write file: {}", target.display()))?;
            std::io::copy(&mut file, &mut out)
                .with_context(|| format!("Failed to write file: {}", target.display()))?;
            out.flush()?;

            #[cfg(unix)]
            if let Some(mode) = file.unix_mode().map(|m| m & 0o777).filter(|m| *m != 0) {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&target, std::fs::Permissions::from_mode(mode))?;
            }

            written += 1;
        }

        if let Some(subdir) = subdir {
            if !matched {
                anyhow::bail!(
                    "Subdirectory '{}' not found in repository archive",
                    subdir.display()
                );
            }
        }

        Ok(written)
    }

    async fn fetch_git(&self, repo: &RemoteRepo, dest: &Path) -> Result<()> {
        let reference = (!repo.has_default_ref()).then_some(repo.reference.as_str());
        self.clone_with_git(&repo.git_url(), reference, repo.subdir.as_deref(), dest)
            .await
    }

    /// Shallow-clone `git_url` into `dest` without history, narrowed to `subdir`.
    /// `reference` is passed as `--branch`; `None` takes the remote's default branch.
    async fn clone_with_git(
        &self,
        git_url: &str,
        reference: Option<&str>,
        subdir: Option<&str>,
        dest: &Path,
    ) -> Result<()> {
        if !executable_exists("git") {
            anyhow::bail!("git mode requires the git executable, which was not found on PATH");
        }

        // A subdirectory needs the whole checkout first
        let checkout_dir = match subdir {
            Some(_) => Some(tempfile::tempdir().context("Failed to create checkout directory")?),
            None => None,
        };
        let clone_target: PathBuf = checkout_dir
            .as_ref()
            .map(|dir| dir.path().to_path_buf())
            .unwrap_or_else(|| dest.to_path_buf());

        self.info(format!("Cloning {}", git_url));

        let mut cmd = Command::new("git");
        cmd.arg("clone").arg("--depth").arg("1").arg("--quiet");
        if let Some(reference) = reference {
            cmd.arg("--branch").arg(reference);
        }
        cmd.arg(git_url).arg(&clone_target);

        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to run git clone {}", git_url))?;

        if !output.status.success() {
            anyhow::bail!(
                "git clone {} failed: {}",
                git_url,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let git_dir = clone_target.join(".git");
        if git_dir.exists() {
            tokio::fs::remove_dir_all(&git_dir)
                .await
                .with_context(|| format!("Failed to remove {}", git_dir.display()))?;
        }

        if let Some(subdir) = subdir {
            let src = clone_target.join(subdir);
            if !src.is_dir() {
                anyhow::bail!("Subdirectory '{}' not found in {}", subdir, git_url);
            }
            let count = copy_dir_all(&src, dest, false).await?;
            self.info(format!("Copied {} files to {}", count, dest.display()));
        }

        Ok(())
    }

    async fn fetch_local(&self, path: &Path, dest: &Path) -> Result<()> {
        if !path.is_dir() {
            anyhow::bail!("Local template source not found: {}", path.display());
        }

        self.info(format!("Copying {}", path.display()));
        let count = copy_dir_all(path, dest, false).await?;
        self.info(format!("Copied {} files to {}", count, dest.display()));
        Ok(())
    }
}

/// Fail unless `dest` is missing or an empty directory
fn ensure_empty_destination(dest: &Path) -> Result<()> {
    if !dest.exists() {
        return Ok(());
    }
    if !dest.is_dir() {
        anyhow::bail!("Destination is not a directory: {}", dest.display());
    }
    let mut entries = std::fs::read_dir(dest)
        .with_context(|| format!("Failed to read {}", dest.display()))?;
    if entries.next().is_some() {
        anyhow::bail!("Destination directory is not empty: {}", dest.display());
    }
    Ok(())
}
