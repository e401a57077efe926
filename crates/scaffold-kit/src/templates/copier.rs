//! Project creation from template subdirectories
//!
//! Two entry points:
//! - [`clone_template`]: download a repository into a staging directory next to the
//!   destination, then move one subdirectory into place
//! - [`copy_template`]: copy a subdirectory of a local template tree
//!
//! Both finish with the same post-processing (package name, ignore file).

use super::fetcher::{EventLevel, FetchEvent, RepoFetcher};
use super::package_json::PackageJson;
use super::source::RepoSource;
use crate::prompt::destination::{destination_arg, ensure_absent, resolve_destination};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use walkdir::WalkDir;

/// Download a whole repository into `dest`
#[derive(Debug, Clone)]
pub struct CloneRequest {
    /// Source descriptor, e.g. `https://github.com/owner/repo#branch`
    pub src: String,
    pub dest: PathBuf,
    pub show_log: bool,
    pub show_warn: bool,
}

/// Create a project from a subdirectory of a remote repository
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// Resolved from the first CLI argument or a prompt when absent
    pub dest: Option<PathBuf>,
    /// Source descriptor, e.g. `https://github.com/owner/repo#branch`
    pub git_src: String,
    /// Template directory inside the repository, e.g. `template/demo-server`
    pub src_dir: PathBuf,
    pub show_log: bool,
    pub show_warn: bool,
    pub update_package_json: bool,
    pub skip_rename_ignore_file: bool,
}

/// Create a project from a subdirectory of a local template tree
#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    /// Resolved from the first CLI argument or a prompt when absent
    pub dest: Option<PathBuf>,
    pub template_root: PathBuf,
    /// Joined onto `template_root`
    pub src_dir: PathBuf,
    pub verbose: bool,
    pub update_package_json: bool,
    pub skip_rename_ignore_file: bool,
}

/// Steps applied to a freshly created project
#[derive(Debug, Clone, Copy, Default)]
pub struct PostProcess {
    pub update_package_json: bool,
    pub skip_rename_ignore_file: bool,
}

impl CloneOptions {
    fn post_process(&self) -> PostProcess {
        PostProcess {
            update_package_json: self.update_package_json,
            skip_rename_ignore_file: self.skip_rename_ignore_file,
        }
    }
}

impl CopyOptions {
    fn post_process(&self) -> PostProcess {
        PostProcess {
            update_package_json: self.update_package_json,
            skip_rename_ignore_file: self.skip_rename_ignore_file,
        }
    }
}

/// Run `fetcher.fetch`, handing every event emitted during the call to `on_event`.
///
/// The subscription lives only for this call, so events never leak into
/// later fetches made with the same fetcher.
pub async fn fetch_with_events<F>(
    fetcher: &RepoFetcher,
    source: &RepoSource,
    dest: &Path,
    mut on_event: F,
) -> Result<()>
where
    F: FnMut(&FetchEvent),
{
    let mut events = fetcher.subscribe();
    let fetch = fetcher.fetch(source, dest);
    tokio::pin!(fetch);

    let result = loop {
        tokio::select! {
            biased;
            result = &mut fetch => break result,
            received = events.recv() => match received {
                Ok(event) => on_event(&event),
                Err(RecvError::Lagged(skipped)) => on_event(&FetchEvent {
                    level: EventLevel::Warn,
                    message: format!("{} fetch events were dropped", skipped),
                }),
                Err(RecvError::Closed) => break (&mut fetch).await,
            }
        }
    };

    loop {
        match events.try_recv() {
            Ok(event) => on_event(&event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }

    result
}

/// Download the repository described by `request.src` into `request.dest`
pub async fn clone_git_repo(fetcher: &RepoFetcher, request: &CloneRequest) -> Result<()> {
    if request.show_log {
        println!("{} {} ...", "Cloning from".cyan(), request.src);
    }

    let source: RepoSource = request
        .src
        .parse()
        .with_context(|| format!("Invalid template source: {}", request.src))?;

    if !request.show_log && !request.show_warn {
        return fetcher.fetch(&source, &request.dest).await;
    }

    fetch_with_events(fetcher, &source, &request.dest, |event| match event.level {
        EventLevel::Warn if request.show_warn => {
            eprintln!("{} {}", "Warning:".yellow(), event)
        }
        EventLevel::Info if request.show_log => println!("  {} {}", "->".blue(), event),
        _ => {}
    })
    .await
}

/// Use the given destination after checking it is free, or resolve one interactively
async fn destination_or_prompt(dest: Option<&Path>) -> Result<PathBuf> {
    match dest {
        Some(dest) => {
            ensure_absent(dest)?;
            Ok(dest.to_path_buf())
        }
        None => Ok(resolve_destination(destination_arg().as_deref(), None).await?),
    }
}

/// Create the staging directory `<parent>/<name>.tmpXXXXXX` next to `dest`
fn staging_dir(dest: &Path) -> Result<tempfile::TempDir> {
    let name = dest
        .file_name()
        .with_context(|| format!("Invalid project directory: {}", dest.display()))?;
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    tempfile::Builder::new()
        .prefix(&format!("{}.tmp", name.to_string_lossy()))
        .tempdir_in(parent)
        .with_context(|| format!("Failed to create staging directory in {}", parent.display()))
}

/// True if `path` stays inside whatever directory it is joined onto
fn is_plain_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Create a project from a subdirectory of a remote repository.
///
/// Returns the project directory.
pub async fn clone_template(fetcher: &RepoFetcher, options: &CloneOptions) -> Result<PathBuf> {
    if !is_plain_relative(&options.src_dir) {
        anyhow::bail!(
            "Template directory must be a relative path inside the repository: {}",
            options.src_dir.display()
        );
    }

    let dest = destination_or_prompt(options.dest.as_deref()).await?;

    // Removed when dropped, whether or not the move below succeeds
    let staging = staging_dir(&dest)?;

    clone_git_repo(
        fetcher,
        &CloneRequest {
            src: options.git_src.clone(),
            dest: staging.path().to_path_buf(),
            show_log: options.show_log,
            show_warn: options.show_warn,
        },
    )
    .await?;

    if options.show_log {
        println!("{} {} ...", "Creating a new project in".cyan(), dest.display());
    }

    // `.` components dropped so a repository-root template moves the staging dir itself
    let src = options
        .src_dir
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .fold(staging.path().to_path_buf(), |path, c| path.join(c));
    if !src.is_dir() {
        anyhow::bail!(
            "Template directory '{}' not found in {}",
            options.src_dir.display(),
            options.git_src
        );
    }
    fs::rename(&src, &dest)
        .await
        .with_context(|| format!("Failed to move template into {}", dest.display()))?;

    drop(staging);

    post_process(&dest, options.post_process())?;
    Ok(dest)
}

/// Create a project from a subdirectory of a local template tree.
///
/// Returns the project directory.
pub async fn copy_template(options: &CopyOptions) -> Result<PathBuf> {
    let src = options.template_root.join(&options.src_dir);
    if !src.is_dir() {
        anyhow::bail!("Template directory not found: {}", src.display());
    }

    let dest = destination_or_prompt(options.dest.as_deref()).await?;

    if options.verbose {
        println!("{} {} ...", "Creating a new project in".cyan(), dest.display());
    }

    copy_dir_all(&src, &dest, true).await?;

    post_process(&dest, options.post_process())?;
    Ok(dest)
}

/// Recursively copy `src` into `dest`, returning the number of files copied.
///
/// Symlinks are recreated on unix and copied as files elsewhere.
pub async fn copy_dir_all(src: &Path, dest: &Path, include_git_dir: bool) -> Result<usize> {
    ensure_not_nested(src, dest)?;

    fs::create_dir_all(dest)
        .await
        .with_context(|| format!("Failed to create directory: {}", dest.display()))?;

    let mut copied = 0;
    let walker = WalkDir::new(src)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| include_git_dir || entry.file_name() != ".git");

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to read {}", src.display()))?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .await
                .with_context(|| format!("Failed to create directory: {}", target.display()))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        if file_type.is_symlink() {
            copy_symlink(entry.path(), &target).await?;
        } else {
            fs::copy(entry.path(), &target)
                .await
                .with_context(|| format!("Failed to write file: {}", target.display()))?;
        }
        copied += 1;
    }

    Ok(copied)
}

/// Absolute form of `path`, resolved through its nearest existing ancestor
fn resolve_target(path: &Path) -> Result<PathBuf> {
    let mut existing = path;
    let mut missing = Vec::new();

    while !existing.as_os_str().is_empty() && !existing.exists() {
        let name = existing
            .file_name()
            .with_context(|| format!("Cannot resolve {}", path.display()))?;
        missing.push(name);
        existing = existing.parent().unwrap_or(Path::new(""));
    }
    if existing.as_os_str().is_empty() {
        existing = Path::new(".");
    }

    let base = existing
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", existing.display()))?;
    Ok(missing.iter().rev().fold(base, |path, name| path.join(name)))
}

/// Fail if `dest` is `src` or lies anywhere below it
fn ensure_not_nested(src: &Path, dest: &Path) -> Result<()> {
    let src_abs = src
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", src.display()))?;
    let dest_abs = resolve_target(dest)?;

    if dest_abs.starts_with(&src_abs) {
        anyhow::bail!(
            "Cannot copy {} into its own subdirectory {}",
            src.display(),
            dest.display()
        );
    }
    Ok(())
}

#[cfg(unix)]
async fn copy_symlink(link: &Path, target: &Path) -> Result<()> {
    let points_to = fs::read_link(link)
        .await
        .with_context(|| format!("Failed to read link {}", link.display()))?;
    fs::symlink(&points_to, target)
        .await
        .with_context(|| format!("Failed to create link {}", target.display()))
}

#[cfg(not(unix))]
async fn copy_symlink(link: &Path, target: &Path) -> Result<()> {
    fs::copy(link, target)
        .await
        .with_context(|| format!("Failed to write file: {}", target.display()))?;
    Ok(())
}

/// Apply post-processing to a created project; a missing `dest` is left alone
pub fn post_process(dest: &Path, steps: PostProcess) -> Result<()> {
    if !dest.exists() {
        return Ok(());
    }
    if steps.update_package_json {
        update_package_json_name(dest)?;
    }
    if !steps.skip_rename_ignore_file {
        fix_ignore_filename(dest)?;
    }
    Ok(())
}

/// Set `package.json`'s `name` to the project directory's name
pub fn update_package_json_name(dest: &Path) -> Result<PackageJson> {
    let name = match dest.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => dest
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", dest.display()))?
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("Cannot derive a package name from {}", dest.display()))?,
    };

    let mut pkg = PackageJson::read(dest.join("package.json"))?;
    pkg.set_name(&name)?;
    pkg.save()?;
    Ok(pkg)
}

/// Rename `.npmignore` to `.gitignore` when the project has no `.gitignore`.
///
/// Returns whether a rename happened.
pub fn fix_ignore_filename(dest: &Path) -> Result<bool> {
    let git = dest.join(".gitignore");
    let npm = dest.join(".npmignore");

    if git.exists() || !npm.exists() {
        return Ok(false);
    }

    std::fs::rename(&npm, &git)
        .with_context(|| format!("Failed to rename {} to .gitignore", npm.display()))?;
    Ok(true)
}
