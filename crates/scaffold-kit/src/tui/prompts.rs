//! Charm-style CLI prompts using cliclack

use crate::product::ProductConfig;
use crate::prompt::destination::{ensure_absent, DEFAULT_PROMPT_NAME};
use crate::runtime::check::{detect_package_manager, PackageManager};
use crate::templates::copier::{clone_template, copy_template, CloneOptions, CopyOptions};
use crate::templates::fetcher::{EventLevel, FetchEvent, FetchMode, RepoFetcher};
use crate::templates::source::RepoSource;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

/// CLI arguments for the create command
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    /// Project directory to create
    pub directory: Option<PathBuf>,

    /// Template source overriding the product's default
    pub source: Option<String>,

    /// Template directory overriding the product's default
    pub template_dir: Option<String>,

    /// Use a shallow git clone instead of an archive download
    pub git: bool,

    /// Leave `package.json`'s name as shipped by the template
    pub keep_package_name: bool,

    /// Do not rename `.npmignore` to `.gitignore`
    pub keep_npmignore: bool,
}

/// Run the create flow with interactive prompts
pub async fn run<C: ProductConfig>(config: &C, args: CreateArgs) -> Result<()> {
    cliclack::intro(config.display_name())?;

    let source = args
        .source
        .clone()
        .unwrap_or_else(|| config.template_source());
    let template_dir = args
        .template_dir
        .clone()
        .unwrap_or_else(|| config.template_dir().to_string());

    let parsed: RepoSource = source
        .parse()
        .with_context(|| format!("Invalid template source: {}", source))?;
    cliclack::log::info(format!("Template: {} ({})", parsed, template_dir))?;

    let project_dir = select_directory(&args)?;

    let update_package_json = config.update_package_json() && !args.keep_package_name;
    let mode = if args.git {
        FetchMode::Git
    } else {
        FetchMode::Archive
    };
    let fetcher = RepoFetcher::new(config.user_agent()).with_mode(mode);

    create_project(
        &fetcher,
        &parsed,
        &source,
        &template_dir,
        &project_dir,
        update_package_json,
        args.keep_npmignore,
    )
    .await?;

    print_next_steps(config, &project_dir, detect_package_manager())?;

    Ok(())
}

fn select_directory(args: &CreateArgs) -> Result<PathBuf> {
    let path = match &args.directory {
        Some(dir) => {
            cliclack::log::info(format!("Using directory: {}", dir.display()))?;
            dir.clone()
        }
        None => {
            let input: String = cliclack::input(DEFAULT_PROMPT_NAME)
                .placeholder("my-app")
                .validate(|input: &String| {
                    if input.trim().is_empty() {
                        Err("Please specify the project directory")
                    } else if Path::new(input.trim()).exists() {
                        Err("That path already exists")
                    } else {
                        Ok(())
                    }
                })
                .interact()?;
            PathBuf::from(input.trim())
        }
    };

    // Validate parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            anyhow::bail!("Parent directory does not exist: {}", parent.display());
        }
    }

    ensure_absent(&path)?;
    Ok(path)
}

async fn create_project(
    fetcher: &RepoFetcher,
    source: &RepoSource,
    raw_source: &str,
    template_dir: &str,
    project_dir: &Path,
    update_package_json: bool,
    keep_npmignore: bool,
) -> Result<()> {
    let spinner = cliclack::spinner();
    spinner.start("Creating project...");

    // Subscribed only for this call; dropped before returning
    let mut events = fetcher.subscribe();

    let result = match source {
        RepoSource::Local(root) => {
            copy_template(&CopyOptions {
                dest: Some(project_dir.to_path_buf()),
                template_root: root.clone(),
                src_dir: PathBuf::from(template_dir),
                verbose: false,
                update_package_json,
                skip_rename_ignore_file: keep_npmignore,
            })
            .await
        }
        RepoSource::Remote(_) => {
            clone_template(
                fetcher,
                &CloneOptions {
                    dest: Some(project_dir.to_path_buf()),
                    git_src: raw_source.to_string(),
                    src_dir: PathBuf::from(template_dir),
                    show_log: false,
                    show_warn: false,
                    update_package_json,
                    skip_rename_ignore_file: keep_npmignore,
                },
            )
            .await
        }
    };

    let warnings = drain_warnings(&mut events);
    drop(events);

    match &result {
        Ok(dir) => spinner.stop(format!("Created project in {}", dir.display())),
        Err(_) => spinner.stop("Failed to create project"),
    }

    for warning in &warnings {
        cliclack::log::warning(warning)?;
    }

    result.map(|_| ())
}

/// Collect buffered warnings, noting any that were overwritten before being read
fn drain_warnings(events: &mut broadcast::Receiver<FetchEvent>) -> Vec<String> {
    let mut warnings = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) if event.level == EventLevel::Warn => warnings.push(event.message),
            Ok(_) => {}
            Err(TryRecvError::Lagged(skipped)) => {
                warnings.push(format!("{} fetch events were dropped", skipped))
            }
            Err(_) => break,
        }
    }
    warnings
}

fn print_next_steps<C: ProductConfig>(
    config: &C,
    project_dir: &Path,
    package_manager: Option<PackageManager>,
) -> Result<()> {
    let steps = config.next_steps(project_dir, package_manager);

    if !steps.is_empty() {
        println!();
        println!("  Next steps");
        println!();

        for (i, step) in steps.iter().enumerate() {
            println!("  {}.  {}", i + 1, step);
        }
    }

    cliclack::outro("Happy coding!")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(level: EventLevel, message: String) -> FetchEvent {
        FetchEvent { level, message }
    }

    #[test]
    fn test_drain_warnings_keeps_only_warnings() {
        let (tx, mut rx) = broadcast::channel(16);
        tx.send(event(EventLevel::Info, "Downloading".into())).unwrap();
        tx.send(event(EventLevel::Warn, "Skipping symlink 'a'".into()))
            .unwrap();

        assert_eq!(drain_warnings(&mut rx), vec!["Skipping symlink 'a'"]);
    }

    #[test]
    fn test_drain_warnings_continues_past_lag() {
        let (tx, mut rx) = broadcast::channel(4);
        for i in 0..10 {
            tx.send(event(EventLevel::Warn, format!("warning {}", i)))
                .unwrap();
        }

        let warnings = drain_warnings(&mut rx);

        assert_eq!(warnings[0], "6 fetch events were dropped");
        assert_eq!(&warnings[1..], ["warning 6", "warning 7", "warning 8", "warning 9"]);
    }
}
