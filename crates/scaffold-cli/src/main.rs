//! Scaffold CLI - create projects from template subdirectories of git repositories

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use scaffold_kit::prompt::{exit_on_error, resolve_destination};
use scaffold_kit::templates::{
    clone_git_repo, copy_template, CloneRequest, CopyOptions, FetchMode, RepoFetcher,
};
use scaffold_kit::tui::CreateArgs;
use scaffold_kit::{find_first_available_executable, ProductConfig};
use std::path::PathBuf;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Product configuration assembled from command-line flags
#[derive(Clone)]
pub struct CliProduct {
    source: String,
    template_dir: String,
    user_agent: String,
}

impl ProductConfig for CliProduct {
    fn name(&self) -> &str {
        "scaffold"
    }

    fn display_name(&self) -> &str {
        "Scaffold"
    }

    fn default_template_source(&self) -> &str {
        &self.source
    }

    fn template_source_env(&self) -> &str {
        "SCAFFOLD_TEMPLATE_SOURCE"
    }

    fn template_dir(&self) -> &str {
        &self.template_dir
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[derive(Parser, Debug)]
#[command(name = "scaffold")]
#[command(about = "Create projects from template subdirectories of git repositories")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new project from a template directory (interactive)
    Create(CliCreateArgs),
    /// Download a whole repository into a new directory
    Clone(CloneArgs),
    /// Copy a template directory from a local template tree
    Copy(CopyArgs),
    /// Print the first of the given executables found on PATH
    Which(WhichArgs),
}

#[derive(Parser, Debug)]
pub struct CliCreateArgs {
    /// Project directory to create (prompted for when omitted)
    pub directory: Option<PathBuf>,

    /// Template source, e.g. github.com/owner/repo#main (or SCAFFOLD_TEMPLATE_SOURCE)
    #[arg(short, long = "from")]
    pub source: Option<String>,

    /// Template directory inside the source, e.g. template/demo-server
    #[arg(short, long, default_value = ".")]
    pub template: String,

    /// Use a shallow git clone instead of downloading an archive
    #[arg(long)]
    pub git: bool,

    /// Keep the package name shipped in package.json
    #[arg(long = "keep-package-name")]
    pub keep_package_name: bool,

    /// Do not rename .npmignore to .gitignore
    #[arg(long = "keep-npmignore")]
    pub keep_npmignore: bool,
}

impl From<CliCreateArgs> for CreateArgs {
    fn from(args: CliCreateArgs) -> Self {
        CreateArgs {
            directory: args.directory,
            source: args.source,
            template_dir: Some(args.template),
            git: args.git,
            keep_package_name: args.keep_package_name,
            keep_npmignore: args.keep_npmignore,
        }
    }
}

#[derive(Parser, Debug)]
pub struct CloneArgs {
    /// Source descriptor, e.g. https://github.com/owner/repo#branch
    pub source: String,

    /// Destination directory (prompted for when omitted)
    pub dest: Option<String>,

    /// Use a shallow git clone instead of downloading an archive
    #[arg(long)]
    pub git: bool,

    /// Do not print progress or warnings
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Parser, Debug)]
pub struct CopyArgs {
    /// Local template tree
    pub template_root: PathBuf,

    /// Template directory inside the tree
    pub template: PathBuf,

    /// Destination directory (prompted for when omitted)
    pub dest: Option<String>,

    /// Rename the package in package.json after the destination directory
    #[arg(long = "update-package-json")]
    pub update_package_json: bool,

    /// Do not rename .npmignore to .gitignore
    #[arg(long = "keep-npmignore")]
    pub keep_npmignore: bool,

    /// Print what is being created
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
pub struct WhichArgs {
    /// Executable names, in order of preference
    #[arg(required = true)]
    pub names: Vec<String>,
}

fn fetch_mode(git: bool) -> FetchMode {
    if git {
        FetchMode::Git
    } else {
        FetchMode::Archive
    }
}

async fn run_create(args: CliCreateArgs) -> Result<()> {
    let config = CliProduct {
        source: args.source.clone().unwrap_or_default(),
        template_dir: args.template.clone(),
        user_agent: format!("scaffold/{}", CLI_VERSION),
    };

    let result = scaffold_kit::run(&config, args.into()).await;

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    result
}

async fn run_clone(args: CloneArgs) -> Result<()> {
    let dest = exit_on_error(resolve_destination(args.dest.as_deref(), None).await);
    let fetcher =
        RepoFetcher::new(&format!("scaffold/{}", CLI_VERSION)).with_mode(fetch_mode(args.git));

    clone_git_repo(
        &fetcher,
        &CloneRequest {
            src: args.source,
            dest: dest.clone(),
            show_log: !args.quiet,
            show_warn: !args.quiet,
        },
    )
    .await?;

    if !args.quiet {
        println!("{} {}", "Done:".green().bold(), dest.display());
    }
    Ok(())
}

async fn run_copy(args: CopyArgs) -> Result<()> {
    let dest = exit_on_error(resolve_destination(args.dest.as_deref(), None).await);

    copy_template(&CopyOptions {
        dest: Some(dest),
        template_root: args.template_root,
        src_dir: args.template,
        verbose: args.verbose,
        update_package_json: args.update_package_json,
        skip_rename_ignore_file: args.keep_npmignore,
    })
    .await?;

    Ok(())
}

fn run_which(args: WhichArgs) {
    match find_first_available_executable(args.names.iter().map(String::as_str)) {
        Some(name) => println!("{}", name),
        None => {
            eprintln!(
                "{} none of {} found on PATH",
                "Error:".red(),
                args.names.join(", ")
            );
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();

    match args.command {
        Command::Create(create_args) => run_create(create_args).await,
        Command::Clone(clone_args) => run_clone(clone_args).await,
        Command::Copy(copy_args) => run_copy(copy_args).await,
        Command::Which(which_args) => {
            run_which(which_args);
            Ok(())
        }
    }
}
