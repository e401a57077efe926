//! Scaffold Kit - Shared library for "create a project from a template" CLIs
//!
//! Given a git repository (or a local directory) holding one or more template
//! subdirectories, this library creates a fresh project directory from one of
//! them, renames the package in `package.json` after the new directory, and turns
//! a shipped `.npmignore` into `.gitignore`.
//!
//! # Architecture
//!
//! - **Core operations** - repository download, template copying, manifest editing,
//!   executable lookup, line prompts
//! - **Product layer** - `ProductConfig` for binaries with a fixed template
//! - **CLI/TUI interface** - optional cliclack-based create flow (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based create flow
//!
//! # Example Usage
//!
//! ```ignore
//! use scaffold_kit::templates::{clone_template, CloneOptions, RepoFetcher};
//!
//! let fetcher = RepoFetcher::new("create-demo");
//! let dest = clone_template(
//!     &fetcher,
//!     &CloneOptions {
//!         git_src: "https://github.com/owner/templates#main".into(),
//!         src_dir: "template/demo-server".into(),
//!         update_package_json: true,
//!         ..Default::default()
//!     },
//! )
//! .await?;
//! ```

pub mod product;
pub mod prompt;
pub mod runtime;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use product::ProductConfig;
pub use prompt::{ask, resolve_destination, DestinationError};
pub use runtime::{
    detect_package_manager, executable_exists, find_first_available_executable, PackageManager,
};
pub use templates::{
    clone_git_repo, clone_template, copy_template, update_package_json, CloneOptions,
    CloneRequest, CopyOptions, PackageJson, RepoFetcher, RepoSource,
};

#[cfg(feature = "tui")]
pub use tui::run;
