//! Template fetching, copying and post-processing
//!
//! This module provides:
//! - Source descriptor parsing (`owner/repo/subdir#ref`, local paths)
//! - Repository download (zip archive, shallow git clone, local copy)
//! - Project creation from a template subdirectory
//! - `package.json` editing that keeps the original indentation

pub mod copier;
pub mod fetcher;
pub mod package_json;
pub mod source;

pub use copier::{
    clone_git_repo, clone_template, copy_dir_all, copy_template, fetch_with_events,
    fix_ignore_filename, post_process, update_package_json_name, CloneOptions, CloneRequest,
    CopyOptions, PostProcess,
};
pub use fetcher::{EventLevel, FetchEvent, FetchMode, RepoFetcher};
pub use package_json::{detect_indent, update_package_json, PackageJson, DEFAULT_INDENT};
pub use source::{RemoteRepo, RepoSource, Site, SourceParseError, DEFAULT_REF};
