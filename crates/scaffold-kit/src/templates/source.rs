//! Template source descriptors
//!
//! Accepted forms:
//! - `owner/repo`, `github.com/owner/repo`, `https://github.com/owner/repo`
//! - `github:owner/repo`, `gitlab:owner/repo`, `bitbucket:owner/repo`
//! - `git@github.com:owner/repo.git`
//! - any of the above followed by `/sub/dir` and/or `#ref`
//! - `file://path`, `./path`, `../path` or `/abs/path` for local template trees

use anyhow::{anyhow, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Ref used when the descriptor has no `#ref` fragment
pub const DEFAULT_REF: &str = "HEAD";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceParseError {
    #[error("Template source is empty")]
    Empty,

    #[error("Unsupported host '{0}' (expected github.com, gitlab.com or bitbucket.org)")]
    UnsupportedHost(String),

    #[error("Could not find owner and repository in '{0}'")]
    MissingRepository(String),
}

/// Git hosting sites with a known archive download layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    GitHub,
    GitLab,
    Bitbucket,
}

impl Site {
    pub fn host(&self) -> &'static str {
        match self {
            Site::GitHub => "github.com",
            Site::GitLab => "gitlab.com",
            Site::Bitbucket => "bitbucket.org",
        }
    }

    fn from_host(host: &str) -> Option<Self> {
        match host.to_ascii_lowercase().trim_start_matches("www.") {
            "github.com" => Some(Site::GitHub),
            "gitlab.com" => Some(Site::GitLab),
            "bitbucket.org" => Some(Site::Bitbucket),
            _ => None,
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "github" => Some(Site::GitHub),
            "gitlab" => Some(Site::GitLab),
            "bitbucket" => Some(Site::Bitbucket),
            _ => None,
        }
    }
}

/// A repository on a hosting site, optionally narrowed to a subdirectory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepo {
    pub site: Site,
    pub owner: String,
    pub name: String,
    pub subdir: Option<String>,
    pub reference: String,
}

impl RemoteRepo {
    /// URL of the zip archive of `reference`
    pub fn archive_url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("https://{}/", self.site.host()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("URL cannot have path segments: {}", self.site.host()))?;
            segments.pop_if_empty().push(&self.owner).push(&self.name);

            let (ref_dirs, ref_last) = match self.reference.rsplit_once('/') {
                Some((dirs, last)) => (Some(dirs), last),
                None => (None, self.reference.as_str()),
            };

            match self.site {
                Site::GitHub => {
                    segments.push("archive");
                    segments.extend(ref_dirs.into_iter().flat_map(|d| d.split('/')));
                    segments.push(&format!("{}.zip", ref_last));
                }
                Site::GitLab => {
                    segments.push("-").push("archive");
                    segments.extend(self.reference.split('/'));
                    segments.push(&format!(
                        "{}-{}.zip",
                        self.name,
                        self.reference.replace('/', "-")
                    ));
                }
                Site::Bitbucket => {
                    segments.push("get");
                    segments.extend(ref_dirs.into_iter().flat_map(|d| d.split('/')));
                    segments.push(&format!("{}.zip", ref_last));
                }
            }
        }
        Ok(url)
    }

    /// HTTPS clone URL
    pub fn git_url(&self) -> String {
        format!("https://{}/{}/{}.git", self.site.host(), self.owner, self.name)
    }

    pub fn has_default_ref(&self) -> bool {
        self.reference == DEFAULT_REF
    }
}

impl fmt::Display for RemoteRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.site.host(), self.owner, self.name)?;
        if let Some(subdir) = &self.subdir {
            write!(f, "/{}", subdir)?;
        }
        if !self.has_default_ref() {
            write!(f, "#{}", self.reference)?;
        }
        Ok(())
    }
}

/// Where a template repository comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSource {
    Remote(RemoteRepo),
    Local(PathBuf),
}

impl fmt::Display for RepoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoSource::Remote(repo) => fmt::Display::fmt(repo, f),
            RepoSource::Local(path) => write!(f, "file://{}", path.display()),
        }
    }
}

fn is_local_path(s: &str) -> bool {
    s == "." || s.starts_with("./") || s.starts_with("../") || s.starts_with('/')
}

impl FromStr for RepoSource {
    type Err = SourceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SourceParseError::Empty);
        }

        if let Some(path) = s.strip_prefix("file://") {
            return Ok(RepoSource::Local(PathBuf::from(path)));
        }
        if is_local_path(s) {
            return Ok(RepoSource::Local(PathBuf::from(s)));
        }

        let (body, reference) = match s.split_once('#') {
            Some((body, r)) if !r.is_empty() => (body, r.to_string()),
            Some((body, _)) => (body, DEFAULT_REF.to_string()),
            None => (s, DEFAULT_REF.to_string()),
        };

        let mut site = None;
        let mut rest = body;

        if let Some(stripped) = ["git+https://", "https://", "http://", "ssh://"]
            .iter()
            .find_map(|scheme| rest.strip_prefix(scheme))
        {
            rest = stripped;
        }
        let scp_form;
        if let Some(stripped) = rest.strip_prefix("git@") {
            // git@host:owner/repo
            scp_form = stripped.replacen(':', "/", 1);
            rest = &scp_form;
        } else if let Some((prefix, after)) = rest.split_once(':') {
            if let Some(prefixed) = Site::from_prefix(prefix) {
                site = Some(prefixed);
                rest = after;
            }
        }

        let mut segments: Vec<&str> = rest.split('/').filter(|seg| !seg.is_empty()).collect();

        if site.is_none() {
            if let Some(first) = segments.first() {
                if first.contains('.') {
                    site = Some(
                        Site::from_host(first)
                            .ok_or_else(|| SourceParseError::UnsupportedHost(first.to_string()))?,
                    );
                    segments.remove(0);
                }
            }
        }

        if segments.len() < 2 {
            return Err(SourceParseError::MissingRepository(s.to_string()));
        }

        let owner = segments[0].to_string();
        let name = segments[1].trim_end_matches(".git").to_string();
        if name.is_empty() {
            return Err(SourceParseError::MissingRepository(s.to_string()));
        }
        let subdir = (segments.len() > 2).then(|| segments[2..].join("/"));

        Ok(RepoSource::Remote(RemoteRepo {
            site: site.unwrap_or(Site::GitHub),
            owner,
            name,
            subdir,
            reference,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(s: &str) -> RemoteRepo {
        match s.parse::<RepoSource>().unwrap() {
            RepoSource::Remote(repo) => repo,
            other => panic!("expected remote source, got {:?}", other),
        }
    }

    #[test]
    fn test_https_url_with_ref() {
        let repo = remote("https://github.com/beenotung/cs-gen#template-macro");
        assert_eq!(repo.site, Site::GitHub);
        assert_eq!(repo.owner, "beenotung");
        assert_eq!(repo.name, "cs-gen");
        assert_eq!(repo.subdir, None);
        assert_eq!(repo.reference, "template-macro");
    }

    #[test]
    fn test_shorthand_defaults_to_github_head() {
        let repo = remote("owner/repo");
        assert_eq!(repo.site, Site::GitHub);
        assert_eq!(repo.reference, DEFAULT_REF);
        assert!(repo.has_default_ref());
    }

    #[test]
    fn test_subdir_and_host() {
        let repo = remote("gitlab.com/group/project/templates/web#v1.2.0");
        assert_eq!(repo.site, Site::GitLab);
        assert_eq!(repo.subdir.as_deref(), Some("templates/web"));
        assert_eq!(repo.reference, "v1.2.0");
    }

    #[test]
    fn test_site_prefix_and_scp_form() {
        assert_eq!(remote("bitbucket:team/tool").site, Site::Bitbucket);

        let repo = remote("git@github.com:owner/repo.git");
        assert_eq!(repo.owner, "owner");
        assert_eq!(repo.name, "repo");
    }

    #[test]
    fn test_local_sources() {
        assert_eq!(
            "file:///srv/templates".parse::<RepoSource>().unwrap(),
            RepoSource::Local(PathBuf::from("/srv/templates"))
        );
        assert_eq!(
            "./templates".parse::<RepoSource>().unwrap(),
            RepoSource::Local(PathBuf::from("./templates"))
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!("".parse::<RepoSource>(), Err(SourceParseError::Empty));
        assert_eq!(
            "example.com/a/b".parse::<RepoSource>(),
            Err(SourceParseError::UnsupportedHost("example.com".to_string()))
        );
        assert!(matches!(
            "github.com/only-owner".parse::<RepoSource>(),
            Err(SourceParseError::MissingRepository(_))
        ));
    }

    #[test]
    fn test_archive_urls() {
        assert_eq!(
            remote("owner/repo#main").archive_url().unwrap().as_str(),
            "https://github.com/owner/repo/archive/main.zip"
        );
        assert_eq!(
            remote("owner/repo#feature/x").archive_url().unwrap().as_str(),
            "https://github.com/owner/repo/archive/feature/x.zip"
        );
        assert_eq!(
            remote("gitlab:group/proj#v1").archive_url().unwrap().as_str(),
            "https://gitlab.com/group/proj/-/archive/v1/proj-v1.zip"
        );
        assert_eq!(
            remote("bitbucket:team/tool").archive_url().unwrap().as_str(),
            "https://bitbucket.org/team/tool/get/HEAD.zip"
        );
    }

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(
            remote("https://github.com/o/r/sub#dev").to_string(),
            "github.com/o/r/sub#dev"
        );
        assert_eq!(remote("o/r").git_url(), "https://github.com/o/r.git");
    }
}
