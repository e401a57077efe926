//! Destination directory resolution and validation

use super::ask::ask;
use colored::Colorize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};

/// Prompt label used when the caller does not supply one
pub const DEFAULT_PROMPT_NAME: &str = "project directory";

#[derive(Debug, Error)]
pub enum DestinationError {
    /// Nothing was supplied on the command line or at the prompt
    #[error("Please specify the {0}")]
    Missing(String),

    /// The destination would overwrite an existing file or directory
    #[error("Error: {} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Failed to read the destination: {0}")]
    Io(#[from] std::io::Error),
}

/// First positional process argument, used as the destination by `create-*` style binaries
pub fn destination_arg() -> Option<String> {
    std::env::args().nth(1).filter(|arg| !arg.is_empty())
}

/// Fail if anything exists at `path`.
///
/// The check is not atomic with the later creation of the directory; two
/// concurrent callers targeting the same path are not coordinated.
pub fn ensure_absent(path: &Path) -> Result<(), DestinationError> {
    // Dangling symlinks count as existing entries too
    if path.symlink_metadata().is_ok() {
        return Err(DestinationError::AlreadyExists(path.to_path_buf()));
    }
    Ok(())
}

/// Resolve the destination, prompting on stdin/stdout when `explicit` is empty
pub async fn resolve_destination(
    explicit: Option<&str>,
    prompt_name: Option<&str>,
) -> Result<PathBuf, DestinationError> {
    resolve_destination_with(
        explicit,
        prompt_name,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

/// Resolve the destination using the given streams for the prompt
pub async fn resolve_destination_with<R, W>(
    explicit: Option<&str>,
    prompt_name: Option<&str>,
    input: R,
    output: W,
) -> Result<PathBuf, DestinationError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let name = prompt_name.unwrap_or(DEFAULT_PROMPT_NAME);

    let dest = match explicit {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => ask(&format!("{}: ", name), input, output).await?,
    };

    if dest.is_empty() {
        return Err(DestinationError::Missing(name.to_string()));
    }

    let path = PathBuf::from(dest);
    ensure_absent(&path)?;
    Ok(path)
}

/// Unwrap a resolution result, or print the error and exit with status 1.
///
/// Meant for CLI entry points; library code should propagate the error instead.
pub fn exit_on_error<T>(result: Result<T, DestinationError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_explicit_value_skips_prompt() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("fresh");
        let mut output = Vec::new();

        let resolved = resolve_destination_with(
            dest.to_str(),
            None,
            &b"other\n"[..],
            &mut output,
        )
        .await
        .unwrap();

        assert_eq!(resolved, dest);
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_prompts_with_name() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("prompted");
        let line = format!("{}\n", dest.display());
        let mut output = Vec::new();

        let resolved =
            resolve_destination_with(Some(""), Some("app folder"), line.as_bytes(), &mut output)
                .await
                .unwrap();

        assert_eq!(resolved, dest);
        assert_eq!(String::from_utf8(output).unwrap(), "app folder: ");
    }

    #[tokio::test]
    async fn test_default_prompt_name() {
        let mut output = Vec::new();
        let err = resolve_destination_with(None, None, &b"\n"[..], &mut output)
            .await
            .unwrap_err();

        assert_eq!(String::from_utf8(output).unwrap(), "project directory: ");
        assert!(matches!(err, DestinationError::Missing(ref n) if n == DEFAULT_PROMPT_NAME));
        assert_eq!(err.to_string(), "Please specify the project directory");
    }

    #[tokio::test]
    async fn test_existing_path_rejected_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let existing = tmp.path().join("taken");
        std::fs::create_dir(&existing).unwrap();
        std::fs::write(existing.join("keep.txt"), "keep").unwrap();

        let err = resolve_destination_with(existing.to_str(), None, &b""[..], tokio::io::sink())
            .await
            .unwrap_err();

        assert!(matches!(err, DestinationError::AlreadyExists(ref p) if p == &existing));
        assert!(err.to_string().ends_with("already exists"));
        assert_eq!(
            std::fs::read_to_string(existing.join("keep.txt")).unwrap(),
            "keep"
        );
    }

    #[test]
    fn test_ensure_absent_on_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();

        assert!(ensure_absent(&file).is_err());
        assert!(ensure_absent(&tmp.path().join("missing")).is_ok());
    }
}
