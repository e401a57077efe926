//! Executable lookup on the host PATH

use std::process::{Command, Stdio};

/// Build the platform lookup command for `name`
fn lookup_command(name: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("where");
        cmd.arg(name);
        cmd
    } else {
        // The name is passed as a positional parameter, never spliced into the script
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("command -v \"$1\"").arg("sh").arg(name);
        cmd
    }
}

/// Check if an executable can be resolved on this host.
///
/// Any failure to run the lookup counts as "not found".
pub fn executable_exists(name: &str) -> bool {
    if name.trim().is_empty() {
        return false;
    }

    lookup_command(name)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Return the first name in `names` that resolves to an executable
pub fn find_first_available_executable<'a, I>(names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().find(|name| executable_exists(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING: &str = "scaffold-kit-surely-missing-binary-7f3a";

    #[test]
    fn test_missing_executable() {
        assert!(!executable_exists(MISSING));
    }

    #[test]
    fn test_empty_name_is_missing() {
        assert!(!executable_exists(""));
        assert!(!executable_exists("   "));
    }

    #[cfg(unix)]
    #[test]
    fn test_core_utility_exists() {
        assert!(executable_exists("sh"));
    }

    #[cfg(unix)]
    #[test]
    fn test_name_is_not_interpreted_by_shell() {
        assert!(!executable_exists("sh; true"));
        assert!(!executable_exists("$(echo sh)"));
    }

    #[cfg(unix)]
    #[test]
    fn test_find_first_skips_missing() {
        assert_eq!(find_first_available_executable([MISSING, "sh"]), Some("sh"));
    }

    #[test]
    fn test_find_first_none_available() {
        assert_eq!(find_first_available_executable([MISSING]), None);
        assert_eq!(find_first_available_executable(Vec::<&str>::new()), None);
    }
}
