//! Package manager detection for Node.js based templates

use super::probe::find_first_available_executable;
use std::fmt;

/// Supported JavaScript package managers, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    Pnpm,
    Yarn,
    Bun,
    Npm,
}

impl PackageManager {
    pub const ALL: [PackageManager; 4] = [
        PackageManager::Pnpm,
        PackageManager::Yarn,
        PackageManager::Bun,
        PackageManager::Npm,
    ];

    /// Executable name looked up on PATH
    pub fn command(&self) -> &'static str {
        match self {
            PackageManager::Pnpm => "pnpm",
            PackageManager::Yarn => "yarn",
            PackageManager::Bun => "bun",
            PackageManager::Npm => "npm",
        }
    }

    pub fn from_command(command: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|pm| pm.command() == command)
    }

    /// Command that installs a project's dependencies
    pub fn install_command(&self) -> String {
        format!("{} install", self.command())
    }

    /// Command that runs a package.json script
    pub fn run_command(&self, script: &str) -> String {
        match self {
            PackageManager::Npm => format!("npm run {}", script),
            other => format!("{} {}", other.command(), script),
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command())
    }
}

/// Detect the preferred package manager available on this host
pub fn detect_package_manager() -> Option<PackageManager> {
    find_first_available_executable(PackageManager::ALL.iter().map(|pm| pm.command()))
        .and_then(PackageManager::from_command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_command_round_trips_names() {
        for pm in PackageManager::ALL {
            assert_eq!(PackageManager::from_command(pm.command()), Some(pm));
        }
        assert_eq!(PackageManager::from_command("cargo"), None);
    }

    #[test]
    fn test_run_command() {
        assert_eq!(PackageManager::Npm.run_command("dev"), "npm run dev");
        assert_eq!(PackageManager::Pnpm.run_command("dev"), "pnpm dev");
        assert_eq!(PackageManager::Yarn.install_command(), "yarn install");
    }

    #[test]
    fn test_detect_returns_known_manager() {
        // Whatever is installed, the result must be one of the known managers
        if let Some(pm) = detect_package_manager() {
            assert!(PackageManager::ALL.contains(&pm));
        }
    }
}
