//! Product configuration trait for `create-*` style binaries
//!
//! A product fixes where its template lives so the binary only needs to ask
//! for a destination.

use crate::runtime::check::PackageManager;
use std::path::Path;

/// Configuration trait for a project generator
///
/// Each product implements this trait to define:
/// - Product identity (name, display name)
/// - Template source and subdirectory
/// - Post-processing choices
/// - Post-create instructions
pub trait ProductConfig: Send + Sync {
    /// Internal product name (used for the user agent and messages)
    fn name(&self) -> &str;

    /// Human-readable display name
    fn display_name(&self) -> &str;

    /// Template source descriptor used when the environment does not override it
    fn default_template_source(&self) -> &str;

    /// Environment variable name for overriding the template source
    fn template_source_env(&self) -> &str;

    /// Template directory inside the source repository or tree
    fn template_dir(&self) -> &str;

    /// Whether to rename the package in `package.json` after the project directory
    fn update_package_json(&self) -> bool {
        true
    }

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &str {
        self.name()
    }

    /// Template source after applying the environment override
    fn template_source(&self) -> String {
        std::env::var(self.template_source_env())
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| self.default_template_source().to_string())
    }

    /// Instructions shown after project creation
    fn next_steps(&self, dir: &Path, package_manager: Option<PackageManager>) -> Vec<String> {
        let mut steps = Vec::new();
        let current = std::env::current_dir().ok();

        if current.as_deref() != Some(dir) {
            steps.push(format!("cd {}", dir.display()));
        }

        if dir.join("package.json").exists() {
            let pm = package_manager.unwrap_or(PackageManager::Npm);
            steps.push(pm.install_command());
            steps.push(pm.run_command("dev"));
        }

        steps
    }
}
