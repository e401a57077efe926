//! Host tool detection
//!
//! This module provides:
//! - Executable lookup on PATH (`where` / `command -v`)
//! - Package manager detection used for post-create hints

pub mod check;
pub mod probe;

pub use check::{detect_package_manager, PackageManager};
pub use probe::{executable_exists, find_first_available_executable};
