//! Preflight checks before handing a build to the installer compiler.
//!
//! Resolution order for the compiler:
//! 1. `SETUP_BUILDER_ISCC` env var (path to the binary)
//! 2. System PATH (`iscc`, then `ISCC`)
//!
//! # Example
//!
//! ```rust,no_run
//! use setup_builder::preflight::resolve_compiler;
//!
//! match resolve_compiler() {
//!     Ok(path) => println!("compiling with {}", path.display()),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

use anyhow::{bail, Result};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Env var naming an explicit compiler binary.
pub const COMPILER_ENV: &str = "SETUP_BUILDER_ISCC";

/// Names tried on PATH, in order.
pub const COMPILER_CANDIDATES: &[&str] = &["iscc", "ISCC"];

/// Locate the installer compiler.
pub fn resolve_compiler() -> Result<PathBuf> {
    resolve_compiler_from(env::var_os(COMPILER_ENV))
}

/// Same as [`resolve_compiler`] with the env override passed in.
pub fn resolve_compiler_from(override_path: Option<OsString>) -> Result<PathBuf> {
    if let Some(raw) = override_path.filter(|raw| !raw.is_empty()) {
        let path = PathBuf::from(raw);
        if path.is_file() {
            log::debug!("using compiler from {COMPILER_ENV}: {}", path.display());
            return Ok(path);
        }
        bail!(
            "{COMPILER_ENV} points to '{}', which is not a file",
            path.display()
        );
    }

    for candidate in COMPILER_CANDIDATES {
        if let Ok(path) = which::which(candidate) {
            log::debug!("using compiler from PATH: {}", path.display());
            return Ok(path);
        }
    }

    bail!(
        "installer compiler not found: tried {} on PATH.\n  \
         Install Inno Setup and add it to PATH, or set {COMPILER_ENV} to the ISCC binary.",
        COMPILER_CANDIDATES.join(", ")
    )
}
