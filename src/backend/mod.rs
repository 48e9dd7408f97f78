//! Handoff to the installer compiler.
//!
//! The builder never produces the installer executable itself. It renders the
//! validated manifest as a compiler script in the output directory and, when
//! asked, runs the compiler on it.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::manifest::paths::INSTALL_SEPARATOR;
use crate::manifest::{iss, PackageManifest, RawManifest};
use crate::output::OutputDir;

/// `<OutputBaseFilename>.iss`
pub fn script_file_name(manifest: &PackageManifest) -> String {
    format!("{}.iss", manifest.setup.output_base_filename)
}

/// `<OutputBaseFilename>.exe`, as the compiler names its result.
pub fn installer_file_name(manifest: &PackageManifest) -> String {
    format!("{}.exe", manifest.setup.output_base_filename)
}

/// Render the compiler script. Sources and the icon are written as absolute
/// paths and `OutputDir` points at `out_dir`, so the script compiles from any
/// working directory. Directory sources become `<dir>\*` patterns, which is
/// the only form the compiler accepts for them.
pub fn render_script(manifest: &PackageManifest, out_dir: &Path) -> String {
    let mut raw = RawManifest::from(manifest);
    for (raw_file, entry) in raw.files.iter_mut().zip(&manifest.files) {
        let source = entry.source_path.display();
        raw_file.source = Some(if entry.source_path.is_dir() {
            format!("{source}{INSTALL_SEPARATOR}*")
        } else {
            source.to_string()
        });
    }
    if let Some(icon_path) = &manifest.setup.icon_path {
        raw.setup.setup_icon_file = Some(icon_path.display().to_string());
    }
    raw.setup.output_dir = Some(out_dir.display().to_string());
    iss::render(&raw)
}

/// Write the compiler script into `out`.
pub fn write_script(manifest: &PackageManifest, out: &OutputDir) -> Result<PathBuf> {
    let script = render_script(manifest, out.root());
    out.write_atomic(&script_file_name(manifest), script.as_bytes())
}

/// Run `compiler` on `script` and return the produced installer.
pub fn compile(
    compiler: &Path,
    script: &Path,
    manifest: &PackageManifest,
    out: &OutputDir,
) -> Result<PathBuf> {
    let installer = out.path(&installer_file_name(manifest));
    // A leftover from an earlier build must not pass for this one's output.
    if installer.exists() {
        fs::remove_file(&installer)
            .with_context(|| format!("removing stale installer {}", installer.display()))?;
    }
    log::info!(
        "compiling {} with {}",
        script.display(),
        compiler.display()
    );

    let status = Command::new(compiler)
        .arg("/Q")
        .arg(format!("/O{}", out.root().display()))
        .arg(script)
        .status()
        .with_context(|| {
            format!(
                "running installer compiler '{}' on '{}'",
                compiler.display(),
                script.display()
            )
        })?;

    if !status.success() {
        bail!(
            "installer compiler failed for '{}' with status {status}",
            script.display()
        );
    }

    if !installer.is_file() {
        bail!(
            "installer compiler finished but the installer is missing: {}",
            installer.display()
        );
    }

    Ok(installer)
}
