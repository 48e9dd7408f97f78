//! One-shot build: manifest in, descriptor and compiler script out.
//!
//! ```text
//! load_manifest ─ validate ─┬─ descriptor.json
//!                           ├─ <name>.iss
//!                           ├─ <name>.payload.tar[.zst]   (--payload)
//!                           └─ compiler ─ <name>.exe      (--compile)
//! ```

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::backend;
use crate::descriptor::{now_utc_compact, BuildDescriptor};
use crate::manifest::{load_manifest, PackageManifest};
use crate::output::OutputDir;
use crate::payload::{stage_payload, PayloadSummary};
use crate::preflight::resolve_compiler;

/// What a build emits beyond the descriptor and script.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Stage the installed layout as a tar archive.
    pub payload: bool,
    /// Run the installer compiler on the rendered script.
    pub compile: bool,
    /// Explicit compiler binary; otherwise resolved by [`resolve_compiler`].
    pub compiler: Option<PathBuf>,
}

/// Everything a build wrote.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub manifest: PackageManifest,
    pub descriptor: BuildDescriptor,
    pub descriptor_path: PathBuf,
    pub script_path: PathBuf,
    pub payload: Option<PayloadSummary>,
    pub installer: Option<PathBuf>,
}

/// Validate a manifest without writing anything.
pub fn check(manifest_path: &Path) -> Result<PackageManifest> {
    load_manifest(manifest_path)
}

/// Build the manifest at `manifest_path` into `out_dir`.
///
/// Nothing is written when the manifest fails validation.
pub fn build(manifest_path: &Path, out_dir: &Path, options: &BuildOptions) -> Result<BuildReport> {
    let manifest = load_manifest(manifest_path)?;
    log::info!(
        "manifest '{}' is valid: {} {} ({} files, {} shortcuts)",
        manifest_path.display(),
        manifest.setup.app_name,
        manifest.setup.app_version,
        manifest.files.len(),
        manifest.shortcuts.len()
    );

    let compiler = if options.compile {
        Some(match &options.compiler {
            Some(path) if path.is_file() => path.clone(),
            Some(path) => bail!("installer compiler '{}' is not a file", path.display()),
            None => resolve_compiler()?,
        })
    } else {
        None
    };

    let out = OutputDir::open(out_dir)?;
    let _lock = out.lock()?;

    let descriptor = BuildDescriptor::from_manifest(&manifest, now_utc_compact())
        .context("hashing packaged files")?;
    let descriptor_path = descriptor.write(&out)?;
    log::info!("wrote descriptor {}", descriptor_path.display());

    let script_path = backend::write_script(&manifest, &out)?;
    log::info!("wrote compiler script {}", script_path.display());

    let payload = if options.payload {
        Some(stage_payload(&manifest, &out).context("staging payload")?)
    } else {
        None
    };

    let installer = match compiler {
        Some(compiler) => Some(backend::compile(&compiler, &script_path, &manifest, &out)?),
        None => None,
    };

    Ok(BuildReport {
        manifest,
        descriptor,
        descriptor_path,
        script_path,
        payload,
        installer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{ValidationError, ValidationErrors};
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
[setup]
app_name = "Johns Elbow"
app_version = "1.0"
default_dir_name = '{autopf}\Johns Elbow'
default_group_name = "Johns Elbow"
output_base_filename = "JohnsElbowSetup"
compression = "lzma"
solid_compression = true

[[files]]
source = "dist/JohnsElbow.exe"
dest_dir = "{app}"
flags = ["ignoreversion"]

[[icons]]
name = "Johns Elbow"
target = '{app}\JohnsElbow.exe'
"#;

    fn project(with_exe: bool) -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("setup.toml"), MANIFEST).unwrap();
        if with_exe {
            fs::create_dir_all(tmp.path().join("dist")).unwrap();
            fs::write(tmp.path().join("dist/JohnsElbow.exe"), b"MZ").unwrap();
        }
        tmp
    }

    #[test]
    fn build_writes_descriptor_and_script() {
        let tmp = project(true);
        let out_dir = tmp.path().join("out");

        let report = build(
            &tmp.path().join("setup.toml"),
            &out_dir,
            &BuildOptions::default(),
        )
        .unwrap();

        assert_eq!(report.descriptor_path, out_dir.join("JohnsElbowSetup.descriptor.json"));
        assert_eq!(report.script_path, out_dir.join("JohnsElbowSetup.iss"));
        assert!(report.descriptor_path.is_file());
        assert!(report.script_path.is_file());
        assert!(report.payload.is_none());
        assert!(report.installer.is_none());
        assert_eq!(report.descriptor.files.len(), 1);
    }

    #[test]
    fn build_with_payload() {
        let tmp = project(true);
        let options = BuildOptions {
            payload: true,
            ..BuildOptions::default()
        };

        let report = build(&tmp.path().join("setup.toml"), &tmp.path().join("out"), &options)
            .unwrap();
        let payload = report.payload.unwrap();
        assert_eq!(payload.entries, 1);
        assert!(payload.path.is_file());
    }

    #[test]
    fn invalid_manifest_writes_nothing() {
        let tmp = project(false);
        let out_dir = tmp.path().join("out");

        let err = build(
            &tmp.path().join("setup.toml"),
            &out_dir,
            &BuildOptions::default(),
        )
        .unwrap_err();

        let errors = err.downcast_ref::<ValidationErrors>().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors.iter().next(),
            Some(ValidationError::FileNotFound { .. })
        ));
        assert!(!out_dir.exists());
    }

    #[test]
    fn compile_with_missing_explicit_compiler_fails_before_writing() {
        let tmp = project(true);
        let out_dir = tmp.path().join("out");
        let options = BuildOptions {
            compile: true,
            compiler: Some(tmp.path().join("no-such-iscc")),
            ..BuildOptions::default()
        };

        let err = build(&tmp.path().join("setup.toml"), &out_dir, &options).unwrap_err();
        assert!(err.to_string().contains("no-such-iscc"));
        assert!(!out_dir.exists());
    }

    #[test]
    fn check_does_not_touch_output() {
        let tmp = project(true);
        let manifest = check(&tmp.path().join("setup.toml")).unwrap();
        assert_eq!(manifest.files.len(), 1);
        assert_eq!(manifest.shortcuts.len(), 1);
    }
}
