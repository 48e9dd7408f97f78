//! Payload staging.
//!
//! Writes the installed layout as a tar archive: every installed file under
//! its path below `{app}`, in sorted order with zeroed ownership and
//! timestamps, so the same inputs always produce the same bytes. The archive
//! is zstd-compressed unless the manifest asks for no compression.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tar::Builder as TarBuilder;

use crate::manifest::paths::segments;
use crate::manifest::{CompressionLevel, CompressionMode, FileFlag, PackageManifest};
use crate::output::{sha256_file, OutputDir};

/// zstd level when the manifest gives none.
const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// A written payload archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSummary {
    pub path: PathBuf,
    pub entries: usize,
    pub sha256: String,
    pub size_bytes: u64,
}

/// Archive entry name for an installed path: `{app}\bin\x.dll` -> `bin/x.dll`.
fn archive_path(install_path: &str) -> String {
    segments(install_path)
        .into_iter()
        .skip(1)
        .collect::<Vec<_>>()
        .join("/")
}

/// Installed layout in archive order. Later entries replace earlier ones at
/// the same path unless they are flagged `onlyifdoesntexist`.
fn layout(manifest: &PackageManifest) -> BTreeMap<String, PathBuf> {
    let mut by_key: BTreeMap<String, (String, PathBuf)> = BTreeMap::new();
    for (entry, file) in manifest.installed_files() {
        let name = archive_path(&file.install_path);
        let key = name.to_ascii_lowercase();
        if by_key.contains_key(&key) && entry.has_flag(FileFlag::OnlyIfDoesntExist) {
            log::debug!("keeping earlier {name}; '{}' is onlyifdoesntexist", entry.source);
            continue;
        }
        by_key.insert(key, (name, file.source_path.clone()));
    }
    by_key.into_values().collect()
}

fn zstd_level(level: Option<CompressionLevel>) -> i32 {
    match level {
        None | Some(CompressionLevel::Normal) => DEFAULT_ZSTD_LEVEL,
        Some(CompressionLevel::Fast) => 1,
        Some(CompressionLevel::Max) => 19,
        Some(CompressionLevel::Ultra) => 21,
        Some(CompressionLevel::Ultra64) => 22,
        Some(CompressionLevel::Numeric(n)) => i32::from(n),
    }
}

/// `<OutputBaseFilename>.payload.tar[.zst]`
pub fn payload_file_name(manifest: &PackageManifest) -> String {
    let ext = match manifest.setup.compression.mode {
        CompressionMode::None => "tar",
        _ => "tar.zst",
    };
    format!("{}.payload.{ext}", manifest.setup.output_base_filename)
}

/// Stage the installed layout of `manifest` into `out`.
pub fn stage_payload(manifest: &PackageManifest, out: &OutputDir) -> Result<PayloadSummary> {
    let name = payload_file_name(manifest);
    let files = layout(manifest);
    let tmp = out.tmp_path(&name);

    let file = File::create(&tmp).with_context(|| format!("creating '{}'", tmp.display()))?;
    match manifest.setup.compression.mode {
        CompressionMode::None => {
            let builder = write_entries(TarBuilder::new(file), &files)?;
            builder
                .into_inner()
                .context("finalizing tar archive")?
                .flush()?;
        }
        _ => {
            let level = zstd_level(manifest.setup.compression.level);
            let encoder = zstd::stream::Encoder::new(file, level)?;
            let builder = write_entries(TarBuilder::new(encoder), &files)?;
            let encoder = builder.into_inner().context("finalizing tar archive")?;
            encoder.finish()?;
        }
    }

    let path = out.commit(&tmp, &name)?;
    let (sha256, size_bytes) = sha256_file(&path)?;
    log::info!(
        "staged payload {} ({} files, {} bytes)",
        path.display(),
        files.len(),
        size_bytes
    );
    Ok(PayloadSummary {
        path,
        entries: files.len(),
        sha256,
        size_bytes,
    })
}

fn write_entries<W: Write>(
    mut builder: TarBuilder<W>,
    files: &BTreeMap<String, PathBuf>,
) -> Result<TarBuilder<W>> {
    for (name, source) in files {
        append_file(&mut builder, name, source)
            .with_context(|| format!("adding '{}' as '{name}'", source.display()))?;
    }
    Ok(builder)
}

fn append_file<W: Write>(builder: &mut TarBuilder<W>, name: &str, source: &Path) -> Result<()> {
    let md = fs::metadata(source)?;
    let mut f = File::open(source)?;
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(md.len());
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        header.set_mode(md.permissions().mode());
    }
    #[cfg(not(unix))]
    {
        header.set_mode(0o644);
    }
    header.set_cksum();
    builder.append_data(&mut header, name, &mut f)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{load_manifest_str, ManifestFormat};
    use std::io::Read;
    use tempfile::TempDir;

    fn fixture(compression: &str) -> (TempDir, PackageManifest) {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("dist/data")).unwrap();
        fs::write(tmp.path().join("dist/JohnsElbow.exe"), b"MZ-new").unwrap();
        fs::write(tmp.path().join("dist/data/levels.json"), b"{}").unwrap();
        fs::write(tmp.path().join("old.exe"), b"MZ-old").unwrap();
        fs::write(tmp.path().join("readme.txt"), b"hi").unwrap();

        let text = format!(
            r#"
[setup]
app_name = "Johns Elbow"
app_version = "1.0"
default_dir_name = '{{autopf}}\Johns Elbow'
output_base_filename = "JohnsElbowSetup"
compression = "{compression}"

[[files]]
source = "dist"
dest_dir = "{{app}}"
flags = ["recursesubdirs"]

[[files]]
source = "old.exe"
dest_dir = "{{app}}"
dest_name = "JohnsElbow.exe"
flags = ["onlyifdoesntexist"]

[[files]]
source = "readme.txt"
dest_dir = '{{app}}\docs'
"#
        );
        let manifest = load_manifest_str(&text, ManifestFormat::Toml, tmp.path()).unwrap();
        (tmp, manifest)
    }

    fn read_entries<R: Read>(archive: R) -> Vec<(String, Vec<u8>)> {
        let mut archive = tar::Archive::new(archive);
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let name = entry.path().unwrap().to_string_lossy().into_owned();
                let mut bytes = Vec::new();
                entry.read_to_end(&mut bytes).unwrap();
                (name, bytes)
            })
            .collect()
    }

    #[test]
    fn archive_path_drops_app_token() {
        assert_eq!(archive_path("{app}\\bin\\x.dll"), "bin/x.dll");
        assert_eq!(archive_path("{app}\\JohnsElbow.exe"), "JohnsElbow.exe");
    }

    #[test]
    fn zstd_payload_holds_sorted_layout() {
        let (tmp, manifest) = fixture("lzma2/max");
        let out = OutputDir::open(&tmp.path().join("out")).unwrap();

        let summary = stage_payload(&manifest, &out).unwrap();
        assert!(summary.path.ends_with("JohnsElbowSetup.payload.tar.zst"));
        assert_eq!(summary.entries, 3);

        let decoder = zstd::stream::Decoder::new(File::open(&summary.path).unwrap()).unwrap();
        let entries = read_entries(decoder);
        let names = entries.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["JohnsElbow.exe", "data/levels.json", "docs/readme.txt"]
        );
        // onlyifdoesntexist must not replace the earlier file.
        assert_eq!(entries[0].1, b"MZ-new");
    }

    #[test]
    fn uncompressed_payload_is_plain_tar() {
        let (tmp, manifest) = fixture("none");
        let out = OutputDir::open(&tmp.path().join("out")).unwrap();

        let summary = stage_payload(&manifest, &out).unwrap();
        assert!(summary.path.ends_with("JohnsElbowSetup.payload.tar"));
        let entries = read_entries(File::open(&summary.path).unwrap());
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn staging_is_deterministic() {
        let (tmp, manifest) = fixture("zip/9");
        let first = stage_payload(&manifest, &OutputDir::open(&tmp.path().join("a")).unwrap())
            .unwrap();
        let second = stage_payload(&manifest, &OutputDir::open(&tmp.path().join("b")).unwrap())
            .unwrap();
        assert_eq!(first.sha256, second.sha256);
    }
}
