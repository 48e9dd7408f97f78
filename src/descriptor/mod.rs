//! Build descriptor: the validated manifest as JSON, plus the digest of every
//! installed file.
//!
//! The descriptor is what the backend handoff is checked against: a later
//! build whose descriptor differs packaged different bytes.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::OffsetDateTime;

use crate::manifest::PackageManifest;
use crate::output::{sha256_file, OutputDir};

/// Bump when the JSON layout changes incompatibly.
pub const DESCRIPTOR_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDescriptor {
    pub schema_version: u32,
    pub built_at_utc: String,
    pub app_name: String,
    pub app_version: String,
    pub install_dir_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    pub output_base_filename: String,
    pub compression: String,
    pub solid_compression: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<DigestRecord>,
    pub files: Vec<FileRecord>,
    pub shortcuts: Vec<ShortcutRecord>,
}

/// A hashed file on the build host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestRecord {
    pub source_path: PathBuf,
    pub sha256: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub source: String,
    pub dest_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    pub installed: Vec<InstalledRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledRecord {
    pub install_path: String,
    #[serde(flatten)]
    pub digest: DigestRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutRecord {
    pub name: String,
    pub target: String,
    /// Index into `files` of the entry installing `target`.
    pub file_index: usize,
}

impl BuildDescriptor {
    /// Hash every installed file of `manifest`.
    pub fn from_manifest(manifest: &PackageManifest, built_at_utc: String) -> Result<Self> {
        let setup = &manifest.setup;

        let icon = match &setup.icon_path {
            Some(path) => Some(digest(path.clone())?),
            None => None,
        };

        let mut files = Vec::with_capacity(manifest.files.len());
        for entry in &manifest.files {
            let mut installed = Vec::with_capacity(entry.installed.len());
            for file in &entry.installed {
                log::debug!(
                    "hashing {} -> {}",
                    file.source_path.display(),
                    file.install_path
                );
                installed.push(InstalledRecord {
                    install_path: file.install_path.clone(),
                    digest: digest(file.source_path.clone())?,
                });
            }
            files.push(FileRecord {
                source: entry.source.clone(),
                dest_dir: entry.dest_dir.clone(),
                dest_name: entry.dest_name.clone(),
                flags: entry.flags.iter().map(|f| f.as_str().to_string()).collect(),
                installed,
            });
        }

        Ok(Self {
            schema_version: DESCRIPTOR_SCHEMA_VERSION,
            built_at_utc,
            app_name: setup.app_name.clone(),
            app_version: setup.app_version.clone(),
            install_dir_template: setup.install_dir_template.clone(),
            group_name: setup.group_name.clone(),
            output_base_filename: setup.output_base_filename.clone(),
            compression: setup.compression.to_string(),
            solid_compression: setup.solid_compression,
            icon,
            files,
            shortcuts: manifest
                .shortcuts
                .iter()
                .map(|shortcut| ShortcutRecord {
                    name: shortcut.name(),
                    target: shortcut.target.clone(),
                    file_index: shortcut.file_index,
                })
                .collect(),
        })
    }

    /// Total bytes across installed files.
    pub fn payload_bytes(&self) -> u64 {
        self.files
            .iter()
            .flat_map(|file| file.installed.iter())
            .map(|installed| installed.digest.size_bytes)
            .sum()
    }

    /// `<OutputBaseFilename>.descriptor.json`
    pub fn file_name(&self) -> String {
        format!("{}.descriptor.json", self.output_base_filename)
    }

    pub fn write(&self, out: &OutputDir) -> Result<PathBuf> {
        let bytes = serde_json::to_vec_pretty(self)?;
        out.write_atomic(&self.file_name(), &bytes)
    }
}

fn digest(source_path: PathBuf) -> Result<DigestRecord> {
    let (sha256, size_bytes) = sha256_file(&source_path)?;
    Ok(DigestRecord {
        source_path,
        sha256,
        size_bytes,
    })
}

/// UTC timestamp in compact ISO-8601 form, e.g. `20261016T093000Z`.
pub fn now_utc_compact() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}Z",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{load_manifest_str, ManifestFormat};
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
[setup]
app_name = "Johns Elbow"
app_version = "1.0"
default_dir_name = '{autopf}\Johns Elbow'
default_group_name = "Johns Elbow"
output_base_filename = "JohnsElbowSetup"

[[files]]
source = "dist/JohnsElbow.exe"
dest_dir = "{app}"
flags = ["ignoreversion"]

[[icons]]
name = "Johns Elbow"
target = '{app}\JohnsElbow.exe'
"#;

    #[test]
    fn descriptor_records_digests_and_shortcuts() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("dist")).unwrap();
        fs::write(tmp.path().join("dist/JohnsElbow.exe"), b"hello").unwrap();
        let manifest = load_manifest_str(MANIFEST, ManifestFormat::Toml, tmp.path()).unwrap();

        let descriptor =
            BuildDescriptor::from_manifest(&manifest, "20261016T000000Z".to_string()).unwrap();

        assert_eq!(descriptor.compression, "lzma2");
        assert_eq!(descriptor.files.len(), 1);
        let installed = &descriptor.files[0].installed[0];
        assert_eq!(installed.install_path, "{app}\\JohnsElbow.exe");
        assert_eq!(
            installed.digest.sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(descriptor.payload_bytes(), 5);
        assert_eq!(descriptor.shortcuts[0].name, "{group}\\Johns Elbow");
        assert_eq!(descriptor.shortcuts[0].file_index, 0);
    }

    #[test]
    fn descriptor_records_declared_rename() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("dist")).unwrap();
        fs::write(tmp.path().join("dist/JohnsElbow.exe"), b"MZ").unwrap();
        let text = MANIFEST
            .replace(
                "flags = [\"ignoreversion\"]",
                "dest_name = \"Elbow.exe\"\nflags = [\"ignoreversion\"]",
            )
            .replace("{app}\\JohnsElbow.exe", "{app}\\Elbow.exe");
        let manifest = load_manifest_str(&text, ManifestFormat::Toml, tmp.path()).unwrap();

        let descriptor = BuildDescriptor::from_manifest(&manifest, now_utc_compact()).unwrap();
        assert_eq!(descriptor.files[0].dest_name.as_deref(), Some("Elbow.exe"));
        assert_eq!(descriptor.files[0].installed[0].install_path, "{app}\\Elbow.exe");

        let json = serde_json::to_string(&descriptor).unwrap();
        assert!(json.contains("\"dest_name\":\"Elbow.exe\""));
    }

    #[test]
    fn written_descriptor_reads_back() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("dist")).unwrap();
        fs::write(tmp.path().join("dist/JohnsElbow.exe"), b"MZ").unwrap();
        let manifest = load_manifest_str(MANIFEST, ManifestFormat::Toml, tmp.path()).unwrap();
        let descriptor = BuildDescriptor::from_manifest(&manifest, now_utc_compact()).unwrap();

        let out = OutputDir::open(&tmp.path().join("out")).unwrap();
        let path = descriptor.write(&out).unwrap();
        assert!(path.ends_with("JohnsElbowSetup.descriptor.json"));

        let parsed: BuildDescriptor =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed, descriptor);
    }

    #[test]
    fn compact_timestamp_shape() {
        let stamp = now_utc_compact();
        assert_eq!(stamp.len(), 16);
        assert_eq!(&stamp[8..9], "T");
        assert!(stamp.ends_with('Z'));
    }
}
