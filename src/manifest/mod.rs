//! Package manifest model and loading.
//!
//! A manifest is read from one of two encodings into a format-neutral
//! [`RawManifest`], then validated into an immutable [`PackageManifest`]:
//!
//! ```text
//! setup.toml ──┐
//!              ├── RawManifest ── validate() ── PackageManifest
//! setup.iss ───┘
//! ```
//!
//! Every validated manifest can be turned back into a [`RawManifest`] and
//! re-serialized in either encoding.

pub mod iss;
pub mod paths;
pub mod toml_format;

use anyhow::{bail, Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::validate::validate;

/// Manifest text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// `[setup]`, `[[files]]`, `[[icons]]` tables.
    Toml,
    /// Inno-style `[Setup]`, `[Files]`, `[Icons]` sections.
    Iss,
}

impl ManifestFormat {
    /// Pick the encoding from a manifest file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("iss") => Ok(Self::Iss),
            _ => bail!(
                "unsupported manifest '{}'; expected a .toml or .iss file",
                path.display()
            ),
        }
    }
}

/// Compression method handed to the installer compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMode {
    None,
    Zip,
    Bzip,
    Lzma,
    Lzma2,
}

impl CompressionMode {
    pub const ALL: &'static [CompressionMode] = &[
        CompressionMode::None,
        CompressionMode::Zip,
        CompressionMode::Bzip,
        CompressionMode::Lzma,
        CompressionMode::Lzma2,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zip => "zip",
            Self::Bzip => "bzip",
            Self::Lzma => "lzma",
            Self::Lzma2 => "lzma2",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(raw))
    }
}

/// Optional strength suffix (`lzma2/max`, `zip/9`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionLevel {
    /// `zip` and `bzip` take 1-9.
    Numeric(u8),
    Fast,
    Normal,
    Max,
    Ultra,
    Ultra64,
}

impl CompressionLevel {
    const NAMED: &'static [(&'static str, CompressionLevel)] = &[
        ("fast", CompressionLevel::Fast),
        ("normal", CompressionLevel::Normal),
        ("max", CompressionLevel::Max),
        ("ultra", CompressionLevel::Ultra),
        ("ultra64", CompressionLevel::Ultra64),
    ];
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            named => {
                let name = Self::NAMED
                    .iter()
                    .find(|(_, level)| level == named)
                    .map(|(name, _)| *name)
                    .unwrap_or("normal");
                f.write_str(name)
            }
        }
    }
}

/// Compression setting: method plus optional level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Compression {
    pub mode: CompressionMode,
    pub level: Option<CompressionLevel>,
}

impl Default for Compression {
    fn default() -> Self {
        Self {
            mode: CompressionMode::Lzma2,
            level: None,
        }
    }
}

impl Compression {
    /// Accepted spellings, for error messages.
    pub const EXPECTED: &'static str =
        "none, zip[/1-9], bzip[/1-9], lzma[/fast|normal|max|ultra|ultra64], lzma2[/fast|normal|max|ultra|ultra64]";

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (mode_raw, level_raw) = match raw.split_once('/') {
            Some((mode, level)) => (mode, Some(level.trim())),
            None => (raw, None),
        };
        let mode = CompressionMode::parse(mode_raw.trim())?;
        let level = match (mode, level_raw) {
            (_, None) => None,
            (CompressionMode::None, Some(_)) => return None,
            (CompressionMode::Zip | CompressionMode::Bzip, Some(level)) => {
                let n: u8 = level.parse().ok()?;
                if !(1..=9).contains(&n) {
                    return None;
                }
                Some(CompressionLevel::Numeric(n))
            }
            (CompressionMode::Lzma | CompressionMode::Lzma2, Some(level)) => {
                let found = CompressionLevel::NAMED
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(level))?;
                Some(found.1)
            }
        };
        Some(Self { mode, level })
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mode.as_str())?;
        if let Some(level) = self.level {
            write!(f, "/{level}")?;
        }
        Ok(())
    }
}

/// Per-file install flags understood by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileFlag {
    IgnoreVersion,
    RecurseSubdirs,
    CreateAllSubdirs,
    OnlyIfDoesntExist,
    ConfirmOverwrite,
    PromptIfOlder,
}

impl FileFlag {
    pub const ALL: &'static [FileFlag] = &[
        FileFlag::IgnoreVersion,
        FileFlag::RecurseSubdirs,
        FileFlag::CreateAllSubdirs,
        FileFlag::OnlyIfDoesntExist,
        FileFlag::ConfirmOverwrite,
        FileFlag::PromptIfOlder,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::IgnoreVersion => "ignoreversion",
            Self::RecurseSubdirs => "recursesubdirs",
            Self::CreateAllSubdirs => "createallsubdirs",
            Self::OnlyIfDoesntExist => "onlyifdoesntexist",
            Self::ConfirmOverwrite => "confirmoverwrite",
            Self::PromptIfOlder => "promptifolder",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|flag| flag.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    pub fn expected() -> String {
        Self::ALL
            .iter()
            .map(|flag| flag.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Setup metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupInfo {
    pub app_name: String,
    pub app_version: String,
    /// Default install directory, e.g. `{autopf}\Johns Elbow`.
    pub install_dir_template: String,
    /// Start-menu group; required once any shortcut lives in `{group}`.
    pub group_name: Option<String>,
    pub output_base_filename: String,
    pub output_dir: Option<String>,
    pub compression: Compression,
    pub solid_compression: bool,
    /// Icon path as declared.
    pub icon: Option<String>,
    /// Icon path resolved against the manifest directory.
    pub icon_path: Option<PathBuf>,
    /// Setup directives passed through to the backend untouched.
    pub directives: BTreeMap<String, String>,
}

/// One file as it lands on the target machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledFile {
    /// Absolute path on the build host.
    pub source_path: PathBuf,
    /// Installed path, e.g. `{app}\JohnsElbow.exe`.
    pub install_path: String,
}

/// A packaged source, which may expand to several installed files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Source as declared in the manifest.
    pub source: String,
    pub source_path: PathBuf,
    pub dest_dir: String,
    pub dest_name: Option<String>,
    pub flags: BTreeSet<FileFlag>,
    pub installed: Vec<InstalledFile>,
}

impl FileEntry {
    pub fn has_flag(&self, flag: FileFlag) -> bool {
        self.flags.contains(&flag)
    }
}

/// A menu or desktop shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutEntry {
    pub display_name: String,
    /// Location token, usually `{group}`.
    pub group: String,
    /// Installed path the shortcut launches.
    pub target: String,
    /// Index into [`PackageManifest::files`] of the entry providing `target`.
    pub file_index: usize,
}

impl ShortcutEntry {
    /// Full shortcut name as the backend expects it.
    pub fn name(&self) -> String {
        format!("{}{}{}", self.group, paths::INSTALL_SEPARATOR, self.display_name)
    }
}

/// A validated manifest. Built once per invocation and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    /// Directory relative sources were resolved against.
    pub base_dir: PathBuf,
    pub setup: SetupInfo,
    pub files: Vec<FileEntry>,
    pub shortcuts: Vec<ShortcutEntry>,
}

impl PackageManifest {
    /// Every installed file across all entries, in declaration order.
    pub fn installed_files(&self) -> impl Iterator<Item = (&FileEntry, &InstalledFile)> {
        self.files
            .iter()
            .flat_map(|entry| entry.installed.iter().map(move |file| (entry, file)))
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml_format::to_string(&RawManifest::from(self))
    }

    /// Serialize back to an Inno-style script.
    pub fn to_iss_string(&self) -> String {
        iss::render(&RawManifest::from(self))
    }
}

/// Format-neutral manifest exactly as written, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawManifest {
    pub format: ManifestFormat,
    pub setup: RawSetup,
    pub files: Vec<RawFile>,
    pub icons: Vec<RawIcon>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSetup {
    pub app_name: Option<String>,
    pub app_version: Option<String>,
    pub default_dir_name: Option<String>,
    pub default_group_name: Option<String>,
    pub output_base_filename: Option<String>,
    pub output_dir: Option<String>,
    pub compression: Option<String>,
    pub solid_compression: Option<String>,
    pub setup_icon_file: Option<String>,
    pub directives: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFile {
    pub source: Option<String>,
    pub dest_dir: Option<String>,
    pub dest_name: Option<String>,
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawIcon {
    pub name: Option<String>,
    pub group: Option<String>,
    pub target: Option<String>,
}

impl From<&PackageManifest> for RawManifest {
    fn from(manifest: &PackageManifest) -> Self {
        let setup = &manifest.setup;
        RawManifest {
            format: ManifestFormat::Toml,
            setup: RawSetup {
                app_name: Some(setup.app_name.clone()),
                app_version: Some(setup.app_version.clone()),
                default_dir_name: Some(setup.install_dir_template.clone()),
                default_group_name: setup.group_name.clone(),
                output_base_filename: Some(setup.output_base_filename.clone()),
                output_dir: setup.output_dir.clone(),
                compression: Some(setup.compression.to_string()),
                solid_compression: Some(yes_no(setup.solid_compression).to_string()),
                setup_icon_file: setup.icon.clone(),
                directives: setup.directives.clone(),
            },
            files: manifest
                .files
                .iter()
                .map(|file| RawFile {
                    source: Some(file.source.clone()),
                    dest_dir: Some(file.dest_dir.clone()),
                    dest_name: file.dest_name.clone(),
                    flags: file.flags.iter().map(|f| f.as_str().to_string()).collect(),
                })
                .collect(),
            icons: manifest
                .shortcuts
                .iter()
                .map(|shortcut| RawIcon {
                    name: Some(shortcut.display_name.clone()),
                    group: Some(shortcut.group.clone()),
                    target: Some(shortcut.target.clone()),
                })
                .collect(),
        }
    }
}

pub(crate) fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Parse manifest text without validating it.
pub fn parse_manifest(text: &str, format: ManifestFormat) -> Result<RawManifest> {
    match format {
        ManifestFormat::Toml => toml_format::parse(text),
        ManifestFormat::Iss => iss::parse(text),
    }
}

/// Parse and validate manifest text, resolving sources against `base_dir`.
///
/// Validation failures come back as a [`crate::ValidationErrors`] inside the
/// `anyhow::Error`; recover them with `downcast_ref`.
pub fn load_manifest_str(
    text: &str,
    format: ManifestFormat,
    base_dir: &Path,
) -> Result<PackageManifest> {
    let raw = parse_manifest(text, format)?;
    Ok(validate(&raw, base_dir)?)
}

/// Read, parse and validate a manifest file. Relative sources resolve against
/// the manifest's directory.
pub fn load_manifest(path: &Path) -> Result<PackageManifest> {
    let format = ManifestFormat::from_path(path)?;
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading manifest '{}'", path.display()))?;
    let raw = parse_manifest(&text, format)
        .with_context(|| format!("parsing manifest '{}'", path.display()))?;

    let base_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().context("resolving current directory")?,
    };
    log::debug!(
        "validating manifest '{}' against '{}'",
        path.display(),
        base_dir.display()
    );
    Ok(validate(&raw, &base_dir)?)
}
