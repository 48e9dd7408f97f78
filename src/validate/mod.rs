//! Manifest validation.
//!
//! Turns a [`RawManifest`] into a [`PackageManifest`]. Every check runs even
//! after earlier ones fail, so one pass reports everything the author has to
//! fix. The only side effects are filesystem reads for existence checks and
//! directory walks.

mod error;

pub use error::{ValidationError, ValidationErrors};

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::manifest::iss::{is_setup_key, parse_bool};
use crate::manifest::paths::{self, GROUP_TOKEN};
use crate::manifest::{
    Compression, FileEntry, FileFlag, InstalledFile, ManifestFormat, PackageManifest, RawFile,
    RawIcon, RawManifest, RawSetup, SetupInfo, ShortcutEntry,
};

/// Names fields the way the manifest's own encoding spells them.
struct Fields {
    format: ManifestFormat,
}

impl Fields {
    fn setup(&self, toml_key: &str, iss_key: &str) -> String {
        match self.format {
            ManifestFormat::Toml => format!("setup.{toml_key}"),
            ManifestFormat::Iss => format!("[Setup] {iss_key}"),
        }
    }

    fn file(&self, index: usize, toml_key: &str, iss_key: &str) -> String {
        match self.format {
            ManifestFormat::Toml => format!("files[{index}].{toml_key}"),
            ManifestFormat::Iss => format!("[Files] entry {}: {iss_key}", index + 1),
        }
    }

    fn icon(&self, index: usize, toml_key: &str, iss_key: &str) -> String {
        match self.format {
            ManifestFormat::Toml => format!("icons[{index}].{toml_key}"),
            ManifestFormat::Iss => format!("[Icons] entry {}: {iss_key}", index + 1),
        }
    }
}

/// Validate `raw`, resolving relative sources against `base_dir`.
pub fn validate(raw: &RawManifest, base_dir: &Path) -> Result<PackageManifest, ValidationErrors> {
    let fields = Fields { format: raw.format };
    let mut errors = Vec::new();

    let setup = validate_setup(&raw.setup, base_dir, &fields, &mut errors);
    let files = raw
        .files
        .iter()
        .enumerate()
        .map(|(index, file)| validate_file(index, file, base_dir, &fields, &mut errors))
        .collect::<Vec<_>>();
    let shortcuts = validate_shortcuts(
        &raw.icons,
        &files,
        setup.group_name.is_some(),
        &fields,
        &mut errors,
    );

    let errors = ValidationErrors::new(errors);
    if !errors.is_empty() {
        log::debug!("manifest rejected with {} error(s)", errors.len());
        return Err(errors);
    }

    Ok(PackageManifest {
        base_dir: base_dir.to_path_buf(),
        setup,
        files,
        shortcuts,
    })
}

fn required(value: Option<&str>, field: String, errors: &mut Vec<ValidationError>) -> String {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => {
            errors.push(ValidationError::MissingField { field });
            String::new()
        }
    }
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn is_plain_file_name(value: &str) -> bool {
    !paths::has_separator(value) && value != "." && value != ".."
}

fn validate_setup(
    raw: &RawSetup,
    base_dir: &Path,
    fields: &Fields,
    errors: &mut Vec<ValidationError>,
) -> SetupInfo {
    let app_name = required(
        raw.app_name.as_deref(),
        fields.setup("app_name", "AppName"),
        errors,
    );
    let app_version = required(
        raw.app_version.as_deref(),
        fields.setup("app_version", "AppVersion"),
        errors,
    );
    let install_dir_template = required(
        raw.default_dir_name.as_deref(),
        fields.setup("default_dir_name", "DefaultDirName"),
        errors,
    );

    let output_field = fields.setup("output_base_filename", "OutputBaseFilename");
    let output_base_filename = required(
        raw.output_base_filename.as_deref(),
        output_field.clone(),
        errors,
    );
    if !output_base_filename.is_empty() && !is_plain_file_name(&output_base_filename) {
        errors.push(ValidationError::InvalidOutputName {
            field: output_field,
            value: output_base_filename.clone(),
        });
    }

    let compression = match optional(raw.compression.as_deref()) {
        None => Compression::default(),
        Some(value) => Compression::parse(&value).unwrap_or_else(|| {
            errors.push(ValidationError::InvalidEnumValue {
                field: fields.setup("compression", "Compression"),
                value,
                expected: Compression::EXPECTED.to_string(),
            });
            Compression::default()
        }),
    };

    let solid_compression = match optional(raw.solid_compression.as_deref()) {
        None => false,
        Some(value) => parse_bool(&value).unwrap_or_else(|| {
            errors.push(ValidationError::InvalidBool {
                field: fields.setup("solid_compression", "SolidCompression"),
                value,
            });
            false
        }),
    };

    let icon = optional(raw.setup_icon_file.as_deref());
    let icon_path = icon.as_deref().map(|icon| {
        let path = paths::resolve_source(base_dir, icon);
        if !path.is_file() {
            errors.push(ValidationError::FileNotFound {
                field: fields.setup("setup_icon_file", "SetupIconFile"),
                path: path.clone(),
            });
        }
        path
    });

    for key in raw.directives.keys() {
        if is_setup_key(key) {
            errors.push(ValidationError::ReservedDirective {
                field: fields.setup(&format!("extra.{key}"), key),
                key: key.clone(),
            });
        }
    }

    SetupInfo {
        app_name,
        app_version,
        install_dir_template,
        group_name: optional(raw.default_group_name.as_deref()),
        output_base_filename,
        output_dir: optional(raw.output_dir.as_deref()),
        compression,
        solid_compression,
        icon,
        icon_path,
        directives: raw.directives.clone(),
    }
}

fn validate_file(
    index: usize,
    raw: &RawFile,
    base_dir: &Path,
    fields: &Fields,
    errors: &mut Vec<ValidationError>,
) -> FileEntry {
    let source_field = fields.file(index, "source", "Source");
    let source = required(raw.source.as_deref(), source_field.clone(), errors);

    let dest_field = fields.file(index, "dest_dir", "DestDir");
    let dest_dir = required(raw.dest_dir.as_deref(), dest_field.clone(), errors);
    let dest_relative = if dest_dir.is_empty() {
        None
    } else {
        let relative = paths::install_relative(&dest_dir);
        if relative.is_none() {
            errors.push(ValidationError::DestinationOutsideInstallRoot {
                field: dest_field,
                value: dest_dir.clone(),
            });
        }
        relative
    };

    let dest_name_field = fields.file(index, "dest_name", "DestName");
    let dest_name = optional(raw.dest_name.as_deref());
    if let Some(name) = &dest_name {
        if !is_plain_file_name(name) {
            errors.push(ValidationError::InvalidOutputName {
                field: dest_name_field.clone(),
                value: name.clone(),
            });
        }
    }

    let mut flags = BTreeSet::new();
    for raw_flag in &raw.flags {
        match FileFlag::parse(raw_flag) {
            Some(flag) => {
                flags.insert(flag);
            }
            None => errors.push(ValidationError::InvalidEnumValue {
                field: fields.file(index, "flags", "Flags"),
                value: raw_flag.clone(),
                expected: FileFlag::expected(),
            }),
        }
    }

    let wildcard = paths::wildcard_dir(&source);
    let source_path = if source.is_empty() {
        PathBuf::new()
    } else {
        paths::resolve_source(base_dir, wildcard.unwrap_or(&source))
    };
    let recursive = flags.contains(&FileFlag::RecurseSubdirs);

    let mut installed = Vec::new();
    if source.is_empty() {
        // Already reported as a missing field.
    } else if wildcard.is_some() || source_path.is_dir() {
        if !source_path.is_dir() {
            errors.push(ValidationError::FileNotFound {
                field: source_field,
                path: source_path.clone(),
            });
        } else if wildcard.is_none() && !recursive {
            errors.push(ValidationError::SourceIsDirectory {
                field: source_field,
                path: source_path.clone(),
            });
        } else if dest_name.is_some() {
            errors.push(ValidationError::DestNameOnDirectory {
                field: dest_name_field,
                path: source_path.clone(),
            });
        } else if let Some(relative) = &dest_relative {
            installed = expand_directory(&source_path, relative, recursive, &source_field, errors);
        }
    } else {
        if !source_path.is_file() {
            errors.push(ValidationError::FileNotFound {
                field: source_field,
                path: source_path.clone(),
            });
        }
        // A missing source still declares its destination, so shortcuts
        // pointing at it are not reported a second time.
        let name = dest_name
            .as_deref()
            .or_else(|| paths::file_name(&source))
            .map(str::to_string);
        if let (Some(relative), Some(name)) = (&dest_relative, name) {
            installed.push(InstalledFile {
                source_path: source_path.clone(),
                install_path: paths::install_path(relative.iter().chain([&name])),
            });
        }
    }

    FileEntry {
        source,
        source_path,
        dest_dir,
        dest_name,
        flags,
        installed,
    }
}

/// Every regular file below `dir`, installed under `relative` with its
/// sub-path kept. Only the top level is read unless `recursive` is set.
///
/// Entries the walk cannot read (broken links, unreadable folders) are
/// reported as missing files instead of being dropped.
fn expand_directory(
    dir: &Path,
    relative: &[String],
    recursive: bool,
    field: &str,
    errors: &mut Vec<ValidationError>,
) -> Vec<InstalledFile> {
    let mut walk = WalkDir::new(dir).follow_links(true).sort_by_file_name();
    if !recursive {
        walk = walk.max_depth(1);
    }

    let mut installed = Vec::new();
    for entry in walk {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                errors.push(ValidationError::FileNotFound {
                    field: field.to_string(),
                    path: err.path().unwrap_or(dir).to_path_buf(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(sub) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let parts = sub
            .components()
            .map(|part| part.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        installed.push(InstalledFile {
            source_path: entry.path().to_path_buf(),
            install_path: paths::install_path(relative.iter().chain(parts.iter())),
        });
    }

    if installed.is_empty() && !errors.iter().any(|e| e.field() == field) {
        errors.push(ValidationError::EmptySourceDirectory {
            field: field.to_string(),
            path: dir.to_path_buf(),
        });
    }
    installed
}

fn validate_shortcuts(
    icons: &[RawIcon],
    files: &[FileEntry],
    has_group_name: bool,
    fields: &Fields,
    errors: &mut Vec<ValidationError>,
) -> Vec<ShortcutEntry> {
    let mut providers: HashMap<String, BTreeSet<usize>> = HashMap::new();
    for (file_index, file) in files.iter().enumerate() {
        for installed in &file.installed {
            providers
                .entry(paths::install_key(&installed.install_path))
                .or_default()
                .insert(file_index);
        }
    }

    let mut group_reported = false;
    icons
        .iter()
        .enumerate()
        .map(|(index, icon)| {
            let display_name = required(
                icon.name.as_deref(),
                fields.icon(index, "name", "Name"),
                errors,
            );
            let group = optional(icon.group.as_deref()).unwrap_or_else(|| GROUP_TOKEN.to_string());
            if group.eq_ignore_ascii_case(GROUP_TOKEN) && !has_group_name && !group_reported {
                group_reported = true;
                errors.push(ValidationError::MissingField {
                    field: fields.setup("default_group_name", "DefaultGroupName"),
                });
            }

            let target_field = fields.icon(index, "target", "Filename");
            let target = required(icon.target.as_deref(), target_field.clone(), errors);
            let mut file_index = 0;
            if !target.is_empty() {
                let matches = providers.get(&paths::install_key(&target));
                match matches.map(|set| set.len()).unwrap_or(0) {
                    0 => errors.push(ValidationError::DanglingShortcutReference {
                        field: target_field,
                        target: target.clone(),
                    }),
                    1 => {
                        file_index = matches
                            .and_then(|set| set.iter().next().copied())
                            .unwrap_or(0);
                    }
                    count => errors.push(ValidationError::AmbiguousShortcutReference {
                        field: target_field,
                        target: target.clone(),
                        count,
                    }),
                }
            }

            ShortcutEntry {
                display_name,
                group,
                target,
                file_index,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{CompressionMode, RawFile, RawIcon};
    use std::fs;
    use tempfile::TempDir;

    fn johns_elbow() -> RawManifest {
        RawManifest {
            format: ManifestFormat::Toml,
            setup: RawSetup {
                app_name: Some("Johns Elbow".to_string()),
                app_version: Some("1.0".to_string()),
                default_dir_name: Some("{autopf}\\Johns Elbow".to_string()),
                default_group_name: Some("Johns Elbow".to_string()),
                output_base_filename: Some("JohnsElbowSetup".to_string()),
                compression: Some("lzma".to_string()),
                solid_compression: Some("yes".to_string()),
                ..RawSetup::default()
            },
            files: vec![RawFile {
                source: Some("dist/JohnsElbow.exe".to_string()),
                dest_dir: Some("{app}".to_string()),
                dest_name: None,
                flags: vec!["ignoreversion".to_string()],
            }],
            icons: vec![RawIcon {
                name: Some("Johns Elbow".to_string()),
                group: None,
                target: Some("{app}\\JohnsElbow.exe".to_string()),
            }],
        }
    }

    fn workspace_with_exe() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("dist")).unwrap();
        fs::write(tmp.path().join("dist/JohnsElbow.exe"), b"MZ").unwrap();
        tmp
    }

    #[test]
    fn valid_manifest_has_one_file_and_one_shortcut() {
        let tmp = workspace_with_exe();
        let manifest = validate(&johns_elbow(), tmp.path()).unwrap();

        assert_eq!(manifest.files.len(), 1);
        assert_eq!(manifest.shortcuts.len(), 1);
        assert_eq!(manifest.setup.compression.mode, CompressionMode::Lzma);
        assert!(manifest.setup.solid_compression);
        assert!(manifest.files[0].has_flag(FileFlag::IgnoreVersion));
        assert_eq!(
            manifest.files[0].installed[0].install_path,
            "{app}\\JohnsElbow.exe"
        );
        assert_eq!(
            manifest.files[0].source_path,
            tmp.path().join("dist").join("JohnsElbow.exe")
        );
        assert_eq!(manifest.shortcuts[0].group, "{group}");
        assert_eq!(manifest.shortcuts[0].file_index, 0);
        assert_eq!(manifest.shortcuts[0].name(), "{group}\\Johns Elbow");
    }

    #[test]
    fn missing_source_is_the_only_error() {
        let tmp = TempDir::new().unwrap();
        let errors = validate(&johns_elbow(), tmp.path()).unwrap_err().into_vec();

        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(matches!(
            &errors[0],
            ValidationError::FileNotFound { field, .. } if field == "files[0].source"
        ));
    }

    #[test]
    fn unknown_compression_names_the_field() {
        let tmp = workspace_with_exe();
        let mut raw = johns_elbow();
        raw.setup.compression = Some("unknown-codec".to_string());

        let errors = validate(&raw, tmp.path()).unwrap_err().into_vec();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ValidationError::InvalidEnumValue { field, value, .. }
                if field == "setup.compression" && value == "unknown-codec"
        ));
    }

    #[test]
    fn iss_manifests_report_iss_field_names() {
        let tmp = workspace_with_exe();
        let mut raw = johns_elbow();
        raw.format = ManifestFormat::Iss;
        raw.setup.compression = Some("unknown-codec".to_string());

        let errors = validate(&raw, tmp.path()).unwrap_err().into_vec();
        assert_eq!(errors[0].field(), "[Setup] Compression");
    }

    #[test]
    fn dangling_shortcut_is_reported() {
        let tmp = workspace_with_exe();
        let mut raw = johns_elbow();
        raw.icons[0].target = Some("{app}\\Missing.exe".to_string());

        let errors = validate(&raw, tmp.path()).unwrap_err().into_vec();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::DanglingShortcutReference { target, .. }] if target == "{app}\\Missing.exe"
        ));
    }

    #[test]
    fn shortcut_target_match_ignores_case_and_separator() {
        let tmp = workspace_with_exe();
        let mut raw = johns_elbow();
        raw.icons[0].target = Some("{APP}/johnselbow.exe".to_string());

        assert!(validate(&raw, tmp.path()).is_ok());
    }

    #[test]
    fn shortcut_matching_two_entries_is_ambiguous() {
        let tmp = workspace_with_exe();
        fs::create_dir_all(tmp.path().join("alt")).unwrap();
        fs::write(tmp.path().join("alt/JohnsElbow.exe"), b"MZ").unwrap();
        let mut raw = johns_elbow();
        raw.files.push(RawFile {
            source: Some("alt/JohnsElbow.exe".to_string()),
            dest_dir: Some("{app}".to_string()),
            ..RawFile::default()
        });

        let errors = validate(&raw, tmp.path()).unwrap_err().into_vec();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::AmbiguousShortcutReference { count: 2, .. }]
        ));
    }

    #[test]
    fn collects_every_error_in_one_pass() {
        let tmp = TempDir::new().unwrap();
        let mut raw = johns_elbow();
        raw.setup.app_name = None;
        raw.setup.output_base_filename = Some("out/Setup".to_string());
        raw.setup.compression = Some("rar".to_string());
        raw.files[0].flags.push("sparkly".to_string());
        raw.icons[0].target = Some("{app}\\Other.exe".to_string());

        let errors = validate(&raw, tmp.path()).unwrap_err().into_vec();
        let fields = errors.iter().map(|e| e.field()).collect::<Vec<_>>();
        assert_eq!(
            fields,
            vec![
                "setup.app_name",
                "setup.output_base_filename",
                "setup.compression",
                "files[0].flags",
                "files[0].source",
                "icons[0].target",
            ]
        );
    }

    #[test]
    fn destination_must_stay_under_app() {
        let tmp = workspace_with_exe();
        let mut raw = johns_elbow();
        raw.files[0].dest_dir = Some("{sys}".to_string());
        raw.icons.clear();

        let errors = validate(&raw, tmp.path()).unwrap_err().into_vec();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::DestinationOutsideInstallRoot { value, .. }] if value == "{sys}"
        ));
    }

    #[test]
    fn group_shortcut_requires_group_name() {
        let tmp = workspace_with_exe();
        let mut raw = johns_elbow();
        raw.setup.default_group_name = None;

        let errors = validate(&raw, tmp.path()).unwrap_err().into_vec();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::MissingField { field }] if field == "setup.default_group_name"
        ));
    }

    #[test]
    fn desktop_shortcut_does_not_need_group_name() {
        let tmp = workspace_with_exe();
        let mut raw = johns_elbow();
        raw.setup.default_group_name = None;
        raw.icons[0].group = Some("{autodesktop}".to_string());

        assert!(validate(&raw, tmp.path()).is_ok());
    }

    #[test]
    fn missing_icon_file_is_reported() {
        let tmp = workspace_with_exe();
        let mut raw = johns_elbow();
        raw.setup.setup_icon_file = Some("assets/app.ico".to_string());

        let errors = validate(&raw, tmp.path()).unwrap_err().into_vec();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::FileNotFound { field, .. }] if field == "setup.setup_icon_file"
        ));
    }

    #[test]
    fn directory_source_needs_recursesubdirs() {
        let tmp = workspace_with_exe();
        let mut raw = johns_elbow();
        raw.files[0].source = Some("dist".to_string());

        let errors = validate(&raw, tmp.path()).unwrap_err().into_vec();
        assert!(matches!(
            errors.first(),
            Some(ValidationError::SourceIsDirectory { .. })
        ));
    }

    #[test]
    fn directory_source_expands_every_file() {
        let tmp = workspace_with_exe();
        fs::create_dir_all(tmp.path().join("dist/data")).unwrap();
        fs::write(tmp.path().join("dist/data/levels.json"), b"{}").unwrap();
        let mut raw = johns_elbow();
        raw.files[0].source = Some("dist".to_string());
        raw.files[0].dest_dir = Some("{app}\\bin".to_string());
        raw.files[0].flags.push("recursesubdirs".to_string());
        raw.icons[0].target = Some("{app}\\bin\\JohnsElbow.exe".to_string());

        let manifest = validate(&raw, tmp.path()).unwrap();
        let installed = manifest.files[0]
            .installed
            .iter()
            .map(|file| file.install_path.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            installed,
            vec!["{app}\\bin\\JohnsElbow.exe", "{app}\\bin\\data\\levels.json"]
        );
    }

    #[test]
    fn wildcard_source_installs_top_level_files_only() {
        let tmp = workspace_with_exe();
        fs::create_dir_all(tmp.path().join("dist/data")).unwrap();
        fs::write(tmp.path().join("dist/data/levels.json"), b"{}").unwrap();
        let mut raw = johns_elbow();
        raw.files[0].source = Some("dist\\*".to_string());

        let manifest = validate(&raw, tmp.path()).unwrap();
        assert_eq!(manifest.files[0].source_path, tmp.path().join("dist"));
        assert_eq!(manifest.files[0].installed.len(), 1);
        assert_eq!(
            manifest.files[0].installed[0].install_path,
            "{app}\\JohnsElbow.exe"
        );
    }

    #[test]
    #[cfg(unix)]
    fn unreadable_directory_entry_is_reported() {
        let tmp = workspace_with_exe();
        std::os::unix::fs::symlink(
            tmp.path().join("dist/missing.dll"),
            tmp.path().join("dist/core.dll"),
        )
        .unwrap();
        let mut raw = johns_elbow();
        raw.files[0].source = Some("dist".to_string());
        raw.files[0].flags.push("recursesubdirs".to_string());

        let errors = validate(&raw, tmp.path()).unwrap_err().into_vec();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::FileNotFound { field, path }]
                if field == "files[0].source" && path.ends_with("core.dll")
        ));
    }

    #[test]
    fn empty_directory_source_is_reported() {
        let tmp = workspace_with_exe();
        fs::create_dir_all(tmp.path().join("assets")).unwrap();
        let mut raw = johns_elbow();
        raw.files.push(RawFile {
            source: Some("assets".to_string()),
            dest_dir: Some("{app}\\assets".to_string()),
            flags: vec!["recursesubdirs".to_string()],
            ..RawFile::default()
        });

        let errors = validate(&raw, tmp.path()).unwrap_err().into_vec();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::EmptySourceDirectory { field, .. }] if field == "files[1].source"
        ));
    }

    #[test]
    fn pass_through_directive_cannot_shadow_setup_keys() {
        let tmp = workspace_with_exe();
        let mut raw = johns_elbow();
        raw.setup
            .directives
            .insert("OutputBaseFilename".to_string(), "..\\..\\evil".to_string());
        raw.setup
            .directives
            .insert("appname".to_string(), "Other".to_string());
        raw.setup
            .directives
            .insert("AppPublisher".to_string(), "Elbow Works".to_string());

        let errors = validate(&raw, tmp.path()).unwrap_err().into_vec();
        let fields = errors.iter().map(|e| e.field()).collect::<Vec<_>>();
        assert_eq!(
            fields,
            vec!["setup.extra.OutputBaseFilename", "setup.extra.appname"]
        );
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::ReservedDirective { .. })));
    }

    #[test]
    fn dest_name_renames_installed_file() {
        let tmp = workspace_with_exe();
        let mut raw = johns_elbow();
        raw.files[0].dest_name = Some("Elbow.exe".to_string());
        raw.icons[0].target = Some("{app}\\Elbow.exe".to_string());

        let manifest = validate(&raw, tmp.path()).unwrap();
        assert_eq!(manifest.files[0].installed[0].install_path, "{app}\\Elbow.exe");
    }

    #[test]
    fn solid_compression_must_be_yes_or_no() {
        let tmp = workspace_with_exe();
        let mut raw = johns_elbow();
        raw.setup.solid_compression = Some("maybe".to_string());

        let errors = validate(&raw, tmp.path()).unwrap_err().into_vec();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::InvalidBool { .. }]
        ));
    }
}
