//! TOML manifest encoding.
//!
//! ```toml
//! [setup]
//! app_name = "Johns Elbow"
//! app_version = "1.0"
//! default_dir_name = "{autopf}\\Johns Elbow"
//! default_group_name = "Johns Elbow"
//! output_base_filename = "JohnsElbowSetup"
//! compression = "lzma"
//! solid_compression = true
//!
//! [[files]]
//! source = "dist/JohnsElbow.exe"
//! dest_dir = "{app}"
//! flags = ["ignoreversion"]
//!
//! [[icons]]
//! name = "Johns Elbow"
//! target = "{app}\\JohnsElbow.exe"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ManifestFormat, RawFile, RawIcon, RawManifest, RawSetup};

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ManifestToml {
    #[serde(default)]
    setup: SetupToml,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    files: Vec<FileToml>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    icons: Vec<IconToml>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct SetupToml {
    #[serde(skip_serializing_if = "Option::is_none")]
    app_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_dir_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_base_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    solid_compression: Option<SolidToml>,
    #[serde(skip_serializing_if = "Option::is_none")]
    setup_icon_file: Option<String>,
    /// Directives forwarded verbatim to the backend script.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    extra: BTreeMap<String, String>,
}

/// `solid_compression` accepts a TOML boolean or a `"yes"`/`"no"` string.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum SolidToml {
    Bool(bool),
    Text(String),
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct FileToml {
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dest_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dest_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    flags: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct IconToml {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
}

pub(crate) fn parse(text: &str) -> Result<RawManifest> {
    let parsed: ManifestToml = toml::from_str(text).context("invalid TOML manifest")?;
    let setup = parsed.setup;

    Ok(RawManifest {
        format: ManifestFormat::Toml,
        setup: RawSetup {
            app_name: setup.app_name,
            app_version: setup.app_version,
            default_dir_name: setup.default_dir_name,
            default_group_name: setup.default_group_name,
            output_base_filename: setup.output_base_filename,
            output_dir: setup.output_dir,
            compression: setup.compression,
            solid_compression: setup.solid_compression.map(|value| match value {
                SolidToml::Bool(flag) => super::yes_no(flag).to_string(),
                SolidToml::Text(text) => text,
            }),
            setup_icon_file: setup.setup_icon_file,
            directives: setup.extra,
        },
        files: parsed
            .files
            .into_iter()
            .map(|file| RawFile {
                source: file.source,
                dest_dir: file.dest_dir,
                dest_name: file.dest_name,
                flags: file.flags,
            })
            .collect(),
        icons: parsed
            .icons
            .into_iter()
            .map(|icon| RawIcon {
                name: icon.name,
                group: icon.group,
                target: icon.target,
            })
            .collect(),
    })
}

pub(crate) fn to_string(raw: &RawManifest) -> Result<String> {
    let setup = &raw.setup;
    let doc = ManifestToml {
        setup: SetupToml {
            app_name: setup.app_name.clone(),
            app_version: setup.app_version.clone(),
            default_dir_name: setup.default_dir_name.clone(),
            default_group_name: setup.default_group_name.clone(),
            output_base_filename: setup.output_base_filename.clone(),
            output_dir: setup.output_dir.clone(),
            compression: setup.compression.clone(),
            solid_compression: setup.solid_compression.as_deref().map(|text| {
                match super::iss::parse_bool(text) {
                    Some(flag) => SolidToml::Bool(flag),
                    None => SolidToml::Text(text.to_string()),
                }
            }),
            setup_icon_file: setup.setup_icon_file.clone(),
            extra: setup.directives.clone(),
        },
        files: raw
            .files
            .iter()
            .map(|file| FileToml {
                source: file.source.clone(),
                dest_dir: file.dest_dir.clone(),
                dest_name: file.dest_name.clone(),
                flags: file.flags.clone(),
            })
            .collect(),
        icons: raw
            .icons
            .iter()
            .map(|icon| IconToml {
                name: icon.name.clone(),
                group: icon.group.clone(),
                target: icon.target.clone(),
            })
            .collect(),
    };
    toml::to_string_pretty(&doc).context("serializing TOML manifest")
}
