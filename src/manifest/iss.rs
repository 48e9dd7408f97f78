//! Inno-style sectioned script encoding.
//!
//! ```text
//! [Setup]
//! AppName=Johns Elbow
//! Compression=lzma
//!
//! [Files]
//! Source: "dist\JohnsElbow.exe"; DestDir: "{app}"; Flags: ignoreversion
//!
//! [Icons]
//! Name: "{group}\Johns Elbow"; Filename: "{app}\JohnsElbow.exe"
//! ```
//!
//! The same text is what the backend compiler consumes, so [`render`] doubles
//! as the script generator for a build.

use anyhow::{anyhow, bail, Result};
use std::fmt::Write as _;

use super::paths::{split_shortcut_name, GROUP_TOKEN, INSTALL_SEPARATOR};
use super::{ManifestFormat, RawFile, RawIcon, RawManifest, RawSetup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Setup,
    Files,
    Icons,
}

/// `[Setup]` keys the builder interprets, in render order.
const SETUP_KEYS: &[&str] = &[
    "AppName",
    "AppVersion",
    "DefaultDirName",
    "DefaultGroupName",
    "OutputBaseFilename",
    "OutputDir",
    "Compression",
    "SolidCompression",
    "SetupIconFile",
];

/// Whether `key` names a `[Setup]` key the builder interprets itself.
pub(crate) fn is_setup_key(key: &str) -> bool {
    SETUP_KEYS.iter().any(|known| known.eq_ignore_ascii_case(key.trim()))
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Some(true),
        "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse(text: &str) -> Result<RawManifest> {
    let mut raw = RawManifest {
        format: ManifestFormat::Iss,
        setup: RawSetup::default(),
        files: Vec::new(),
        icons: Vec::new(),
    };
    let mut section: Option<Section> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if line.starts_with('#') {
            bail!("line {line_no}: preprocessor directives are not supported: '{line}'");
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = Some(match name.trim().to_ascii_lowercase().as_str() {
                "setup" => Section::Setup,
                "files" => Section::Files,
                "icons" => Section::Icons,
                other => bail!(
                    "line {line_no}: unsupported section '[{other}]'; expected [Setup], [Files] or [Icons]"
                ),
            });
            continue;
        }

        match section {
            None => bail!("line {line_no}: entry outside of any section: '{line}'"),
            Some(Section::Setup) => parse_setup_line(&mut raw.setup, line, line_no)?,
            Some(Section::Files) => raw.files.push(parse_file_line(line, line_no)?),
            Some(Section::Icons) => raw.icons.push(parse_icon_line(line, line_no)?),
        }
    }

    Ok(raw)
}

fn parse_setup_line(setup: &mut RawSetup, line: &str, line_no: usize) -> Result<()> {
    let (key, value) = line
        .split_once('=')
        .ok_or_else(|| anyhow!("line {line_no}: expected 'Key=Value' in [Setup]: '{line}'"))?;
    let key = key.trim();
    let value = unquote(value.trim());

    let slot = match key.to_ascii_lowercase().as_str() {
        "appname" => &mut setup.app_name,
        "appversion" => &mut setup.app_version,
        "defaultdirname" => &mut setup.default_dir_name,
        "defaultgroupname" => &mut setup.default_group_name,
        "outputbasefilename" => &mut setup.output_base_filename,
        "outputdir" => &mut setup.output_dir,
        "compression" => &mut setup.compression,
        "solidcompression" => &mut setup.solid_compression,
        "setupiconfile" => &mut setup.setup_icon_file,
        _ => {
            setup.directives.insert(key.to_string(), value);
            return Ok(());
        }
    };
    *slot = Some(value);
    Ok(())
}

fn parse_file_line(line: &str, line_no: usize) -> Result<RawFile> {
    let mut file = RawFile::default();
    for (name, value) in split_params(line, line_no)? {
        match name.to_ascii_lowercase().as_str() {
            "source" => file.source = Some(value),
            "destdir" => file.dest_dir = Some(value),
            "destname" => file.dest_name = Some(value),
            "flags" => file.flags = value.split_whitespace().map(str::to_string).collect(),
            _ => bail!("line {line_no}: unsupported [Files] parameter '{name}'"),
        }
    }
    Ok(file)
}

fn parse_icon_line(line: &str, line_no: usize) -> Result<RawIcon> {
    let mut icon = RawIcon::default();
    for (name, value) in split_params(line, line_no)? {
        match name.to_ascii_lowercase().as_str() {
            "name" => {
                let (group, display) = split_shortcut_name(&value);
                icon.group = Some(group);
                icon.name = Some(display);
            }
            "filename" => icon.target = Some(value),
            _ => bail!("line {line_no}: unsupported [Icons] parameter '{name}'"),
        }
    }
    Ok(icon)
}

/// Split `Name: value; Name: "quoted; value"` into pairs.
fn split_params(line: &str, line_no: usize) -> Result<Vec<(String, String)>> {
    let mut params = Vec::new();
    let mut rest = line.trim_start();

    while !rest.is_empty() {
        let colon = rest
            .find(':')
            .ok_or_else(|| anyhow!("line {line_no}: expected 'Name: value' in '{line}'"))?;
        let name = rest[..colon].trim();
        if name.is_empty() {
            bail!("line {line_no}: parameter without a name in '{line}'");
        }
        rest = rest[colon + 1..].trim_start();

        let (value, remaining) = if rest.starts_with('"') {
            parse_quoted(rest, line_no)?
        } else {
            match rest.find(';') {
                Some(end) => (rest[..end].trim().to_string(), &rest[end..]),
                None => (rest.trim().to_string(), ""),
            }
        };

        rest = remaining.trim_start();
        if let Some(after) = rest.strip_prefix(';') {
            rest = after.trim_start();
        } else if !rest.is_empty() {
            bail!("line {line_no}: expected ';' after parameter '{name}'");
        }
        params.push((name.to_string(), value));
    }

    Ok(params)
}

/// Read a `"..."` value where `""` stands for a literal quote.
fn parse_quoted(input: &str, line_no: usize) -> Result<(String, &str)> {
    let mut value = String::new();
    let mut chars = input.char_indices().skip(1).peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch != '"' {
            value.push(ch);
            continue;
        }
        if matches!(chars.peek(), Some((_, '"'))) {
            chars.next();
            value.push('"');
            continue;
        }
        return Ok((value, &input[idx + 1..]));
    }
    bail!("line {line_no}: unterminated quoted value")
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value[1..value.len() - 1].replace("\"\"", "\"")
    } else {
        value.to_string()
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render a manifest as an Inno-style script.
pub fn render(raw: &RawManifest) -> String {
    let setup = &raw.setup;
    let values = [
        &setup.app_name,
        &setup.app_version,
        &setup.default_dir_name,
        &setup.default_group_name,
        &setup.output_base_filename,
        &setup.output_dir,
        &setup.compression,
        &setup.solid_compression,
        &setup.setup_icon_file,
    ];

    let mut out = String::from("[Setup]\n");
    for (key, value) in SETUP_KEYS.iter().zip(values) {
        if let Some(value) = value {
            let _ = writeln!(out, "{key}={value}");
        }
    }
    for (key, value) in &setup.directives {
        let _ = writeln!(out, "{key}={value}");
    }

    if !raw.files.is_empty() {
        out.push_str("\n[Files]\n");
        for file in &raw.files {
            let mut params = Vec::new();
            if let Some(source) = &file.source {
                params.push(format!("Source: {}", quote(source)));
            }
            if let Some(dest_dir) = &file.dest_dir {
                params.push(format!("DestDir: {}", quote(dest_dir)));
            }
            if let Some(dest_name) = &file.dest_name {
                params.push(format!("DestName: {}", quote(dest_name)));
            }
            if !file.flags.is_empty() {
                params.push(format!("Flags: {}", file.flags.join(" ")));
            }
            let _ = writeln!(out, "{}", params.join("; "));
        }
    }

    if !raw.icons.is_empty() {
        out.push_str("\n[Icons]\n");
        for icon in &raw.icons {
            let mut params = Vec::new();
            if let Some(name) = &icon.name {
                let group = icon.group.as_deref().unwrap_or(GROUP_TOKEN);
                params.push(format!(
                    "Name: {}",
                    quote(&format!("{group}{INSTALL_SEPARATOR}{name}"))
                ));
            }
            if let Some(target) = &icon.target {
                params.push(format!("Filename: {}", quote(target)));
            }
            let _ = writeln!(out, "{}", params.join("; "));
        }
    }

    out
}
