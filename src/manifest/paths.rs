//! Path handling for manifest values.
//!
//! Manifests are authored for Windows installs, so both `/` and `\` count as
//! separators and installed paths compare case-insensitively. Source paths are
//! resolved against the manifest's directory on whatever host runs the build.

use std::path::{Path, PathBuf};

/// Install-root token. Every file destination must live under it.
pub const APP_DIR_TOKEN: &str = "{app}";

/// Start-menu group token; expands to the setup's group name at install time.
pub const GROUP_TOKEN: &str = "{group}";

/// Separator used when rendering installed paths.
pub const INSTALL_SEPARATOR: char = '\\';

/// Split a manifest path on either separator, dropping empty and `.` segments.
pub fn segments(raw: &str) -> Vec<&str> {
    raw.split(['/', '\\'])
        .map(str::trim)
        .filter(|part| !part.is_empty() && *part != ".")
        .collect()
}

pub fn has_separator(value: &str) -> bool {
    value.contains('/') || value.contains('\\')
}

/// Resolve a declared source path against the manifest directory.
pub fn resolve_source(base_dir: &Path, raw: &str) -> PathBuf {
    let candidate = Path::new(raw);
    if candidate.is_absolute() || is_drive_absolute(raw) {
        return candidate.to_path_buf();
    }

    let mut resolved = base_dir.to_path_buf();
    for part in segments(raw) {
        resolved.push(part);
    }
    resolved
}

fn is_drive_absolute(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

/// Directory part of a wildcard source such as `dist\*`.
///
/// Only a trailing `*` segment is recognised; other patterns are plain paths.
pub fn wildcard_dir(raw: &str) -> Option<&str> {
    let dir = raw
        .trim_end()
        .strip_suffix('*')?
        .strip_suffix(['/', '\\'])?;
    (!dir.trim().is_empty()).then_some(dir)
}

/// Last segment of a declared source path, i.e. the installed file name.
pub fn file_name(raw: &str) -> Option<&str> {
    segments(raw).last().copied()
}

/// Segments of `dest_dir` below `{app}`.
///
/// Returns `None` when the destination is not rooted at `{app}` or climbs out
/// of it with `..`.
pub fn install_relative(dest_dir: &str) -> Option<Vec<String>> {
    let parts = segments(dest_dir);
    let (root, rest) = parts.split_first()?;
    if !root.eq_ignore_ascii_case(APP_DIR_TOKEN) {
        return None;
    }
    if rest.iter().any(|part| *part == "..") {
        return None;
    }
    Some(rest.iter().map(|part| part.to_string()).collect())
}

/// Render an installed path: `{app}\<relative...>\<name>`.
pub fn install_path<I, S>(relative: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::from(APP_DIR_TOKEN);
    for part in relative {
        out.push(INSTALL_SEPARATOR);
        out.push_str(part.as_ref());
    }
    out
}

/// Comparison key for installed paths.
pub fn install_key(path: &str) -> String {
    segments(path)
        .iter()
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("\\")
}

/// Split a shortcut name like `{group}\Johns Elbow` into `(group, display)`.
///
/// Names without a leading `{token}` segment land in `{group}`.
pub fn split_shortcut_name(name: &str) -> (String, String) {
    let trimmed = name.trim();
    if trimmed.starts_with('{') {
        if let Some(close) = trimmed.find('}') {
            let token = &trimmed[..=close];
            let rest = trimmed[close + 1..].trim_start_matches(['\\', '/']);
            return (token.to_string(), rest.to_string());
        }
    }
    (GROUP_TOKEN.to_string(), trimmed.to_string())
}
