//! Manifest validation errors.
//!
//! Every variant is an authoring mistake in the manifest. None of them are
//! retryable, and validation reports all of them together.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// One problem found in a manifest. `field` names the offending manifest key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required key is absent or blank.
    #[error("{field}: required value is missing")]
    MissingField { field: String },

    /// A declared file does not exist on the build host.
    #[error("{field}: file not found: {}", .path.display())]
    FileNotFound { field: String, path: PathBuf },

    /// A value outside a closed set (compression method, file flag).
    #[error("{field}: unsupported value '{value}' (expected one of: {expected})")]
    InvalidEnumValue {
        field: String,
        value: String,
        expected: String,
    },

    /// A shortcut targets a path no file entry installs.
    #[error("{field}: shortcut target '{target}' does not match any installed file")]
    DanglingShortcutReference { field: String, target: String },

    /// A shortcut target is installed by more than one file entry.
    #[error("{field}: shortcut target '{target}' is installed by {count} file entries")]
    AmbiguousShortcutReference {
        field: String,
        target: String,
        count: usize,
    },

    /// A value that must be a bare file name contains a path.
    #[error("{field}: '{value}' must be a plain file name without path separators")]
    InvalidOutputName { field: String, value: String },

    /// A destination outside `{app}`.
    #[error("{field}: destination '{value}' must be '{{app}}' or a folder below it")]
    DestinationOutsideInstallRoot { field: String, value: String },

    /// A directory source without `recursesubdirs`.
    #[error("{field}: '{}' is a directory; add the 'recursesubdirs' flag to package it", .path.display())]
    SourceIsDirectory { field: String, path: PathBuf },

    /// `dest_name` only applies to single-file sources.
    #[error("{field}: a rename cannot be applied to directory source '{}'", .path.display())]
    DestNameOnDirectory { field: String, path: PathBuf },

    /// A directory source that contains no files to install.
    #[error("{field}: directory '{}' contains no files", .path.display())]
    EmptySourceDirectory { field: String, path: PathBuf },

    /// A pass-through directive that shadows a key the builder interprets.
    #[error("{field}: '{key}' must be set through its own setup key, not as a pass-through directive")]
    ReservedDirective { field: String, key: String },

    /// A yes/no value that is neither.
    #[error("{field}: expected yes or no, got '{value}'")]
    InvalidBool { field: String, value: String },
}

impl ValidationError {
    /// The manifest key the error refers to.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field }
            | Self::FileNotFound { field, .. }
            | Self::InvalidEnumValue { field, .. }
            | Self::DanglingShortcutReference { field, .. }
            | Self::AmbiguousShortcutReference { field, .. }
            | Self::InvalidOutputName { field, .. }
            | Self::DestinationOutsideInstallRoot { field, .. }
            | Self::SourceIsDirectory { field, .. }
            | Self::DestNameOnDirectory { field, .. }
            | Self::EmptySourceDirectory { field, .. }
            | Self::ReservedDirective { field, .. }
            | Self::InvalidBool { field, .. } => field,
        }
    }
}

/// All errors found in one manifest, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manifest validation failed with {} error(s)", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
