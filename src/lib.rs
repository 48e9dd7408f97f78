//! Manifest-driven installer builder.
//!
//! A package manifest describes an application to ship: metadata, the files
//! to install and where, compression settings, and Start Menu shortcuts. This
//! crate validates that manifest and prepares everything the installer
//! compiler needs. It never produces the installer executable itself.
//!
//! - **Manifest** - TOML or Inno-style script, parsed into one model
//! - **Validation** - every authoring mistake reported in one pass
//! - **Descriptor** - JSON record of the build with per-file sha256
//! - **Payload** - optional deterministic tar(.zst) of the installed layout
//! - **Backend** - compiler script rendering and compiler invocation
//!
//! # Architecture
//!
//! ```text
//! setup.toml / setup.iss
//!     │
//!     ├── manifest::parse_manifest   → RawManifest
//!     ├── validate::validate         → PackageManifest | ValidationErrors
//!     │
//!     └── builder::build
//!             ├── descriptor   → <name>.descriptor.json
//!             ├── backend      → <name>.iss  ──► iscc ──► <name>.exe
//!             └── payload      → <name>.payload.tar.zst
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use setup_builder::{build, BuildOptions, ValidationErrors};
//! use std::path::Path;
//!
//! match build(Path::new("setup.toml"), Path::new("out"), &BuildOptions::default()) {
//!     Ok(report) => println!("script at {}", report.script_path.display()),
//!     Err(err) => match err.downcast_ref::<ValidationErrors>() {
//!         Some(errors) => eprintln!("{errors}"),
//!         None => eprintln!("{err:#}"),
//!     },
//! }
//! ```

pub mod backend;
pub mod builder;
pub mod descriptor;
pub mod manifest;
pub mod output;
pub mod payload;
pub mod preflight;
pub mod validate;

pub use builder::{build, check, BuildOptions, BuildReport};
pub use descriptor::BuildDescriptor;
pub use manifest::{
    load_manifest, load_manifest_str, parse_manifest, Compression, CompressionMode, FileEntry,
    FileFlag, ManifestFormat, PackageManifest, ShortcutEntry,
};
pub use validate::{validate, ValidationError, ValidationErrors};
