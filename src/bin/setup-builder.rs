use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use setup_builder::{build, check, BuildOptions, ValidationErrors};
use simplelog::{Config, SimpleLogger};

/// Validate a package manifest and prepare it for the installer compiler.
#[derive(Parser)]
#[command(name = "setup-builder", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Turn on verbose logging (`-v` info, `-vv` debug, `-vvv` trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the manifest and write the descriptor and compiler script.
    Build {
        /// Manifest file (.toml or .iss).
        #[arg(long, short)]
        manifest: PathBuf,

        /// Output directory.
        #[arg(long, short)]
        out: PathBuf,

        /// Also stage the installed layout as a tar archive.
        #[arg(long)]
        payload: bool,

        /// Run the installer compiler on the rendered script.
        #[arg(long)]
        compile: bool,

        /// Compiler binary; defaults to $SETUP_BUILDER_ISCC, then iscc on PATH.
        #[arg(long, requires = "compile")]
        iscc: Option<PathBuf>,
    },
    /// Validate the manifest only.
    Check {
        /// Manifest file (.toml or .iss).
        #[arg(long, short)]
        manifest: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _ = SimpleLogger::init(log_level(cli.verbose), Config::default());

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<ValidationErrors>() {
                Some(errors) => eprintln!("{errors}"),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Build {
            manifest,
            out,
            payload,
            compile,
            iscc,
        } => {
            let options = BuildOptions {
                payload,
                compile,
                compiler: iscc,
            };
            let report = build(&manifest, &out, &options)?;
            let name = &report.manifest.setup.output_base_filename;

            println!(
                "[build:{name}] {} {}: {} files, {} shortcuts, {} bytes",
                report.manifest.setup.app_name,
                report.manifest.setup.app_version,
                report.manifest.installed_files().count(),
                report.manifest.shortcuts.len(),
                report.descriptor.payload_bytes()
            );
            println!(
                "[build:{name}] descriptor {}",
                report.descriptor_path.display()
            );
            println!("[build:{name}] script {}", report.script_path.display());
            if let Some(payload) = &report.payload {
                println!(
                    "[build:{name}] payload {} (sha256 {})",
                    payload.path.display(),
                    payload.sha256
                );
            }
            if let Some(installer) = &report.installer {
                println!("[build:{name}] installer {}", installer.display());
            }
            Ok(())
        }
        Commands::Check { manifest } => {
            let parsed = check(&manifest)?;
            println!(
                "[check] '{}' is valid: {} files, {} shortcuts",
                manifest.display(),
                parsed.files.len(),
                parsed.shortcuts.len()
            );
            Ok(())
        }
    }
}
