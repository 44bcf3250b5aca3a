// CLI binary — panicking on unrecoverable errors is standard for CLI tools.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::unreachable, clippy::indexing_slicing)]

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use map_config::config::{self, ToolConfig};
use map_config::describe;
use map_config::document::atomic_write;
use map_config::error::AppError;
use map_config::mapfile::{CloneRequest, RenameRequest};
use map_config::session::{PatchInfo, Session};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "mapconfig-cli", about = "Headless .map device editor", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Tool config JSON; omitted means built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the devices in a .map file, or detail a single serial
    Devices {
        file: PathBuf,
        serial: Option<String>,
    },
    /// Rename a device serial, writing a `_renamed` copy of the file
    Rename {
        file: PathBuf,
        /// Serial to replace
        #[arg(long)]
        target: String,
        /// Replacement serial
        #[arg(long = "new")]
        new_serial: String,
        /// Rewrite at most this many occurrences
        #[arg(long)]
        limit: Option<usize>,
        /// Also copy calibration values from this donor serial
        #[arg(long)]
        clone_from: Option<String>,
        /// New network assignment for rewritten tags
        #[arg(long)]
        network: Option<String>,
        /// Output path (defaults to a sibling of the input)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Copy calibration values between devices, writing a `_calibrated` copy
    Clone {
        file: PathBuf,
        /// Donor serial
        #[arg(long)]
        source: String,
        /// Serial receiving the values
        #[arg(long)]
        target: String,
        /// New network assignment for rewritten tags
        #[arg(long)]
        network: Option<String>,
        /// Output path (defaults to a sibling of the input)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the calibration key whitelist
    Keys,
    /// Write a config JSON filled with the built-in defaults
    Init { path: PathBuf },
}

// ── Helpers ──────────────────────────────────────────────────────

fn load_cli_config(path: Option<&Path>) -> Result<ToolConfig, AppError> {
    match path {
        Some(p) => Ok(config::load_config(p)?),
        None => Ok(ToolConfig::default()),
    }
}

fn load_session(config_path: Option<&Path>, file: &Path) -> Result<Session, AppError> {
    let mut session = Session::new(load_cli_config(config_path)?);
    session.load_path(file)?;
    Ok(session)
}

/// Write a patch either to `--out` or next to the input under the patch's
/// own suffix name. Returns the path written.
fn write_patch(input: &Path, out: Option<&Path>, patch: &PatchInfo) -> Result<PathBuf, AppError> {
    let path = match out {
        Some(p) => p.to_path_buf(),
        None => input.with_file_name(&patch.file_name),
    };
    atomic_write(&path, patch.content.as_bytes())?;
    Ok(path)
}

fn report_written(raw_json: bool, path: &Path) {
    if raw_json {
        println!(
            "{}",
            serde_json::json!({ "wrote": path.display().to_string() })
        );
    } else {
        println!("Wrote {}", path.display());
    }
}

// ── Command execution ────────────────────────────────────────────

fn run(cli: &Cli) -> Result<(), AppError> {
    match &cli.command {
        Commands::Devices { file, serial } => {
            let session = load_session(cli.config.as_deref(), file)?;
            match serial {
                Some(sn) => {
                    let device = session
                        .devices()
                        .iter()
                        .find(|record| record.serial == *sn)
                        .ok_or_else(|| AppError::NotFound {
                            what: format!("Device {sn}"),
                        })?;
                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(device).unwrap_or_default());
                    } else {
                        println!("{}", describe::describe_device(device));
                    }
                }
                None => {
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string_pretty(session.devices()).unwrap_or_default()
                        );
                    } else {
                        let name = session.document_info().map(|info| info.name);
                        println!(
                            "{}",
                            describe::describe_inventory(name.as_deref(), session.devices())
                        );
                    }
                }
            }
        }
        Commands::Rename {
            file,
            target,
            new_serial,
            limit,
            clone_from,
            network,
            out,
        } => {
            let session = load_session(cli.config.as_deref(), file)?;
            let request = RenameRequest {
                target_serial: target.clone(),
                new_serial: new_serial.clone(),
                occurrence_limit: *limit,
                clone_source: clone_from.clone(),
                network_override: network.clone(),
            };
            let patch = session.rename(&request)?;
            let path = write_patch(file, out.as_deref(), &patch)?;
            report_written(cli.json, &path);
        }
        Commands::Clone {
            file,
            source,
            target,
            network,
            out,
        } => {
            let session = load_session(cli.config.as_deref(), file)?;
            let request = CloneRequest {
                source_serial: source.clone(),
                target_serial: target.clone(),
                network_override: network.clone(),
            };
            let patch = session.clone_calibration(&request)?;
            let path = write_patch(file, out.as_deref(), &patch)?;
            report_written(cli.json, &path);
        }
        Commands::Keys => {
            let config = load_cli_config(cli.config.as_deref())?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&config.calibration_keys).unwrap_or_default()
                );
            } else {
                for key in &config.calibration_keys {
                    println!("{key}");
                }
            }
        }
        Commands::Init { path } => {
            config::save_config(path, &ToolConfig::default())?;
            report_written(cli.json, path);
        }
    }
    Ok(())
}

// ── Main ─────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
