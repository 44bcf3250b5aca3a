use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use map_config::api;
use map_config::config::{load_config, ToolConfig};
use map_config::session::Session;
use map_config::state::AppState;

#[derive(Parser)]
#[command(name = "map_config", about = "HTTP API server for .map device editing", version)]
struct Args {
    /// Port to listen on (0 picks a free one)
    #[arg(long, default_value_t = 8787)]
    port: u16,

    /// Tool config JSON; omitted means built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load this .map file on startup
    #[arg(long)]
    open: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        },
        None => ToolConfig::default(),
    };

    let mut session = Session::new(config);
    if let Some(path) = &args.open {
        match session.load_path(path) {
            Ok(count) => {
                eprintln!("[MapConfig] Loaded {} ({count} devices)", path.display());
            }
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }

    let state = Arc::new(AppState::new(session));
    match api::start_api_server(state, args.port).await {
        Ok(port) => {
            eprintln!("[MapConfig] API server listening on http://127.0.0.1:{port}");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }

    // Serve until interrupted.
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("[MapConfig] Failed to wait for shutdown signal: {e}");
    }
    eprintln!("[MapConfig] Shutting down");
}
