// Farm Equipment Sharing - Web Server

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use farm_equipment_sharing::server::{router, AppState};
use farm_equipment_sharing::{logging, open_store, Config, EquipmentContract, EquipmentRegistry};

#[derive(Parser)]
#[command(name = "farm-equipment-server", about = "HTTP API for the shared farm equipment registry")]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    logging::init_tracing(&config.log_level, args.verbose);

    let store = open_store(config.db_path.as_deref())?;
    let state = AppState::new(EquipmentContract::new(EquipmentRegistry::with_store(store)));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "equipment server listening");

    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
