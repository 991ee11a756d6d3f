use clap::Parser;

use discover_api::config::{self, AppConfig, Args};
use discover_api::{lifecycle, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let args = Args::parse();
    let folder = config::resolve_config_folder(&args.config_folder_path);
    let config = AppConfig::load(&folder)?;

    // --- Tracing ---
    logging::init(&config.log);
    tracing::info!(
        config_folder = %folder.display(),
        index = args.index,
        "Loaded configuration"
    );

    // --- Run ---
    if let Err(e) = lifecycle::start(config, args.index).await {
        tracing::error!(error = %e, "discover-api exited with error");
        return Err(e.into());
    }
    Ok(())
}
