//! query-gate - a guarded, read-only SQL execution gateway.

use anyhow::Context;
use query_gate::audit::AuditLog;
use query_gate::cli::Cli;
use query_gate::config::Config;
use query_gate::{logging, server};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();

    if let Err(e) = run().await {
        logging::init_stderr_logging();
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    let mut config = Config::load_from_file(&config_path)?;
    config.database.apply_env_overrides()?;
    cli.apply_to(&mut config);

    logging::init_logging(&config.logging)?;
    info!("Loaded config from: {}", config_path.display());
    info!("Database: {}", config.database.display_string());

    let app = server::app_from_config(&config, AuditLog::tracing())?;

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind))?;

    server::serve(listener, app).await?;
    Ok(())
}
