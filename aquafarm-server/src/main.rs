use std::path::PathBuf;

use aquafarm_server::{
    AppState, api,
    auth::AuthConfig,
    config::Config,
    registry::sqlite::{
        SqliteCatalogRegistry, SqliteMonitoringRegistry, SqliteStockingRegistry,
        SqliteUserRegistry, connect,
    },
};
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(name = "aquafarm-server")]
#[command(about = "Aquaculture farm management backend")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "aquafarm.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tracing=info,aquafarm_server=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        info!(path = ?cli.config, "Loading configuration");
        Config::load(&cli.config)?
    } else {
        info!("No configuration file found, using defaults");
        Config::default()
    };

    info!(path = ?config.database.path, "Opening database");
    let pool = connect(&config.database.path).await?;

    let state = AppState {
        catalog: SqliteCatalogRegistry::with_pool(pool.clone()),
        stocking: SqliteStockingRegistry::with_pool(pool.clone()),
        monitoring: SqliteMonitoringRegistry::with_pool(pool.clone()),
        users: SqliteUserRegistry::with_pool(pool),
        auth: AuthConfig {
            secret: config.auth.jwt_secret,
            token_ttl_minutes: config.auth.token_ttl_minutes,
        },
    };

    let app = api::router(state);

    let listener = TcpListener::bind(config.server.http_addr).await?;
    info!(http_addr = %config.server.http_addr, "HTTP server listening");

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::select! {
        result = axum::serve(listener, app).with_graceful_shutdown(async move {
            cancel_clone.cancelled().await;
        }) => {
            if let Err(e) = result {
                tracing::error!(error = ?e, "HTTP server error");
            }
            info!("HTTP server shut down");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            cancel.cancel();
        }
    }

    Ok(())
}
