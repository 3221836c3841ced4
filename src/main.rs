//! alertboard server
//!
//! Run with: cargo run
//!
//! Environment variables:
//! - ALERTBOARD_HOST: Bind address (default: 0.0.0.0)
//! - ALERTBOARD_PORT: Port number (default: 8080)
//! - ALERTBOARD_DB_PATH: Database file (default: alertboard.db)
//! - RUST_LOG: Log level (default: info)

use alertboard::api::{run_server, ServerConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alertboard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let defaults = ServerConfig::default();
    let host = std::env::var("ALERTBOARD_HOST").unwrap_or(defaults.host);
    let port: u16 = std::env::var("ALERTBOARD_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(defaults.port);
    let db_path = std::env::var("ALERTBOARD_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or(defaults.db_path);

    let config = ServerConfig {
        host,
        port,
        db_path,
    };

    tracing::info!("alertboard configuration:");
    tracing::info!("  Host: {}:{}", config.host, config.port);
    tracing::info!("  Database: {}", config.db_path.display());

    println!(
        r#"
        _           _   _                         _
   __ _| | ___ _ __| |_| |__   ___   __ _ _ __ __| |
  / _` | |/ _ \ '__| __| '_ \ / _ \ / _` | '__/ _` |
 | (_| | |  __/ |  | |_| |_) | (_) | (_| | | | (_| |
  \__,_|_|\___|_|   \__|_.__/ \___/ \__,_|_|  \__,_|

 Alert store
 Version: {}
"#,
        env!("CARGO_PKG_VERSION")
    );

    run_server(config).await
}
