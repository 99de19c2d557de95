use clap::Parser;
use flexi_logger::Logger;
use std::sync::Arc;

mod auth;
mod community;
mod error;
mod logging;
mod servers;

#[derive(Parser, Debug)]
#[command(name = "campus-commons")]
struct Config {
    /// Port for the REST API server
    #[arg(short = 'p', long, default_value_t = 5000)]
    port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Path to the SQLite database
    #[arg(long, default_value = "data/commons.db")]
    db_path: String,

    /// Write logs to rotated files in this directory instead of stderr
    #[arg(long)]
    log_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    match &config.log_dir {
        Some(dir) => logging::setup_file_logging(dir)?,
        None => {
            Logger::try_with_env_or_str("info")?
                .format(flexi_logger::colored_default_format)
                .start()?;
        }
    }

    // Ensure the data directory exists before opening the database.
    if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let auth_state = Arc::new(auth::AuthState::new(&config.db_path)?);
    let community_state = Arc::new(community::CommunityState::new(&config.db_path)?);
    log::info!("🔐 Stores ready (db: {})", config.db_path);

    let server = servers::ApiServer::new(
        servers::ApiConfig {
            port: config.port,
            host: config.host.clone(),
        },
        auth_state,
        community_state,
    );
    server.start().await
}
