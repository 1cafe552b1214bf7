mod config;
mod database;
mod entities;
mod http_server;
mod logging;
mod services;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    config::Config, database::Database, http_server::app::HttpServerConfig,
    logging::init_tracing,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "SONG_CATALOG_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log filter, overrides `logging.level` from the config (e.g. `debug`)
    #[arg(long, global = true, env = "LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the catalog HTTP API
    Serve {
        /// The address to bind to
        #[arg(long, env = "SONG_CATALOG_HOST")]
        host: Option<String>,

        /// The port to run the server on
        #[arg(short, long, env = "SONG_CATALOG_PORT")]
        port: Option<u16>,

        /// Path to the SQLite database file
        #[arg(short, long, env = "SONG_CATALOG_DATABASE")]
        database: Option<PathBuf>,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let mut config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load song-catalog config")?;

    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let tracing_guard = init_tracing(
        env!("CARGO_PKG_NAME"),
        config.logging.otlp_endpoint.as_deref(),
        &log_level,
    )?;

    log::debug!("Song catalog starting");

    let result = match args.command {
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                println!("{}", path.display());
                Ok(())
            }
            ConfigCommands::Path => {
                match Config::config_path() {
                    Some(path) => println!("{}", path.display()),
                    None => println!("No default config path found"),
                }
                Ok(())
            }
        },
        Commands::Serve {
            host,
            port,
            database,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(database) = database {
                config.set_database(&database);
            }
            serve(config).await
        }
    };

    tracing_guard.shutdown();
    result
}

async fn serve(config: Config) -> Result<()> {
    log::debug!("Opening database at: {}", config.database_path().display());
    let database = Arc::new(Database::open(&config.database_path()).await?);

    log::info!(
        "Starting HTTP server on {}:{}",
        config.server.host,
        config.server.port
    );
    http_server::app::start(HttpServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        database: database.clone(),
        allowed_origins: config.server.allowed_origins.clone(),
    })
    .await?;

    match Arc::try_unwrap(database) {
        Ok(database) => database.close().await?,
        Err(_) => log::warn!("Database still in use at shutdown, leaving pool to drop"),
    }

    Ok(())
}
