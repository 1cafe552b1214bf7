use color_eyre::{Result, eyre::Context};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection};
use std::path::Path;
use std::time::Duration;

/// Process-wide store handle. Opened once at startup, shared behind an `Arc`
/// and handed to every service.
pub struct Database {
    pub conn: DatabaseConnection,
}

impl Database {
    /// Open or create a database at the given path
    pub async fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening database at: {}", path.display());

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).context(format!(
                "Failed to create database directory: {}",
                parent.display()
            ))?;
        }

        let url = format!("sqlite://{}?mode=rwc", path.display());

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(16)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(false);

        let database = Self::connect(opt)
            .await
            .context(format!("Failed to open database: {}", path.display()))?;

        log::info!("Database ready at: {}", path.display());
        Ok(database)
    }

    /// Connect with explicit options and bring the schema up to date.
    pub async fn connect(opt: ConnectOptions) -> Result<Self> {
        let conn = SeaDatabase::connect(opt)
            .await
            .context("Failed to connect to database")?;

        // Cascades on playlist_songs and SET NULL on songs.album_id need this
        conn.execute_unprepared("PRAGMA foreign_keys = ON")
            .await
            .context("Failed to enable foreign keys")?;

        log::debug!("Creating catalog tables");
        migration::Migrator::up(&conn, None)
            .await
            .context("Failed to create catalog tables")?;

        Ok(Database { conn })
    }

    /// Release every pooled connection.
    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .context("Failed to close database")?;
        log::debug!("Database closed");
        Ok(())
    }
}
