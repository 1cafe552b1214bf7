use std::path::{Path, PathBuf};

use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_database")]
    database: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS, empty allows any
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `song_catalog=debug,tower_http=info`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// OTLP gRPC endpoint to export traces to
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_database() -> String {
    "~/.local/share/song-catalog/catalog.db".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .context(format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Location of the default config file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("song-catalog").join("config.toml"))
    }

    /// Load the default config file, or the built-in defaults when there is none
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Write the default config file unless one already exists
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_else(|| eyre!("No config directory available"))?;
        Self::default().write_if_missing(&path)?;
        Ok(path)
    }

    fn write_if_missing(&self, path: &Path) -> Result<()> {
        if path.exists() {
            log::info!("Config already exists at: {}", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context(format!(
                "Failed to create config directory: {}",
                parent.display()
            ))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .context(format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn set_database(&mut self, database: &Path) {
        self.database = database.to_string_lossy().to_string();
    }

    /// Expand ~ to home directory
    fn expand_path(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        PathBuf::from(path)
    }

    /// Get expanded database path
    pub fn database_path(&self) -> PathBuf {
        self.expand_path(&self.database)
    }
}
