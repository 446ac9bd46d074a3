use std::net::{AddrParseError, SocketAddr};
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Deserialize;
use thiserror::Error;

use crate::sqlite::SqliteStore;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
use crate::store::DEFAULT_SLOT_KEY;

/// Command-line switches shared by every binary
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to config file
    #[arg(short, long, global = true, default_value = "expense-tracker.toml")]
    pub config: PathBuf,

    /// Directory holding the expense data (overrides config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Storage backend (overrides config file)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendKind>,

    /// Log level or filter directive (overrides config file)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One JSON file per slot
    #[default]
    File,
    /// A SQLite database file
    Sqlite,
    /// Nothing survives the process (testing)
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Data directory; defaults to the platform data dir
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Name of the slot holding the expense list
    #[serde(default = "default_key")]
    pub key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Categories offered by the front ends. The store accepts any label.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_key() -> String {
    DEFAULT_SLOT_KEY.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_categories() -> Vec<String> {
    ["Food", "Transport", "Entertainment", "Shopping", "Bills", "Healthcare", "Other"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            backend: BackendKind::default(),
            path: None,
            key: default_key(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            currency_symbol: default_currency_symbol(),
            categories: default_categories(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `<platform data dir>/expense-tracker`, or `./expense-tracker` when the
/// platform has none.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("expense-tracker")
}

/// A config file that exists but could not be used. Loading falls back to
/// defaults; the caller logs it once logging is up.
#[derive(Debug, Error)]
#[error("Failed to parse config file {}: {source}", .path.display())]
pub struct ConfigWarning {
    pub path: PathBuf,
    #[source]
    pub source: toml::de::Error,
}

impl Config {
    /// Read the config file (missing file: defaults; unparsable file:
    /// defaults plus the warning), then apply command-line overrides.
    pub fn load(args: &GlobalArgs) -> (Self, Option<ConfigWarning>) {
        let (mut config, warning) = match std::fs::read_to_string(&args.config) {
            Ok(contents) => match Self::from_toml(&contents) {
                Ok(config) => (config, None),
                Err(source) => (
                    Config::default(),
                    Some(ConfigWarning {
                        path: args.config.clone(),
                        source,
                    }),
                ),
            },
            Err(_) => (Config::default(), None),
        };

        config.apply(args);
        (config, warning)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    fn apply(&mut self, args: &GlobalArgs) {
        if let Some(ref dir) = args.data_dir {
            self.storage.path = Some(dir.clone());
        }
        if let Some(backend) = args.backend {
            self.storage.backend = backend;
        }
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}

impl StorageConfig {
    pub fn data_dir(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_data_dir)
    }

    /// Open the configured backend, creating its directory if needed.
    pub fn open_backend(&self) -> Result<Box<dyn KeyValueStore>, StorageError> {
        let dir = self.data_dir();
        Ok(match self.backend {
            BackendKind::File => Box::new(FileStore::open(dir)?),
            BackendKind::Sqlite => {
                std::fs::create_dir_all(&dir)?;
                Box::new(SqliteStore::open(&sqlite_path(&dir))?)
            }
            BackendKind::Memory => Box::new(MemoryStore::new()),
        })
    }
}

fn sqlite_path(dir: &Path) -> PathBuf {
    dir.join("expenses.db")
}
