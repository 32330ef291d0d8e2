use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const ENV_DATA_DIR: &str = "COUPON_LEDGER_DATA_DIR";
pub const ENV_BIND: &str = "COUPON_LEDGER_BIND";
pub const ENV_LOG: &str = "COUPON_LEDGER_LOG";

const DEFAULT_DATA_DIR: &str = "DataJson";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Server configuration.
///
/// Resolved from, lowest precedence first: built-in defaults, an optional
/// JSON config file, `COUPON_LEDGER_*` environment variables, then CLI flags
/// (applied by the binary).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Directory holding one `<idcoupon>.json` file per coupon
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Address the HTTP server listens on
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Fallback tracing filter when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            bind: default_bind(),
            log_level: default_log_level(),
        }
    }
}

impl LedgerConfig {
    /// Defaults, overlaid with `config_file` if one is given, then the process environment.
    pub fn resolve(config_file: Option<&Path>) -> Result<Self> {
        let base = match config_file {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        base.with_env(|key| std::env::var(key).ok())
    }

    /// Load config from a JSON file. Missing keys fall back to defaults; a
    /// missing file is an error since it was asked for explicitly.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| LedgerError::Config(format!("invalid {}: {}", path.display(), e)))
    }

    /// Overlay environment overrides, read through `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(bind) = lookup(ENV_BIND).filter(|v| !v.is_empty()) {
            self.bind = bind
                .parse()
                .map_err(|e| LedgerError::Config(format!("{}={}: {}", ENV_BIND, bind, e)))?;
        }
        if let Some(level) = lookup(ENV_LOG).filter(|v| !v.is_empty()) {
            self.log_level = level;
        }
        Ok(self)
    }
}
