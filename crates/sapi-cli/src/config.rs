//! Daemon configuration.
//!
//! The config file is plain `key=value` lines. Blank lines and lines whose
//! first non-blank character is `#` are skipped; keys and values are trimmed and one pair of
//! surrounding double quotes is stripped from the value.
//!
//! Resolution order for every setting: command line, then file, then default.

use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;
use sapi_core::DEFAULT_URI;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/sapi/sapi.conf";
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8069;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid port {0:?} in config file")]
    InvalidPort(String),

    #[error("invalid log level {0:?}")]
    InvalidLogLevel(String),

    #[error("no log file configured: set `logfile` in {0} or pass --logfile")]
    MissingLogfile(PathBuf),
}

/// Settings as read from the config file. Absent keys stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    pub logfile: Option<PathBuf>,
    pub address: Option<String>,
    pub port: Option<u16>,
    pub uri: Option<String>,
    pub log_level: Option<LevelFilter>,
    pub unknown_keys: Vec<String>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut file = FileConfig::default();
        // indented comments are still comments
        let text = text.lines().map(str::trim_start).collect::<Vec<_>>().join("\n");
        for (key, value) in sapi_core::parse_key_values(&text) {
            let key = key.trim();
            let value = unquote(value.trim());
            match key {
                "logfile" => file.logfile = Some(PathBuf::from(value)),
                "address" => file.address = Some(value.to_string()),
                "port" => {
                    let port = value
                        .parse::<u16>()
                        .map_err(|_| ConfigError::InvalidPort(value.to_string()))?;
                    file.port = Some(port);
                }
                "uri" => file.uri = Some(value.to_string()),
                "log_level" => file.log_level = Some(parse_level(value)?),
                _ => file.unknown_keys.push(key.to_string()),
            }
        }
        Ok(file)
    }

    /// Read and parse `path`.
    ///
    /// A missing file is only an error when the path was given explicitly.
    pub fn load(path: &Path, explicit: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound && !explicit => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub logfile: Option<PathBuf>,
}

/// Fully resolved daemon configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub logfile: PathBuf,
    pub address: String,
    pub port: u16,
    pub uri: String,
    pub log_level: LevelFilter,
    /// Keys in the file that were not recognized. Reported once logging is up.
    pub unknown_keys: Vec<String>,
}

impl Config {
    /// Load the file at `path` (or the default location) and apply `overrides`.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let explicit = path.is_some();
        let path = path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));
        let file = FileConfig::load(path, explicit)?;
        Self::resolve(file, overrides, path)
    }

    pub fn resolve(
        file: FileConfig,
        overrides: Overrides,
        path: &Path,
    ) -> Result<Self, ConfigError> {
        let logfile = overrides
            .logfile
            .or(file.logfile)
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| ConfigError::MissingLogfile(path.to_path_buf()))?;

        Ok(Config {
            logfile,
            address: overrides
                .address
                .or(file.address)
                .unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
            uri: file.uri.unwrap_or_else(|| DEFAULT_URI.to_string()),
            log_level: file.log_level.unwrap_or(LevelFilter::Info),
            unknown_keys: file.unknown_keys,
        })
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_level(value: &str) -> Result<LevelFilter, ConfigError> {
    LevelFilter::from_str(value).map_err(|_| ConfigError::InvalidLogLevel(value.to_string()))
}
