//! JSON-lines logging to the configured log file.
//!
//! Each record is one object: `{"ts", "level", "target", "msg"}`. The level
//! comes from the config file; `SAPI_LOG` overrides it with env_logger
//! filter syntax.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::LevelFilter;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

/// Install the process-wide logger. Call once, before anything logs.
pub fn init(path: &Path, level: LevelFilter) -> Result<(), LoggingError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let logger = env_logger::Builder::new()
        .filter_level(level)
        .parse_env(env_logger::Env::new().filter("SAPI_LOG"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            let ts = buf.timestamp_millis().to_string();
            let line = json_line(
                &ts,
                record.level().as_str(),
                record.target(),
                &record.args().to_string(),
            );
            writeln!(buf, "{line}")
        })
        .build();

    let max_level = logger.filter();
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(max_level);
    Ok(())
}

fn json_line(ts: &str, level: &str, target: &str, msg: &str) -> String {
    serde_json::json!({
        "ts": ts,
        "level": level,
        "target": target,
        "msg": msg,
    })
    .to_string()
}
