//! sapi: host telemetry over HTTP.

mod config;
mod logging;
mod server;

use std::path::PathBuf;

use clap::Parser;
use log::warn;

use crate::config::{Config, Overrides};

#[derive(Parser)]
#[command(name = "sapi")]
#[command(about = "sapi: host telemetry over HTTP")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Path to the key=value config file (default: /etc/sapi/sapi.conf)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Address to bind, overrides `address` from the config file
    #[arg(short = 'a', long)]
    address: Option<String>,

    /// Port to listen on, overrides `port` from the config file
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Log file path, overrides `logfile` from the config file
    #[arg(short = 'l', long)]
    logfile: Option<PathBuf>,

    /// Print version and exit
    #[arg(short = 'v', long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("sapi {}", sapi_core::VERSION);
        return Ok(());
    }

    let config = Config::load(
        cli.config.as_deref(),
        Overrides {
            address: cli.address,
            port: cli.port,
            logfile: cli.logfile,
        },
    )?;

    logging::init(&config.logfile, config.log_level)?;
    for key in &config.unknown_keys {
        warn!("ignoring unknown config key {key:?}");
    }

    server::run(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_flags_parse() {
        let cli = Cli::try_parse_from([
            "sapi", "-c", "/tmp/s.conf", "-a", "127.0.0.1", "-p", "9000", "-l", "/tmp/s.log",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.conf")));
        assert_eq!(cli.address.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.logfile, Some(PathBuf::from("/tmp/s.log")));
        assert!(!cli.version);
    }

    #[test]
    fn version_flag_parses() {
        assert!(Cli::try_parse_from(["sapi", "-v"]).unwrap().version);
        assert!(Cli::try_parse_from(["sapi", "--version"]).unwrap().version);
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        assert!(Cli::try_parse_from(["sapi", "--port", "65536"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
