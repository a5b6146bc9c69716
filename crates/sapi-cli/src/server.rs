use anyhow::Context;
use log::info;
use sapi_server::AppState;

use crate::config::Config;

pub fn run(config: &Config) -> anyhow::Result<()> {
    let hypervisor = sapi_core::system_hypervisor(config.uri.as_str());
    let state = AppState::new(hypervisor);

    let base = format!("http://{}:{}", config.address, config.port);
    println!("sapi v{}", sapi_core::VERSION);
    println!("   {base}");
    println!("   hypervisor: {}", config.uri);
    println!("   log file:   {}", config.logfile.display());
    println!();
    println!("   Endpoints:");
    println!("     GET /api/v1/version      Service version");
    println!("     GET /api/v1/uptime       Seconds since boot");
    println!("     GET /api/v1/diskusage    Root filesystem usage");
    println!("     GET /api/v1/os-release   Parsed /etc/os-release");
    println!("     GET /api/v1/vms          Virtual machine inventory");
    println!();

    info!(
        "starting sapi {} on {}:{} (hypervisor {})",
        sapi_core::VERSION,
        config.address,
        config.port,
        config.uri
    );

    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    rt.block_on(sapi_server::run_server(state, &config.address, config.port))
        .with_context(|| format!("server on {}:{} failed", config.address, config.port))?;

    info!("sapi stopped");
    Ok(())
}
