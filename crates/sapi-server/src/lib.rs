//! HTTP host telemetry server.
//!
//! Serves uptime, root filesystem usage, OS release metadata and the
//! hypervisor's VM inventory as JSON over unauthenticated GET endpoints.
//! Failures are reported as plain-text bodies with a 500 status.

pub mod error;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{Json, Response},
    routing::get,
};
use log::{debug, info};
use serde::Serialize;

use sapi_core::{
    DiskUsage, Hypervisor, OS_RELEASE_PATH, OsRelease, ROOT_FILESYSTEM, Uptime, VirtualMachine,
};

pub use error::ApiError;

/// Read-only state shared by all handlers.
pub struct AppState {
    pub hypervisor: Arc<dyn Hypervisor>,
    /// Mount point reported by `/api/v1/diskusage`.
    pub disk_path: PathBuf,
    /// File served by `/api/v1/os-release`.
    pub os_release_path: PathBuf,
}

impl AppState {
    pub fn new(hypervisor: Arc<dyn Hypervisor>) -> Self {
        Self {
            hypervisor,
            disk_path: PathBuf::from(ROOT_FILESYSTEM),
            os_release_path: PathBuf::from(OS_RELEASE_PATH),
        }
    }
}

#[derive(Serialize)]
struct VersionResponse {
    version: &'static str,
}

/// Run a blocking reader off the async workers.
///
/// If the client disconnects, the handler future is dropped and the result of
/// the blocking call is discarded once it finishes.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> sapi_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

async fn handle_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: sapi_core::VERSION,
    })
}

async fn handle_uptime() -> Result<Json<Uptime>, ApiError> {
    let uptime = run_blocking(sapi_core::read_uptime).await?;
    Ok(Json(uptime))
}

async fn handle_disk_usage(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DiskUsage>, ApiError> {
    let path = state.disk_path.clone();
    let usage = run_blocking(move || sapi_core::read_disk_usage(path)).await?;
    Ok(Json(usage))
}

async fn handle_os_release(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OsRelease>, ApiError> {
    let path = state.os_release_path.clone();
    let release = run_blocking(move || sapi_core::read_os_release(path)).await?;
    Ok(Json(release))
}

async fn handle_vms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VirtualMachine>>, ApiError> {
    let hypervisor = state.hypervisor.clone();
    let vms = run_blocking(move || sapi_core::list_virtual_machines(hypervisor.as_ref())).await?;
    Ok(Json(vms))
}

async fn handle_index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "sapi",
        "version": sapi_core::VERSION,
        "endpoints": {
            "/api/v1/version": "Service version",
            "/api/v1/uptime": "Seconds since boot",
            "/api/v1/diskusage": "Root filesystem capacity and usage",
            "/api/v1/os-release": "Key/value pairs from /etc/os-release",
            "/api/v1/vms": "Hypervisor domains with state, vCPUs and memory",
        },
    }))
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    debug!(
        "{method} {path} -> {} in {:.1}ms",
        response.status().as_u16(),
        started.elapsed().as_secs_f64() * 1000.0
    );
    response
}

/// Build the route table.
pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/", get(handle_index))
        .route("/api/v1/version", get(handle_version))
        .route("/api/v1/uptime", get(handle_uptime))
        .route("/api/v1/diskusage", get(handle_disk_usage))
        .route("/api/v1/os-release", get(handle_os_release))
        .route("/api/v1/vms", get(handle_vms))
        // unversioned paths served by earlier releases
        .route("/uptime", get(handle_uptime))
        .route("/diskusage", get(handle_disk_usage))
        .route("/os-release", get(handle_os_release))
        .route("/vms", get(handle_vms))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Resolve when the process is asked to stop.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown requested, draining in-flight requests");
}

/// Run the HTTP telemetry server until a shutdown signal arrives.
pub async fn run_server(state: AppState, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!(
        "sapi {} listening on {}",
        sapi_core::VERSION,
        listener.local_addr()?
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
