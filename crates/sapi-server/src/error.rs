//! Mapping of internal failures onto plain-text HTTP errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;

use sapi_core::ErrorKind;

/// Handler-level failure. Rendered as a plain-text body with no JSON.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] sapi_core::Error),

    #[error("blocking task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Core(e) => match e.kind() {
                ErrorKind::UpstreamUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing message. Details stay in the log.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Core(sapi_core::Error::HypervisorConnect { .. }) => {
                "Failed to connect to hypervisor"
            }
            Self::Core(sapi_core::Error::DomainEnumeration(_)) => "Failed to list VMs",
            Self::Core(sapi_core::Error::Uptime(_)) => "Failed to get uptime",
            Self::Core(sapi_core::Error::DiskUsage { .. }) => "Failed to get disk usage",
            Self::Core(sapi_core::Error::OsRelease { .. }) => "Failed to read os-release",
            Self::Task(_) => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!("request failed with {status}: {self}");
        (status, self.public_message()).into_response()
    }
}
