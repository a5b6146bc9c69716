//! Error taxonomy shared by the readers and the virtualization client.

/// Coarse classification used by callers to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The hypervisor endpoint could not be reached or enumerated.
    UpstreamUnavailable,
    /// A local OS read (syscall or file) failed.
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpstreamUnavailable => write!(f, "upstream_unavailable"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Errors returned by `sapi-core` operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to hypervisor at {uri}: {source}")]
    HypervisorConnect {
        uri: String,
        #[source]
        source: HypervisorError,
    },

    #[error("failed to list hypervisor domains: {0}")]
    DomainEnumeration(#[source] HypervisorError),

    #[error("failed to read uptime: {0}")]
    Uptime(#[source] std::io::Error),

    #[error("failed to stat filesystem {path}: {source}")]
    DiskUsage {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    OsRelease {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Classify this error for status mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::HypervisorConnect { .. } | Self::DomainEnumeration(_) => {
                ErrorKind::UpstreamUnavailable
            }
            Self::Uptime(_) | Self::DiskUsage { .. } | Self::OsRelease { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

/// Failure reported by a hypervisor backend for a single call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HypervisorError {
    message: String,
}

impl HypervisorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
