//! VM inventory response records.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a domain as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainStatus {
    Running,
    Blocked,
    Paused,
    Shutdown,
    Shutoff,
    Crashed,
    Unknown,
}

impl std::fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Blocked => write!(f, "Blocked"),
            Self::Paused => write!(f, "Paused"),
            Self::Shutdown => write!(f, "Shutdown"),
            Self::Shutoff => write!(f, "Shutoff"),
            Self::Crashed => write!(f, "Crashed"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One hypervisor domain, built fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualMachine {
    /// Hypervisor-assigned domain name.
    pub name: String,
    pub status: DomainStatus,
    /// Number of virtual CPUs configured for the domain (not a utilization).
    pub cpu_usage: u32,
    /// Configured maximum memory.
    pub memory_total_mb: u64,
    /// Balloon-reported memory actually held by the guest, 0 when unknown.
    pub memory_used_mb: u64,
}
