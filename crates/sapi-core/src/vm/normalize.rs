//! Pure mapping from raw domain query results to [`VirtualMachine`] records.

use super::model::{DomainStatus, VirtualMachine};
use super::MemoryStat;

/// libvirt `VIR_DOMAIN_MEMORY_STAT_ACTUAL_BALLOON`.
pub const MEMORY_STAT_ACTUAL_BALLOON: u32 = 6;

// libvirt `virDomainState` codes.
const STATE_RUNNING: u32 = 1;
const STATE_BLOCKED: u32 = 2;
const STATE_PAUSED: u32 = 3;
const STATE_SHUTDOWN: u32 = 4;
const STATE_SHUTOFF: u32 = 5;
const STATE_CRASHED: u32 = 6;

/// Per-domain query results; `None` marks a query that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDomain {
    pub name: Option<String>,
    pub state: Option<u32>,
    pub max_memory_kib: Option<u64>,
    pub balloon_kib: Option<u64>,
    pub vcpus: Option<u32>,
}

/// Map a raw `virDomainState` code to a status. Unrecognized codes are `Unknown`.
pub fn status_from_state(code: u32) -> DomainStatus {
    match code {
        STATE_RUNNING => DomainStatus::Running,
        STATE_BLOCKED => DomainStatus::Blocked,
        STATE_PAUSED => DomainStatus::Paused,
        STATE_SHUTDOWN => DomainStatus::Shutdown,
        STATE_SHUTOFF => DomainStatus::Shutoff,
        STATE_CRASHED => DomainStatus::Crashed,
        _ => DomainStatus::Unknown,
    }
}

/// Hypervisor memory counters are in KiB.
pub fn kib_to_mib(kib: u64) -> u64 {
    kib / 1024
}

/// The "actual balloon" value in KiB, if the statistics set carries it.
pub fn balloon_kib(stats: &[MemoryStat]) -> Option<u64> {
    stats
        .iter()
        .rev()
        .find(|s| s.tag == MEMORY_STAT_ACTUAL_BALLOON)
        .map(|s| s.val)
}

/// Assemble a record, substituting defaults for every missing value.
pub fn normalize(raw: RawDomain) -> VirtualMachine {
    VirtualMachine {
        name: raw.name.unwrap_or_default(),
        status: raw
            .state
            .map(status_from_state)
            .unwrap_or(DomainStatus::Unknown),
        cpu_usage: raw.vcpus.unwrap_or(0),
        memory_total_mb: raw.max_memory_kib.map(kib_to_mib).unwrap_or(0),
        memory_used_mb: raw.balloon_kib.map(kib_to_mib).unwrap_or(0),
    }
}
