//! libvirt backend for the VM inventory.

use std::mem::ManuallyDrop;

use log::warn;
use virt::connect::Connect;
use virt::domain::Domain;

use super::{DomainHandle, Hypervisor, HypervisorSession, MemoryStat};
use crate::error::HypervisorError;

/// `virDomainMemoryStats` flags; the balloon counter needs none.
const MEMORY_STATS_FLAGS: u32 = 0;

impl From<virt::error::Error> for HypervisorError {
    fn from(e: virt::error::Error) -> Self {
        HypervisorError::new(e.to_string())
    }
}

/// Opens a fresh libvirt connection per session.
pub struct LibvirtHypervisor {
    uri: String,
}

impl LibvirtHypervisor {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

impl Hypervisor for LibvirtHypervisor {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn connect(&self) -> Result<Box<dyn HypervisorSession>, HypervisorError> {
        let conn = Connect::open(Some(self.uri.as_str()))?;
        Ok(Box::new(LibvirtSession { conn }))
    }
}

struct LibvirtSession {
    conn: Connect,
}

impl HypervisorSession for LibvirtSession {
    fn list_domains(&self) -> Result<Vec<Box<dyn DomainHandle + '_>>, HypervisorError> {
        // flags = 0: active and inactive domains alike
        let domains = self.conn.list_all_domains(0)?;
        Ok(domains
            .into_iter()
            .map(|domain| {
                Box::new(LibvirtDomain {
                    domain: ManuallyDrop::new(domain),
                }) as Box<dyn DomainHandle + '_>
            })
            .collect())
    }
}

impl Drop for LibvirtSession {
    fn drop(&mut self) {
        if let Err(e) = self.conn.close() {
            warn!("failed to close hypervisor connection: {e}");
        }
    }
}

/// `virt`'s `Drop` for `Domain` panics when `virDomainFree` fails. The handle
/// is freed in our `Drop` and leaked if that fails.
struct LibvirtDomain {
    domain: ManuallyDrop<Domain>,
}

impl DomainHandle for LibvirtDomain {
    fn name(&self) -> Result<String, HypervisorError> {
        Ok(self.domain.get_name()?)
    }

    fn state(&self) -> Result<u32, HypervisorError> {
        let (state, _reason) = self.domain.get_state()?;
        Ok(state)
    }

    fn max_memory_kib(&self) -> Result<u64, HypervisorError> {
        Ok(self.domain.get_max_memory()?)
    }

    fn memory_stats(&self) -> Result<Vec<MemoryStat>, HypervisorError> {
        let stats = self.domain.memory_stats(MEMORY_STATS_FLAGS)?;
        Ok(stats
            .into_iter()
            .map(|s| MemoryStat {
                tag: s.tag,
                val: s.val,
            })
            .collect())
    }

    fn vcpu_count(&self) -> Result<u32, HypervisorError> {
        Ok(self.domain.get_info()?.nr_virt_cpu)
    }
}

impl Drop for LibvirtDomain {
    fn drop(&mut self) {
        if let Err(e) = self.domain.free() {
            warn!("failed to free domain handle, leaking it: {e}");
        }
    }
}
