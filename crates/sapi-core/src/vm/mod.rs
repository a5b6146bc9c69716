//! Virtual machine inventory from the local hypervisor.
//!
//! Every call opens its own connection, enumerates all domains (running and
//! stopped), queries each one, and releases the domain handles and the
//! connection before returning. Per-domain queries are independent: a failed
//! query leaves its field at the default instead of failing the listing.
//!
//! Hypervisor access goes through three traits so the listing logic does not
//! depend on a live daemon:
//!
//! - [`Hypervisor`] opens sessions,
//! - [`HypervisorSession`] owns one connection and enumerates domains,
//! - [`DomainHandle`] answers the per-domain queries.
//!
//! Dropping a session closes its connection; dropping a handle frees it.
//! Handles borrow their session, so they are always released first.

#[cfg(feature = "libvirt")]
pub mod libvirt;
pub mod model;
pub mod normalize;

use std::sync::Arc;

use log::{debug, warn};

use crate::error::{Error, HypervisorError, Result};

pub use model::{DomainStatus, VirtualMachine};
pub use normalize::{MEMORY_STAT_ACTUAL_BALLOON, RawDomain, normalize};

/// Connection URI of the local system QEMU/KVM daemon.
pub const DEFAULT_URI: &str = "qemu:///system";

/// One entry of a domain's memory statistics set (values in KiB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStat {
    pub tag: u32,
    pub val: u64,
}

/// Per-domain queries. Each one may fail on its own.
pub trait DomainHandle {
    fn name(&self) -> Result<String, HypervisorError>;

    /// Raw `virDomainState` code.
    fn state(&self) -> Result<u32, HypervisorError>;

    /// Configured maximum memory in KiB.
    fn max_memory_kib(&self) -> Result<u64, HypervisorError>;

    /// Live memory statistics.
    fn memory_stats(&self) -> Result<Vec<MemoryStat>, HypervisorError>;

    /// Number of configured virtual CPUs.
    fn vcpu_count(&self) -> Result<u32, HypervisorError>;
}

/// An open connection to the hypervisor. Closed on drop.
pub trait HypervisorSession {
    /// All domains known to the hypervisor, in enumeration order.
    fn list_domains(&self) -> Result<Vec<Box<dyn DomainHandle + '_>>, HypervisorError>;
}

/// Factory for per-request hypervisor sessions.
pub trait Hypervisor: Send + Sync {
    /// Connection URI, used in diagnostics.
    fn uri(&self) -> &str;

    /// Open a new connection.
    fn connect(&self) -> Result<Box<dyn HypervisorSession>, HypervisorError>;
}

/// List every domain as a [`VirtualMachine`].
///
/// Fails only when the connection cannot be opened or the domains cannot be
/// enumerated. Everything after that degrades field by field.
pub fn list_virtual_machines(hypervisor: &dyn Hypervisor) -> Result<Vec<VirtualMachine>> {
    let session = hypervisor
        .connect()
        .map_err(|source| Error::HypervisorConnect {
            uri: hypervisor.uri().to_string(),
            source,
        })?;

    let domains = session.list_domains().map_err(Error::DomainEnumeration)?;
    debug!("hypervisor {} reported {} domains", hypervisor.uri(), domains.len());

    let vms = domains
        .into_iter()
        .map(|domain| inspect_domain(domain.as_ref()))
        .collect();
    Ok(vms)
}

/// Run every per-domain query and normalize the results.
fn inspect_domain(domain: &dyn DomainHandle) -> VirtualMachine {
    let name = domain.name();
    let label = match &name {
        Ok(name) => name.clone(),
        Err(_) => "<unnamed>".to_string(),
    };

    let raw = RawDomain {
        name: settle(&label, "name", name),
        state: settle(&label, "state", domain.state()),
        max_memory_kib: settle(&label, "max memory", domain.max_memory_kib()),
        balloon_kib: settle(&label, "memory stats", domain.memory_stats())
            .and_then(|stats| normalize::balloon_kib(&stats)),
        vcpus: settle(&label, "vcpu count", domain.vcpu_count()),
    };
    normalize(raw)
}

fn settle<T>(domain: &str, query: &str, result: Result<T, HypervisorError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("domain {domain}: {query} query failed, using default: {e}");
            None
        }
    }
}

/// Hypervisor used by the service for `uri`.
///
/// Without the `libvirt` feature every connection attempt fails, so the
/// inventory endpoint reports the hypervisor as unavailable.
pub fn system_hypervisor(uri: impl Into<String>) -> Arc<dyn Hypervisor> {
    #[cfg(feature = "libvirt")]
    {
        Arc::new(libvirt::LibvirtHypervisor::new(uri))
    }
    #[cfg(not(feature = "libvirt"))]
    {
        Arc::new(UnsupportedHypervisor { uri: uri.into() })
    }
}

#[cfg(not(feature = "libvirt"))]
struct UnsupportedHypervisor {
    uri: String,
}

#[cfg(not(feature = "libvirt"))]
impl Hypervisor for UnsupportedHypervisor {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn connect(&self) -> Result<Box<dyn HypervisorSession>, HypervisorError> {
        Err(HypervisorError::new(
            "sapi was built without the `libvirt` feature",
        ))
    }
}
