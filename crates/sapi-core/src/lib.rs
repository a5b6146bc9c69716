//! # sapi-core
//!
//! Point-in-time host telemetry: uptime, root filesystem usage, OS release
//! metadata, and the virtual machine inventory of the local hypervisor.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sapi_core::{DEFAULT_URI, list_virtual_machines, read_uptime, system_hypervisor};
//!
//! let uptime = read_uptime().unwrap();
//! println!("up {}s", uptime.uptime_seconds);
//!
//! let hypervisor = system_hypervisor(DEFAULT_URI);
//! for vm in list_virtual_machines(hypervisor.as_ref()).unwrap() {
//!     println!("{} {} {}MB/{}MB", vm.name, vm.status, vm.memory_used_mb, vm.memory_total_mb);
//! }
//! ```
//!
//! ## Architecture
//!
//! Readers ([`host`]) are stateless single-read functions. The inventory
//! ([`vm`]) opens one hypervisor connection per call and never caches:
//!
//! Hypervisor → Session → DomainHandle queries → Normalizer → `VirtualMachine`
//!
//! The libvirt backend is compiled with the `libvirt` feature.

pub mod error;
pub mod host;
pub mod vm;

pub use error::{Error, ErrorKind, HypervisorError, Result};
pub use host::{
    DiskUsage, OS_RELEASE_PATH, OsRelease, ROOT_FILESYSTEM, Uptime, parse_key_values,
    read_disk_usage, read_os_release, read_uptime,
};
pub use vm::{
    DEFAULT_URI, DomainHandle, DomainStatus, Hypervisor, HypervisorSession, MemoryStat,
    VirtualMachine, list_virtual_machines, system_hypervisor,
};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
