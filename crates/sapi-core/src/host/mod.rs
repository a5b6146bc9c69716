//! Point-in-time readers for OS-level facts.
//!
//! Each reader is a stateless function that performs a single syscall or file
//! read and reports failure instead of guessing.

pub mod disk;
pub mod os_release;
pub mod uptime;

pub use disk::{DiskUsage, ROOT_FILESYSTEM, read_disk_usage};
pub use os_release::{OS_RELEASE_PATH, OsRelease, parse_key_values, read_os_release};
pub use uptime::{Uptime, read_uptime};
