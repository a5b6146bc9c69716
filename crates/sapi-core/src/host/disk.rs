//! Filesystem capacity for a mount point.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mount point reported by the disk usage endpoint.
pub const ROOT_FILESYSTEM: &str = "/";

/// Capacity snapshot of one filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub used_bytes: u64,
    pub used_percent: f64,
}

impl DiskUsage {
    /// Derive byte counts from raw block counters.
    ///
    /// `used_percent` is `0.0` when the filesystem reports no blocks at all.
    pub fn from_blocks(blocks: u64, free_blocks: u64, block_size: u64) -> Self {
        let total_bytes = blocks.saturating_mul(block_size);
        let free_bytes = free_blocks.saturating_mul(block_size);
        let used_bytes = total_bytes.saturating_sub(free_bytes);
        let used_percent = if total_bytes == 0 {
            0.0
        } else {
            used_bytes as f64 / total_bytes as f64 * 100.0
        };

        Self {
            total_bytes,
            free_bytes,
            used_bytes,
            used_percent,
        }
    }
}

/// Stat the filesystem containing `path`.
#[cfg(unix)]
pub fn read_disk_usage(path: impl AsRef<Path>) -> Result<DiskUsage> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let path = path.as_ref();
    let stat_err = |source| Error::DiskUsage {
        path: path.display().to_string(),
        source,
    };

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| stat_err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?;

    // SAFETY: `statvfs` is a plain C struct; all-zero is a valid value for it.
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    // SAFETY: `c_path` is NUL-terminated and `stat` is valid for writes.
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(stat_err(std::io::Error::last_os_error()));
    }

    Ok(DiskUsage::from_blocks(
        stat.f_blocks as u64,
        stat.f_bfree as u64,
        stat.f_frsize as u64,
    ))
}

/// Stat the filesystem containing `path`.
#[cfg(not(unix))]
pub fn read_disk_usage(path: impl AsRef<Path>) -> Result<DiskUsage> {
    Err(Error::DiskUsage {
        path: path.as_ref().display().to_string(),
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "statvfs is only available on unix",
        ),
    })
}
