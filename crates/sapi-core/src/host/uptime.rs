//! Seconds since boot.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Host uptime snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uptime {
    pub uptime_seconds: u64,
}

/// Read the kernel's seconds-since-boot counter.
#[cfg(target_os = "linux")]
pub fn read_uptime() -> Result<Uptime> {
    // SAFETY: `sysinfo` is a plain C struct; all-zero is a valid value for it.
    let mut info: libc::sysinfo = unsafe { std::mem::zeroed() };
    // SAFETY: `info` is a valid, writable `sysinfo` for the duration of the call.
    let rc = unsafe { libc::sysinfo(&mut info) };
    if rc != 0 {
        return Err(Error::Uptime(std::io::Error::last_os_error()));
    }
    Ok(Uptime {
        uptime_seconds: info.uptime.max(0) as u64,
    })
}

/// Read the kernel's seconds-since-boot counter.
#[cfg(not(target_os = "linux"))]
pub fn read_uptime() -> Result<Uptime> {
    Err(Error::Uptime(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "uptime is only available on linux",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn reads_nonzero_uptime() {
        let uptime = read_uptime().unwrap();
        assert!(uptime.uptime_seconds > 0);
    }

    #[test]
    fn serializes_single_field() {
        let json = serde_json::to_value(Uptime {
            uptime_seconds: 42,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "uptime_seconds": 42 }));
    }
}
