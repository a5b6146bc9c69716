//! `/etc/os-release` identity metadata.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Well-known location of the OS identification file.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Raw os-release keys and values, quotes left as found.
pub type OsRelease = BTreeMap<String, String>;

/// Parse `KEY=VALUE` lines.
///
/// Blank lines and lines starting with `#` are skipped, lines without `=` are
/// ignored, and only the first `=` separates key from value. A repeated key
/// keeps its last value.
pub fn parse_key_values(text: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for line in text.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        out.insert(key.to_string(), value.to_string());
    }
    out
}

/// Read and parse an os-release style file.
pub fn read_os_release(path: impl AsRef<Path>) -> Result<OsRelease> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| Error::OsRelease {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_key_values(&text))
}
