//! Cheap change detection for the remote roster.
//!
//! The version token is a blake3 digest of `"{row_count}-{last row cells
//! concatenated}"` over the full value matrix, header included. Appends and
//! edits to the last row change it; an edit to any other row that keeps the
//! row count does not. Callers treat equal tokens as "unchanged" and accept
//! that blind spot.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint a value matrix as returned by `get_all_values()`.
pub fn fingerprint(values: &[Vec<String>]) -> VersionToken {
    let last_row: String = values.last().map(|row| row.concat()).unwrap_or_default();
    let version_str = format!("{}-{}", values.len(), last_row);
    VersionToken(blake3::hash(version_str.as_bytes()).to_hex().to_string())
}
