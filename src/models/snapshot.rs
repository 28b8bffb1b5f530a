//! Snapshot data structures.
//!
//! A snapshot records the last state subscribers were notified about and
//! serves as the diff baseline for the next check cycle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Latest acknowledgement block from the security-acknowledgements page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AckSnapshot {
    /// Month heading, e.g. "June 2025"
    pub month: String,

    /// Credited names in page order
    pub names: Vec<String>,
}

/// Latest known firmware per OS family, as "version (build)" labels.
///
/// Sorted map so the persisted JSON stays stable across runs; notification
/// order comes from the configured device list, not from this map.
pub type FirmwareMap = BTreeMap<String, String>;

/// Security-fix details for one OS release.
///
/// Rebuilt on every check cycle and never persisted; it only enriches a
/// notification triggered by a firmware change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityDetail {
    /// OS family label
    pub os: String,

    /// One formatted line per extracted fix (or a single placeholder)
    pub fixes: Vec<String>,

    /// Release-note URL, if one was found on the index page
    pub link: Option<String>,
}

impl SecurityDetail {
    /// Detail with a single placeholder line and no link.
    pub fn placeholder(os: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            fixes: vec![line.into()],
            link: None,
        }
    }
}
