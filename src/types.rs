use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Status word clamd reports for a scanned path or stream.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanStatus {
    Ok,
    Found,
    Error,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            ScanStatus::Ok => "OK",
            ScanStatus::Found => "FOUND",
            ScanStatus::Error => "ERROR",
        };
        f.write_str(word)
    }
}

/// One verdict from the daemon: the status plus its detail text, which is
/// the virus name for `FOUND` and the daemon's reason for `ERROR`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanVerdict {
    pub status: ScanStatus,
    pub detail: Option<String>,
}

/// Aggregate scan result: reported path (or `"stream"`) to its verdict.
/// When the daemon reports a path more than once, the last line wins.
pub type ScanOutcome = HashMap<String, ScanVerdict>;
