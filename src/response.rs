use std::sync::LazyLock;

use regex::Regex;

use crate::error::ClamdError;
use crate::types::ScanStatus;

/// Verdict line grammar shared by SCAN, CONTSCAN, MULTISCAN and INSTREAM:
/// `<path>: [<virus> ]<FOUND|OK|ERROR>`. The virus group is present only for
/// `FOUND` lines (and carries the daemon's reason text on `ERROR` lines).
static SCAN_RESPONSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>.*): ((?P<virus>.+) )?(?P<status>FOUND|OK|ERROR)$")
        .expect("verdict grammar is a valid pattern")
});

/// One parsed verdict line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub path: String,
    pub virus: Option<String>,
    pub status: ScanStatus,
}

/// Parse one response line into `(path, virus, status)`.
///
/// The line is trimmed before matching, so trailing newlines from the wire
/// are harmless. A line that does not match the grammar is never dropped:
/// it fails with [`ClamdError::Response`] carrying the text before any
/// trailing `ERROR` marker, so daemon refusals without a leading path still
/// fail loudly with their message as the payload.
pub fn parse_scan_line(line: &str) -> Result<ParsedLine, ClamdError> {
    let line = line.trim();
    let caps = SCAN_RESPONSE
        .captures(line)
        .ok_or_else(|| ClamdError::Response(error_prefix(line).to_string()))?;

    // The alternation admits exactly these three words.
    let status = match &caps["status"] {
        "FOUND" => ScanStatus::Found,
        "OK" => ScanStatus::Ok,
        _ => ScanStatus::Error,
    };

    Ok(ParsedLine {
        path: caps["path"].to_string(),
        virus: caps.name("virus").map(|m| m.as_str().to_string()),
        status,
    })
}

/// The text preceding the last `ERROR` marker, or the whole line when the
/// marker is absent.
fn error_prefix(line: &str) -> &str {
    line.rsplit_once("ERROR").map_or(line, |(prefix, _)| prefix)
}
