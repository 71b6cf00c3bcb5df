use clamd_scan_rs::error::ClamdError;
use clamd_scan_rs::response::parse_scan_line;
use clamd_scan_rs::types::ScanStatus;

#[test]
fn verdict_lines_parse() {
    let clean = parse_scan_line("/etc/clamav/clamd.conf: OK").expect("parse ok");
    assert_eq!(clean.path, "/etc/clamav/clamd.conf");
    assert_eq!(clean.virus, None);
    assert_eq!(clean.status, ScanStatus::Ok);

    let hit = parse_scan_line("stream: Win.Test.EICAR_HDB-1 FOUND").expect("parse ok");
    assert_eq!(hit.path, "stream");
    assert_eq!(hit.virus.as_deref(), Some("Win.Test.EICAR_HDB-1"));
    assert_eq!(hit.status, ScanStatus::Found);
}

#[test]
fn refusals_surface_the_stripped_prefix() {
    // A status-only refusal has no path and must still fail loudly.
    match parse_scan_line("ERROR").expect_err("must not parse") {
        ClamdError::Response(payload) => assert_eq!(payload, ""),
        other => panic!("expected Response error, got {other:?}"),
    }

    match parse_scan_line("Unknown option passed. ERROR").expect_err("must not parse") {
        ClamdError::Response(payload) => assert_eq!(payload, "Unknown option passed. "),
        other => panic!("expected Response error, got {other:?}"),
    }
}
