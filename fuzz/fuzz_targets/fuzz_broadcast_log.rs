#![no_main]
use std::path::Path;

use libfuzzer_sys::fuzz_target;
use logaudit_conformance::parse::parse_broadcast_log;
use logaudit_conformance::BroadcastChecker;
use logaudit_trace::ProcessIndex;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Parsing and checking must never panic on any input.
        if let Ok(log) = parse_broadcast_log(ProcessIndex(0), Path::new("fuzz.output"), s) {
            let _ = BroadcastChecker::new(4, 8).check(&[log]);
        }
    }
});
