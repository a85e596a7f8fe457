#![no_main]
use std::path::Path;

use libfuzzer_sys::fuzz_target;
use logaudit_conformance::parse::{parse_lattice_config, parse_lattice_output};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = parse_lattice_config(Path::new("fuzz.config"), s);
        let _ = parse_lattice_output(s);
    }
});
