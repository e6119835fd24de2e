#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing is total: arbitrary input yields a spec or a list of token errors
    if let Ok(spec) = vidq::query::parse_filter(data) {
        // Canonical form must parse back to the same spec
        let reparsed = vidq::query::parse_filter(&spec.to_string());
        assert_eq!(reparsed.as_ref(), Ok(&spec));
    }
});
