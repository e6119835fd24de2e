#![no_main]

use libfuzzer_sys::fuzz_target;
use vidq::query::{CompiledQuery, parse_filter};
use vidq::store::CaseFolding;

fuzz_target!(|data: &str| {
    if let Ok(spec) = parse_filter(data) {
        let compiled = CompiledQuery::from_filter(&spec, CaseFolding::Unicode);
        // Operands are always bound, never spliced into the SQL text
        for param in compiled.params() {
            if let vidq::query::SqlValue::Text(text) = param {
                assert!(!text.is_empty());
            }
        }
    }
});
