#![no_main]

use libfuzzer_sys::fuzz_target;
use searchdex::index::SearchData;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decode to an error, never a panic or a hang
    if let Ok(search) = SearchData::parse(data) {
        let _ = search.query("");
        let _ = search.query("a");
        let _ = search.walk(|_, _| {});
    }
});
