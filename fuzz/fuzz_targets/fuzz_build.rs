#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use searchdex::index::{BinaryEncoder, Entry, EntryKind, IndexConfig, SearchData, TrieIndex};

#[derive(Debug, Arbitrary)]
struct Input {
    names: Vec<(String, u8)>,
    max_prefix_results: u8,
    query: String,
}

fuzz_target!(|input: Input| {
    let config = IndexConfig {
        max_prefix_results: input.max_prefix_results as usize + 1,
        ..IndexConfig::default()
    };
    let mut index = TrieIndex::new(config);
    for (name, url) in input.names {
        let _ = index.add(Entry::new(name, format!("{url}.html"), EntryKind::Function));
    }
    let Ok(frozen) = index.finalize() else {
        return;
    };
    let data = BinaryEncoder::encode(&frozen);
    let search = SearchData::parse(&data).expect("encoded data must decode");
    assert_eq!(search.lookup(&input.query).unwrap(), frozen.lookup(&input.query));
});
