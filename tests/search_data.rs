//! Round trips through the public API: build, encode, decode, query.

use proptest::prelude::*;
use searchdex::error::{CapacityField, SearchError};
use searchdex::index::widths::{NameWidth, OffsetWidth, ResultIdWidth};
use searchdex::index::{BinaryEncoder, Entry, EntryKind, IndexConfig, SearchData, TrieIndex};
use std::collections::BTreeSet;

fn encode(index: TrieIndex) -> Vec<u8> {
    BinaryEncoder::encode(&index.finalize().unwrap())
}

fn ids(results: &[searchdex::index::SearchResult<'_>]) -> Vec<u32> {
    results.iter().map(|r| r.id).collect()
}

#[test]
fn test_decoded_matches_in_memory_lookup() {
    let mut index = TrieIndex::new(IndexConfig::default());
    for name in ["Math", "Math::Vector", "Math::Range", "Math::min", "Magnum", "Magnum::GL"] {
        index
            .add(Entry::new(name, format!("{}.html", name.replace("::", "_")), EntryKind::Class))
            .unwrap();
    }
    let frozen = index.finalize().unwrap();
    let data = BinaryEncoder::encode(&frozen);
    let search = SearchData::parse(&data).unwrap();

    for prefix in ["", "m", "ma", "mat", "math", "math::", "math::v", "magnum::g", "gl", "x", "math::vectorx"] {
        assert_eq!(search.lookup(prefix).unwrap(), frozen.lookup(prefix), "prefix {prefix:?}");
    }
}

#[test]
fn test_prefix_bound_in_file() {
    let config = IndexConfig {
        max_prefix_results: 3,
        ..IndexConfig::default()
    };
    let mut index = TrieIndex::new(config);
    for i in 0..10 {
        index
            .add(Entry::new(format!("item{}", "x".repeat(i)), format!("{i}.html"), EntryKind::Page))
            .unwrap();
    }
    let data = encode(index);
    let search = SearchData::parse(&data).unwrap();

    let results = search.query("item").unwrap();
    // Exact match first, then the shortest names
    assert_eq!(ids(&results), vec![0, 1, 2]);
}

#[test]
fn test_usable_results_rank_before_deprecated() {
    let mut index = TrieIndex::new(IndexConfig::default());
    index.add(Entry::new("sort", "old.html", EntryKind::Function).deprecated()).unwrap();
    index.add(Entry::new("sorted", "new.html", EntryKind::Function)).unwrap();
    let data = encode(index);
    let search = SearchData::parse(&data).unwrap();

    let results = search.query("sor").unwrap();
    assert_eq!(ids(&results), vec![1, 0]);
    assert!(results[1].deprecated);
}

#[test]
fn test_case_sensitive_index() {
    let config = IndexConfig {
        case_insensitive: false,
        ..IndexConfig::default()
    };
    let mut index = TrieIndex::new(config);
    index.add(Entry::new("Foo", "a.html", EntryKind::Class)).unwrap();
    index.add(Entry::new("foo", "b.html", EntryKind::Function)).unwrap();
    let data = encode(index);
    let search = SearchData::parse(&data).unwrap();

    assert_eq!(ids(&search.query("F").unwrap()), vec![0]);
    assert_eq!(ids(&search.query("f").unwrap()), vec![1]);
}

#[test]
fn test_wide_widths_roundtrip() {
    let config = IndexConfig {
        min_name_width: NameWidth::Bits16,
        min_result_id_width: ResultIdWidth::Bits24,
        min_offset_width: OffsetWidth::Bits32,
        ..IndexConfig::default()
    };
    let mut index = TrieIndex::new(config);
    index.add(Entry::new("Corrade::Utility", "namespaceCorrade_1_1Utility.html", EntryKind::Namespace)).unwrap();
    let data = encode(index);
    let search = SearchData::parse(&data).unwrap();

    assert_eq!(search.widths().name, NameWidth::Bits16);
    assert_eq!(search.widths().result_id, ResultIdWidth::Bits24);
    assert_eq!(search.widths().offset, OffsetWidth::Bits32);
    assert_eq!(search.query("utility").unwrap()[0].url, "namespaceCorrade_1_1Utility.html");
}

#[test]
fn test_many_results_widen_ids() {
    let mut index = TrieIndex::new(IndexConfig {
        index_scope_suffixes: false,
        ..IndexConfig::default()
    });
    let count = 70_000u32;
    let entries: Vec<Entry> = (0..count)
        .map(|i| Entry::new(format!("n{i}"), "", EntryKind::Value))
        .collect();
    for entry in entries {
        index.add(entry).unwrap();
    }
    let data = encode(index);
    let search = SearchData::parse(&data).unwrap();
    assert_eq!(search.widths().result_id, ResultIdWidth::Bits24);
    assert_eq!(search.result_count(), count);
    assert_eq!(ids(&search.query("n69999").unwrap()), vec![69_999]);
}

#[test]
fn test_unsupported_character_error() {
    let mut index = TrieIndex::new(IndexConfig::default());
    let err = index.add(Entry::new("tab\there", "a.html", EntryKind::Page)).unwrap_err();
    assert!(matches!(
        err,
        SearchError::UnsupportedCharacter { character: '\t', position: 3, .. }
    ));
    assert!(index.results().is_empty());
}

#[test]
fn test_capacity_error_for_long_name() {
    let mut index = TrieIndex::new(IndexConfig::default());
    index.add(Entry::new("a".repeat(65_536), "a.html", EntryKind::Page)).unwrap();
    let err = index.finalize().unwrap_err();
    assert!(matches!(
        err,
        SearchError::CapacityExceeded { field: CapacityField::NameLength, value: 65_536, max: 65_535 }
    ));
}

fn name_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "ab", "::", "é", "Z"]), 1..6)
        .prop_map(|parts| parts.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_name_is_found(names in prop::collection::vec(name_strategy(), 1..40)) {
        let mut index = TrieIndex::new(IndexConfig::default());
        for (i, name) in names.iter().enumerate() {
            index.add(Entry::new(name.clone(), format!("{i}.html"), EntryKind::Function)).unwrap();
        }
        let data = encode(index);
        let search = SearchData::parse(&data).unwrap();

        for (i, name) in names.iter().enumerate() {
            let found = search.lookup(name).unwrap();
            prop_assert!(found.exact.contains(&(i as u32)), "{:?} misses {}", name, i);
        }
    }

    #[test]
    fn prop_aliases_are_found(entries in prop::collection::vec(
        (name_strategy(), prop::option::of(any::<prop::sample::Index>())),
        1..40,
    )) {
        let mut index = TrieIndex::new(IndexConfig::default());
        let mut urls: Vec<String> = Vec::new();
        for (i, (name, target)) in entries.iter().enumerate() {
            match target.filter(|_| i > 0) {
                Some(target) => {
                    let target = target.index(i);
                    index.add_alias(name.clone(), target as u32).unwrap();
                    urls.push(urls[target].clone());
                }
                None => {
                    index.add(Entry::new(name.clone(), format!("{i}.html"), EntryKind::Function)).unwrap();
                    urls.push(format!("{i}.html"));
                }
            }
        }
        let data = encode(index);
        let search = SearchData::parse(&data).unwrap();

        // Only results that render identically may stand in for each other
        for (i, (name, _)) in entries.iter().enumerate() {
            let exact = search.lookup(name).unwrap().exact;
            let found = exact.iter().any(|&id| {
                let result = search.result(id).unwrap();
                result.name == name.as_str() && result.url == urls[i]
            });
            prop_assert!(found, "{:?} -> {} missing from {:?}", name, urls[i], exact);
        }
    }

    #[test]
    fn prop_prefix_results_are_bounded_and_ranked(
        names in prop::collection::vec(name_strategy(), 1..60),
        bound in 1usize..8,
    ) {
        let config = IndexConfig { max_prefix_results: bound, ..IndexConfig::default() };
        let mut index = TrieIndex::new(config);
        for (i, name) in names.iter().enumerate() {
            index.add(Entry::new(name.clone(), format!("{i}.html"), EntryKind::Function)).unwrap();
        }
        let frozen = index.finalize().unwrap();
        let data = BinaryEncoder::encode(&frozen);
        let search = SearchData::parse(&data).unwrap();

        let mut bad = None;
        search.walk(|_, node| {
            let unique: BTreeSet<_> = node.prefix.iter().collect();
            if node.prefix.len() > bound || unique.len() != node.prefix.len() {
                bad = Some(node.offset);
            }
            let keys: Vec<_> = node.prefix.iter().map(|&id| frozen.results().rank_key(id)).collect();
            if !keys.windows(2).all(|w| w[0] < w[1]) {
                bad = Some(node.offset);
            }
        }).unwrap();
        prop_assert_eq!(bad, None);
    }

    #[test]
    fn prop_parallel_build_is_byte_identical(
        names in prop::collection::vec(name_strategy(), 0..80),
        chunk in 1usize..16,
    ) {
        let config = IndexConfig { parallel_chunk_size: chunk, max_prefix_results: 5, ..IndexConfig::default() };
        let entries: Vec<Entry> = names
            .iter()
            .enumerate()
            .map(|(i, name)| Entry::new(name.clone(), format!("{}.html", i % 5), EntryKind::Function))
            .collect();

        let mut sequential = TrieIndex::new(config.clone());
        for entry in entries.clone() {
            sequential.add(entry).unwrap();
        }
        let parallel = TrieIndex::build_parallel(config, entries).unwrap();
        prop_assert_eq!(encode(sequential), encode(parallel));
    }

    #[test]
    fn prop_every_prefix_reaches_its_entry(names in prop::collection::vec(name_strategy(), 1..20)) {
        // Bound large enough that nothing is evicted
        let config = IndexConfig { max_prefix_results: 1000, ..IndexConfig::default() };
        let mut index = TrieIndex::new(config);
        for (i, name) in names.iter().enumerate() {
            index.add(Entry::new(name.clone(), format!("{i}.html"), EntryKind::Page)).unwrap();
        }
        let data = encode(index);
        let search = SearchData::parse(&data).unwrap();

        for (i, name) in names.iter().enumerate() {
            for (end, _) in name.char_indices().skip(1).chain([(name.len(), ' ')]) {
                let found = search.lookup(&name[..end]).unwrap();
                prop_assert!(found.ordered().contains(&(i as u32)), "{:?} misses {:?}", &name[..end], name);
            }
        }
    }

    #[test]
    fn prop_encoding_is_deterministic(names in prop::collection::vec(name_strategy(), 0..30)) {
        let build = || {
            let mut index = TrieIndex::new(IndexConfig::default());
            for (i, name) in names.iter().enumerate() {
                index.add(Entry::new(name.clone(), format!("{i}.html"), EntryKind::Class)).unwrap();
            }
            encode(index)
        };
        prop_assert_eq!(build(), build());
    }

    #[test]
    fn prop_decoder_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut bytes = b"MCS\x02".to_vec();
        bytes.extend(data);
        if let Ok(search) = SearchData::parse(&bytes) {
            let _ = search.query("a");
            let _ = search.walk(|_, _| {});
            for id in 0..search.result_count().min(16) {
                let _ = search.result(id);
            }
        }
    }
}
