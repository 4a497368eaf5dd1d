//! # searchdex - compact prefix search for documentation sites
//!
//! searchdex turns a list of documentation entries (pages, classes,
//! functions, ...) into a small binary blob that a static search page can
//! query without a server. The blob holds an edge-compressed prefix trie whose
//! nodes cache a bounded, ranked list of completions, plus a result table.
//!
//! ## Architecture
//!
//! - [`index`] - Trie building, binary layout, encoder and decoder
//! - [`output`] - Terminal rendering of query results
//! - [`utils`] - Integer encoding, base85, text normalization, progress bars
//! - [`error`] - Library error type
//!
//! ## Quick Start
//!
//! ```
//! use searchdex::index::{BinaryEncoder, Entry, EntryKind, IndexConfig, SearchData, TrieIndex};
//!
//! let mut index = TrieIndex::new(IndexConfig::default());
//! let range = index.add(Entry::new("Math::Range", "classMath_1_1Range.html", EntryKind::Class))?;
//! index.add_alias("Math::Rect", range)?;
//!
//! let data = BinaryEncoder::encode(&index.finalize()?);
//! let search = SearchData::parse(&data)?;
//!
//! for result in search.query("rect")? {
//!     println!("{} -> {}", result.name, result.url);
//! }
//! # Ok::<(), searchdex::error::SearchError>(())
//! ```
//!
//! Widths of lengths, result IDs and offsets grow with the corpus, so small
//! sites get a 24-bit-offset file while large ones still fit.

pub mod error;
pub mod index;
pub mod output;
pub mod utils;
