pub mod build;
pub mod builder;
pub mod layout;
pub mod reader;
pub mod results;
pub mod stats;
pub mod trie;
pub mod types;
pub mod widths;
pub mod writer;

pub use builder::TrieIndex;
pub use layout::FrozenIndex;
pub use reader::{SearchData, SearchResult};
pub use types::*;
pub use writer::BinaryEncoder;
