//! Error types for index construction, encoding and decoding.

use thiserror::Error;

/// Result type for search index operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Field whose value did not fit the widest supported encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityField {
    /// Byte length of a name, URL, edge label, type label or symbol prefix
    NameLength,
    /// Number of result entries
    ResultCount,
    /// Number of children of a single trie node
    ChildCount,
    /// Number of distinct kinds in the type map
    TypeCount,
    /// Total size of the serialized file
    FileSize,
}

impl std::fmt::Display for CapacityField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CapacityField::NameLength => "name length",
            CapacityField::ResultCount => "result count",
            CapacityField::ChildCount => "child count",
            CapacityField::TypeCount => "type count",
            CapacityField::FileSize => "file size",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while building, encoding or decoding a search index.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Indexed text contains a character outside the supported alphabet.
    #[error("unsupported character {character:?} at byte {position} in {text:?}")]
    UnsupportedCharacter {
        /// The offending text
        text: String,
        /// The rejected character
        character: char,
        /// Byte position of the character in `text`
        position: usize,
    },

    /// The corpus does not fit the widest encoding of a field.
    #[error("{field} of {value} exceeds the supported maximum of {max}")]
    CapacityExceeded {
        /// Field that overflowed
        field: CapacityField,
        /// Observed value
        value: u64,
        /// Largest representable value
        max: u64,
    },

    /// The blob was written with a format version this decoder does not read.
    #[error("unsupported search data version {found}, expected {supported}")]
    FormatVersionMismatch {
        /// Version found in the header
        found: u8,
        /// Version supported by this decoder
        supported: u8,
    },

    /// The blob does not start with the search data signature.
    #[error("invalid search data signature")]
    InvalidMagic,

    /// The blob is truncated or internally inconsistent.
    #[error("corrupt search data: {0}")]
    Corrupt(String),

    /// I/O failure while writing output files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SearchError {
    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        SearchError::Corrupt(message.into())
    }
}
