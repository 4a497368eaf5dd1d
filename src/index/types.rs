use crate::index::widths::{NameWidth, OffsetWidth, ResultIdWidth};
use serde::{Deserialize, Serialize};

/// Dense identifier of an entry in the result table
pub type ResultId = u32;

/// Index of a node in the trie arena
pub type NodeId = u32;

/// Format version written into the header
pub const FORMAT_VERSION: u8 = 2;

/// Signature at the start of every search data blob
pub const MAGIC: [u8; 3] = *b"MCS";

/// Kind of a documented item.
///
/// The discriminant is the tag stored in the result table. `Alias` is
/// reserved for entries that redirect to another entry and take their kind
/// from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EntryKind {
    Alias = 0,
    Page = 1,
    Module = 2,
    Namespace = 3,
    Group = 4,
    Class = 5,
    Struct = 6,
    Union = 7,
    Typedef = 8,
    Enum = 9,
    Dir = 10,
    File = 11,
    Function = 12,
    Property = 13,
    Define = 14,
    EnumValue = 15,
    Variable = 16,
    Value = 17,
}

impl EntryKind {
    pub const ALL: [EntryKind; 18] = [
        EntryKind::Alias,
        EntryKind::Page,
        EntryKind::Module,
        EntryKind::Namespace,
        EntryKind::Group,
        EntryKind::Class,
        EntryKind::Struct,
        EntryKind::Union,
        EntryKind::Typedef,
        EntryKind::Enum,
        EntryKind::Dir,
        EntryKind::File,
        EntryKind::Function,
        EntryKind::Property,
        EntryKind::Define,
        EntryKind::EnumValue,
        EntryKind::Variable,
        EntryKind::Value,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Label rendered next to a search result
    pub fn label(self) -> &'static str {
        match self {
            EntryKind::Alias => "alias",
            EntryKind::Page => "page",
            EntryKind::Module => "module",
            EntryKind::Namespace => "namespace",
            EntryKind::Group => "group",
            EntryKind::Class => "class",
            EntryKind::Struct => "struct",
            EntryKind::Union => "union",
            EntryKind::Typedef => "typedef",
            EntryKind::Enum => "enum",
            EntryKind::Dir => "dir",
            EntryKind::File => "file",
            EntryKind::Function => "func",
            EntryKind::Property => "property",
            EntryKind::Define => "define",
            EntryKind::EnumValue => "enum val",
            EntryKind::Variable => "var",
            EntryKind::Value => "data",
        }
    }

    pub fn css_class(self) -> CssClass {
        match self {
            EntryKind::Alias => CssClass::Default,
            EntryKind::Page | EntryKind::Group => CssClass::Success,
            EntryKind::Module
            | EntryKind::Namespace
            | EntryKind::Class
            | EntryKind::Struct
            | EntryKind::Union
            | EntryKind::Typedef
            | EntryKind::Enum => CssClass::Primary,
            EntryKind::Dir | EntryKind::File => CssClass::Warning,
            EntryKind::Function | EntryKind::Property | EntryKind::Define => CssClass::Info,
            EntryKind::EnumValue | EntryKind::Variable | EntryKind::Value => CssClass::Default,
        }
    }
}

/// Visual category of a kind, stored in the type map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CssClass {
    Default = 0,
    Primary = 1,
    Success = 2,
    Warning = 3,
    Danger = 4,
    Info = 5,
    Dim = 6,
}

impl CssClass {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(CssClass::Default),
            1 => Some(CssClass::Primary),
            2 => Some(CssClass::Success),
            3 => Some(CssClass::Warning),
            4 => Some(CssClass::Danger),
            5 => Some(CssClass::Info),
            6 => Some(CssClass::Dim),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CssClass::Default => "m-default",
            CssClass::Primary => "m-primary",
            CssClass::Success => "m-success",
            CssClass::Warning => "m-warning",
            CssClass::Danger => "m-danger",
            CssClass::Info => "m-info",
            CssClass::Dim => "m-dim",
        }
    }
}

/// Entry flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct EntryFlags(pub u8);

impl EntryFlags {
    pub const NONE: u8 = 0;
    pub const DEPRECATED: u8 = 1 << 0;
    pub const DELETED: u8 = 1 << 1;

    pub fn new() -> Self {
        Self(Self::NONE)
    }

    pub fn is_deprecated(&self) -> bool {
        self.0 & Self::DEPRECATED != 0
    }

    pub fn is_deleted(&self) -> bool {
        self.0 & Self::DELETED != 0
    }

    pub fn set_deprecated(&mut self) {
        self.0 |= Self::DEPRECATED;
    }

    pub fn set_deleted(&mut self) {
        self.0 |= Self::DELETED;
    }

    /// Ranking status: usable first, deleted next, deprecated last
    pub fn status(&self) -> u8 {
        if self.is_deprecated() {
            2
        } else if self.is_deleted() {
            1
        } else {
            0
        }
    }
}

/// One indexable documentation item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub url: String,
    pub kind: EntryKind,
    pub alias: Option<ResultId>,
    pub flags: EntryFlags,
    /// Bytes at the end of `name` that are not part of the searchable text
    pub suffix_length: u8,
    /// Extra search terms that reach this entry as completions only
    pub keywords: Vec<String>,
}

impl Entry {
    pub fn new(name: impl Into<String>, url: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            kind,
            alias: None,
            flags: EntryFlags::new(),
            suffix_length: 0,
            keywords: Vec::new(),
        }
    }

    /// Create an entry redirecting to `target`
    pub fn alias(name: impl Into<String>, target: ResultId) -> Self {
        Self {
            alias: Some(target),
            ..Self::new(name, String::new(), EntryKind::Alias)
        }
    }

    pub fn deprecated(mut self) -> Self {
        self.flags.set_deprecated();
        self
    }

    pub fn deleted(mut self) -> Self {
        self.flags.set_deleted();
        self
    }

    pub fn with_suffix_length(mut self, suffix_length: u8) -> Self {
        self.suffix_length = suffix_length;
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn is_alias(&self) -> bool {
        self.alias.is_some()
    }
}

/// One row of the per-file type map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapEntry {
    pub kind: EntryKind,
    pub css_class: CssClass,
    pub label: String,
}

impl TypeMapEntry {
    pub fn for_kind(kind: EntryKind) -> Self {
        Self {
            kind,
            css_class: kind.css_class(),
            label: kind.label().to_string(),
        }
    }
}

/// Match of a query against a trie node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryMatch {
    /// Results whose indexed text equals the query
    pub exact: Vec<ResultId>,
    /// Results whose indexed text starts with the query, best ranked first
    pub prefix: Vec<ResultId>,
}

impl QueryMatch {
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.prefix.is_empty()
    }

    /// Exact results first, then the remaining completions
    pub fn ordered(&self) -> Vec<ResultId> {
        let mut ids = self.exact.clone();
        for &id in &self.prefix {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

/// Configuration for building a search index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Prefix the lookup script prepends to result URLs
    pub symbol_prefix: String,
    /// Lowercase indexed text and queries
    pub case_insensitive: bool,
    /// Bound on the completions cached per trie node
    pub max_prefix_results: usize,
    /// Also index `b::c` and `c` for a name `a::b::c`
    pub index_scope_suffixes: bool,
    pub scope_separator: String,
    pub min_name_width: NameWidth,
    pub min_result_id_width: ResultIdWidth,
    pub min_offset_width: OffsetWidth,
    /// Output file names are `<prefix>-v<version>.bin` and `.js`
    pub filename_prefix: String,
    /// Entries per sub-trie in the parallel build
    pub parallel_chunk_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            symbol_prefix: String::new(),
            case_insensitive: true,
            max_prefix_results: 100,
            index_scope_suffixes: true,
            scope_separator: "::".to_string(),
            min_name_width: NameWidth::Bits8,
            min_result_id_width: ResultIdWidth::Bits16,
            min_offset_width: OffsetWidth::Bits24,
            filename_prefix: "search".to_string(),
            parallel_chunk_size: 4096,
        }
    }
}

impl IndexConfig {
    /// Load a configuration file, falling back to defaults for missing keys
    pub fn from_json_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }

    pub fn binary_filename(&self) -> String {
        format!("{}-v{}.bin", self.filename_prefix, FORMAT_VERSION)
    }

    pub fn script_filename(&self) -> String {
        format!("{}-v{}.js", self.filename_prefix, FORMAT_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_are_dense() {
        for (i, kind) in EntryKind::ALL.iter().enumerate() {
            assert_eq!(kind.tag() as usize, i);
            assert_eq!(EntryKind::from_tag(i as u8), Some(*kind));
        }
        assert_eq!(EntryKind::from_tag(EntryKind::ALL.len() as u8), None);
    }

    #[test]
    fn test_flags_status_order() {
        let usable = EntryFlags::new();
        let mut deleted = EntryFlags::new();
        deleted.set_deleted();
        let mut deprecated = EntryFlags::new();
        deprecated.set_deprecated();
        deprecated.set_deleted();

        assert!(usable.status() < deleted.status());
        assert!(deleted.status() < deprecated.status());
    }

    #[test]
    fn test_config_partial_json() {
        let config: IndexConfig =
            serde_json::from_str(r#"{"symbol_prefix": "api/", "max_prefix_results": 5}"#).unwrap();
        assert_eq!(config.symbol_prefix, "api/");
        assert_eq!(config.max_prefix_results, 5);
        assert!(config.case_insensitive);
        assert_eq!(config.binary_filename(), "search-v2.bin");
        assert_eq!(config.script_filename(), "search-v2.js");
    }

    #[test]
    fn test_query_match_ordering() {
        let m = QueryMatch {
            exact: vec![3],
            prefix: vec![1, 3, 2],
        };
        assert_eq!(m.ordered(), vec![3, 1, 2]);
    }
}
