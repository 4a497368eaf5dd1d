use crate::error::{Result, SearchError};
use crate::index::layout::{FLAG_CASE_INSENSITIVE, HEADER_SIZE};
use crate::index::types::*;
use crate::index::widths::{FormatWidths, NameWidth, OffsetWidth, ResultIdWidth, WidthClass};
use crate::utils::{ByteReader, normalize_text, read_uint};
use serde::Serialize;

/// A result resolved from the result table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult<'a> {
    pub id: ResultId,
    pub name: &'a str,
    /// URL of the entry, or of its target for aliases
    pub url: &'a str,
    /// Kind of the entry, or of its target for aliases
    pub kind: EntryKind,
    pub css_class: CssClass,
    pub label: &'a str,
    pub deprecated: bool,
    pub deleted: bool,
    pub suffix_length: u8,
    pub alias_of: Option<ResultId>,
}

/// A trie node as stored in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeView<'a> {
    pub offset: usize,
    pub label: &'a [u8],
    /// (first byte, absolute offset) per child
    pub children: Vec<(u8, usize)>,
    pub exact: Vec<ResultId>,
    pub prefix: Vec<ResultId>,
}

/// One type map row, borrowing its label from the data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRow<'a> {
    pub kind: EntryKind,
    pub css_class: CssClass,
    pub label: &'a str,
}

/// One result table record before alias resolution
#[derive(Debug, Clone, PartialEq, Eq)]
struct Record<'a> {
    flags: EntryFlags,
    kind: EntryKind,
    alias: Option<ResultId>,
    suffix_length: u8,
    name: &'a str,
    url: &'a str,
}

/// Read-only view over encoded search data.
///
/// Borrows the bytes, so it works the same over a `Vec<u8>` and a memory
/// mapped file.
#[derive(Debug, Clone)]
pub struct SearchData<'a> {
    data: &'a [u8],
    version: u8,
    widths: FormatWidths,
    flags: u8,
    result_count: u32,
    results_offset: usize,
    /// First byte after the result offset table
    records_offset: usize,
    trie_offset: usize,
    symbol_prefix: &'a str,
    type_map: Vec<TypeRow<'a>>,
}

impl<'a> SearchData<'a> {
    /// Validate the header and sections of `data`
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < 4 || data[..3] != MAGIC {
            return Err(SearchError::InvalidMagic);
        }
        let version = data[3];
        if version != FORMAT_VERSION {
            return Err(SearchError::FormatVersionMismatch {
                found: version,
                supported: FORMAT_VERSION,
            });
        }

        let mut header = ByteReader::new(data, 4);
        let name = header.read_u8()?;
        let result_id = header.read_u8()?;
        let offset = header.read_u8()?;
        let widths = FormatWidths {
            name: NameWidth::from_selector(name)
                .ok_or_else(|| SearchError::corrupt(format!("unknown name width {name}")))?,
            result_id: ResultIdWidth::from_selector(result_id)
                .ok_or_else(|| SearchError::corrupt(format!("unknown result ID width {result_id}")))?,
            offset: OffsetWidth::from_selector(offset)
                .ok_or_else(|| SearchError::corrupt(format!("unknown offset width {offset}")))?,
        };
        let flags = header.read_u8()?;
        let result_count = header.read_u32()?;
        let type_map_offset = header.read_u32()? as usize;
        let results_offset = header.read_u32()? as usize;
        let trie_offset = header.read_u32()? as usize;
        let symbol_prefix = header.read_str(widths.name.bytes())?;
        debug_assert!(header.position() >= HEADER_SIZE);

        if result_count >= widths.result_id.sentinel() {
            return Err(SearchError::corrupt(format!(
                "{result_count} results do not fit {} bit IDs",
                widths.result_id.bytes() * 8
            )));
        }
        if !(header.position() <= type_map_offset
            && type_map_offset <= results_offset
            && results_offset <= trie_offset
            && trie_offset < data.len())
        {
            return Err(SearchError::corrupt("section offsets out of order"));
        }
        let table_end = (result_count as usize + 1)
            .checked_mul(widths.offset.bytes())
            .and_then(|n| n.checked_add(results_offset));
        let Some(records_offset) = table_end.filter(|&end| end <= trie_offset) else {
            return Err(SearchError::corrupt("result offsets overlap the trie"));
        };

        let type_map = read_type_map(data, type_map_offset, widths)?;

        Ok(Self {
            data,
            version,
            widths,
            flags,
            result_count,
            results_offset,
            records_offset,
            trie_offset,
            symbol_prefix,
            type_map,
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn widths(&self) -> FormatWidths {
        self.widths
    }

    pub fn symbol_prefix(&self) -> &'a str {
        self.symbol_prefix
    }

    pub fn result_count(&self) -> u32 {
        self.result_count
    }

    pub fn case_insensitive(&self) -> bool {
        self.flags & FLAG_CASE_INSENSITIVE != 0
    }

    pub fn type_map(&self) -> &[TypeRow<'a>] {
        &self.type_map
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result_count == 0
    }

    pub fn root_offset(&self) -> usize {
        self.trie_offset
    }

    /// Walk the trie byte by byte.
    ///
    /// A prefix ending inside an edge label yields the child's completions
    /// and no exact results; a prefix leaving the trie yields nothing.
    pub fn lookup(&self, prefix: &str) -> Result<QueryMatch> {
        let text = normalize_text(prefix, self.case_insensitive());
        let mut rest = text.as_bytes();
        let mut node = self.node(self.trie_offset)?;

        while !rest.is_empty() {
            let Some(&(_, child_offset)) = node.children.iter().find(|(first, _)| *first == rest[0]) else {
                return Ok(QueryMatch::default());
            };
            let child = self.node(child_offset)?;
            let common = child
                .label
                .iter()
                .zip(rest)
                .take_while(|(a, b)| a == b)
                .count();

            if common == rest.len() && common < child.label.len() {
                return Ok(QueryMatch {
                    exact: Vec::new(),
                    prefix: child.prefix,
                });
            }
            if common < child.label.len() {
                return Ok(QueryMatch::default());
            }
            rest = &rest[common..];
            node = child;
        }

        Ok(QueryMatch {
            exact: node.exact,
            prefix: node.prefix,
        })
    }

    /// Exact matches first, then the remaining completions
    pub fn query(&self, prefix: &str) -> Result<Vec<SearchResult<'a>>> {
        self.lookup(prefix)?
            .ordered()
            .into_iter()
            .map(|id| self.result(id))
            .collect()
    }

    /// Resolve a result, following aliases for URL and kind
    pub fn result(&self, id: ResultId) -> Result<SearchResult<'a>> {
        let record = self.record(id)?;

        let mut target = record.clone();
        let mut hops = 0;
        while let (EntryKind::Alias, Some(next)) = (target.kind, target.alias) {
            hops += 1;
            if hops > self.result_count {
                return Err(SearchError::corrupt(format!("alias cycle at result {id}")));
            }
            target = self.record(next)?;
        }

        let row = self
            .type_map
            .iter()
            .find(|row| row.kind == target.kind)
            .ok_or_else(|| SearchError::corrupt(format!("kind {:?} missing from type map", target.kind)))?;

        Ok(SearchResult {
            id,
            name: record.name,
            url: target.url,
            kind: target.kind,
            css_class: row.css_class,
            label: row.label,
            deprecated: record.flags.is_deprecated(),
            deleted: record.flags.is_deleted(),
            suffix_length: record.suffix_length,
            alias_of: record.alias,
        })
    }

    /// Decode the node stored at `offset`
    pub fn node(&self, offset: usize) -> Result<NodeView<'a>> {
        if offset < self.trie_offset {
            return Err(SearchError::corrupt(format!("node offset {offset} is before the trie")));
        }
        let mut reader = ByteReader::new(self.data, offset);
        let label_len = reader.read_uint(self.widths.name.bytes())? as usize;
        let label = reader.read_bytes(label_len)?;

        let child_count = reader.read_u8()? as usize;
        let mut children = Vec::with_capacity(child_count);
        for _ in 0..child_count {
            let first = reader.read_u8()?;
            let child = reader.read_uint(self.widths.offset.bytes())? as usize;
            // Children are laid out after their parent, which also rules out loops
            if child <= offset || child >= self.data.len() {
                return Err(SearchError::corrupt(format!("bad child offset {child} in node at {offset}")));
            }
            children.push((first, child));
        }

        let exact = self.read_ids(&mut reader)?;
        let prefix = self.read_ids(&mut reader)?;
        Ok(NodeView {
            offset,
            label,
            children,
            exact,
            prefix,
        })
    }

    /// Visit every node in pre-order with its depth
    pub fn walk(&self, mut visit: impl FnMut(usize, &NodeView<'a>)) -> Result<()> {
        let mut stack = vec![(0, self.trie_offset)];
        let mut visited = 0usize;
        while let Some((depth, offset)) = stack.pop() {
            visited += 1;
            // Shared subtrees in a corrupt file would otherwise blow up
            if visited > self.data.len() - self.trie_offset {
                return Err(SearchError::corrupt("trie has more nodes than bytes"));
            }
            let node = self.node(offset)?;
            visit(depth, &node);
            stack.extend(node.children.iter().rev().map(|&(_, child)| (depth + 1, child)));
        }
        Ok(())
    }

    fn read_ids(&self, reader: &mut ByteReader<'a>) -> Result<Vec<ResultId>> {
        let bytes = self.widths.result_id.bytes();
        let count = reader.read_uint(bytes)? as usize;
        if count > self.result_count as usize {
            return Err(SearchError::corrupt(format!(
                "{count} IDs in a set of a {} result index",
                self.result_count
            )));
        }
        (0..count)
            .map(|_| {
                let id = reader.read_uint(bytes)? as ResultId;
                if id >= self.result_count {
                    return Err(SearchError::corrupt(format!("result ID {id} out of range")));
                }
                Ok(id)
            })
            .collect()
    }

    fn record(&self, id: ResultId) -> Result<Record<'a>> {
        if id >= self.result_count {
            return Err(SearchError::corrupt(format!("result ID {id} out of range")));
        }
        let width = self.widths.offset.bytes();
        let slot = self.results_offset + id as usize * width;
        let start = read_uint(self.data, slot, width).ok_or_else(|| SearchError::corrupt("truncated result offsets"))?
            as usize;
        let end = read_uint(self.data, slot + width, width)
            .ok_or_else(|| SearchError::corrupt("truncated result offsets"))? as usize;
        if start < self.records_offset || start > end || end > self.trie_offset {
            return Err(SearchError::corrupt(format!("bad bounds for result {id}")));
        }

        let record = &self.data[..end];
        let mut reader = ByteReader::new(record, start);
        let flags = EntryFlags(reader.read_u8()?);
        let tag = reader.read_u8()?;
        let kind = EntryKind::from_tag(tag).ok_or_else(|| SearchError::corrupt(format!("unknown kind tag {tag}")))?;
        let alias = reader.read_uint(self.widths.result_id.bytes())? as u32;
        let suffix_length = reader.read_u8()?;
        let name = reader.read_str(self.widths.name.bytes())?;
        let url = reader.read_str(self.widths.name.bytes())?;

        let alias = (alias != self.widths.result_id.sentinel()).then_some(alias);
        if (kind == EntryKind::Alias) != alias.is_some() {
            return Err(SearchError::corrupt(format!("result {id} has an inconsistent alias")));
        }
        Ok(Record {
            flags,
            kind,
            alias,
            suffix_length,
            name,
            url,
        })
    }
}

fn read_type_map(data: &[u8], offset: usize, widths: FormatWidths) -> Result<Vec<TypeRow<'_>>> {
    let mut reader = ByteReader::new(data, offset);
    let count = reader.read_u8()?;
    let mut rows = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let tag = reader.read_u8()?;
        let css = reader.read_u8()?;
        let label = reader.read_str(widths.name.bytes())?;
        rows.push(TypeRow {
            kind: EntryKind::from_tag(tag)
                .ok_or_else(|| SearchError::corrupt(format!("unknown kind tag {tag} in type map")))?,
            css_class: CssClass::from_u8(css)
                .ok_or_else(|| SearchError::corrupt(format!("unknown css class {css}")))?,
            label,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::builder::TrieIndex;
    use crate::index::writer::BinaryEncoder;

    fn encode(entries: Vec<Entry>, config: IndexConfig) -> Vec<u8> {
        let mut index = TrieIndex::new(config);
        for entry in entries {
            index.add(entry).unwrap();
        }
        BinaryEncoder::encode(&index.finalize().unwrap())
    }

    fn foo_data() -> Vec<u8> {
        encode(
            vec![
                Entry::new("foo", "foo.html", EntryKind::Function),
                Entry::new("foobar", "foobar.html", EntryKind::Function),
                Entry::new("baz", "baz.html", EntryKind::Function),
            ],
            IndexConfig::default(),
        )
    }

    #[test]
    fn test_lookup_scenarios() {
        let data = foo_data();
        let search = SearchData::parse(&data).unwrap();

        let fo = search.lookup("fo").unwrap();
        assert!(fo.exact.is_empty());
        assert_eq!(fo.prefix, vec![0, 1]);

        let foo = search.lookup("foo").unwrap();
        assert_eq!(foo.exact, vec![0]);
        assert_eq!(foo.prefix, vec![0, 1]);

        let foob = search.lookup("foob").unwrap();
        assert!(foob.exact.is_empty());
        assert_eq!(foob.prefix, vec![1]);

        assert!(search.lookup("x").unwrap().is_empty());
        assert!(search.lookup("bazz").unwrap().is_empty());
        assert_eq!(search.lookup("").unwrap().prefix, vec![0, 2, 1]);
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let data = foo_data();
        let search = SearchData::parse(&data).unwrap();
        let results = search.query("FOO").unwrap();
        let names: Vec<_> = results.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["foo", "foobar"]);
        assert_eq!(results[0].url, "foo.html");
        assert_eq!(results[0].label, "func");
        assert_eq!(results[0].css_class, CssClass::Info);
    }

    #[test]
    fn test_alias_resolves_through_target() {
        let mut index = TrieIndex::new(IndexConfig::default());
        let class = index.add(Entry::new("Range", "classRange.html", EntryKind::Class)).unwrap();
        index.add_alias("Rect", class).unwrap();
        let data = BinaryEncoder::encode(&index.finalize().unwrap());
        let search = SearchData::parse(&data).unwrap();

        let results = search.query("rect").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Rect");
        assert_eq!(results[0].url, "classRange.html");
        assert_eq!(results[0].kind, EntryKind::Class);
        assert_eq!(results[0].alias_of, Some(class));
    }

    #[test]
    fn test_flags_and_symbol_prefix() {
        let config = IndexConfig {
            symbol_prefix: "Corrade::".to_string(),
            case_insensitive: false,
            ..IndexConfig::default()
        };
        let data = encode(
            vec![Entry::new("Old", "old.html", EntryKind::Struct).deprecated().with_suffix_length(2)],
            config,
        );
        let search = SearchData::parse(&data).unwrap();
        assert_eq!(search.symbol_prefix(), "Corrade::");
        assert!(!search.case_insensitive());
        assert!(search.lookup("old").unwrap().is_empty());

        let result = search.result(0).unwrap();
        assert!(result.deprecated);
        assert!(!result.deleted);
        assert_eq!(result.suffix_length, 2);
    }

    #[test]
    fn test_empty_index() {
        let data = encode(Vec::new(), IndexConfig::default());
        let search = SearchData::parse(&data).unwrap();
        assert_eq!(search.result_count(), 0);
        assert!(search.is_empty());
        assert!(search.lookup("").unwrap().is_empty());
        assert!(search.query("a").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_bad_header() {
        assert!(matches!(SearchData::parse(b"XYZ\x02"), Err(SearchError::InvalidMagic)));
        assert!(matches!(SearchData::parse(b"MC"), Err(SearchError::InvalidMagic)));

        let mut data = foo_data();
        data[3] = 1;
        assert!(matches!(
            SearchData::parse(&data),
            Err(SearchError::FormatVersionMismatch { found: 1, supported: 2 })
        ));

        let mut data = foo_data();
        data[6] = 9;
        assert!(matches!(SearchData::parse(&data), Err(SearchError::Corrupt(_))));
    }

    #[test]
    fn test_truncated_data_is_corrupt() {
        let data = foo_data();
        for len in 4..data.len() {
            if let Ok(search) = SearchData::parse(&data[..len]) {
                // Parsing a header may succeed, reaching into the cut must not panic
                let _ = search.query("foo");
                let _ = search.query("");
            }
        }
    }

    #[test]
    fn test_result_out_of_range() {
        let data = foo_data();
        let search = SearchData::parse(&data).unwrap();
        assert!(matches!(search.result(3), Err(SearchError::Corrupt(_))));
    }

    #[test]
    fn test_record_offset_before_records_is_corrupt() {
        let mut data = foo_data();
        let search = SearchData::parse(&data).unwrap();
        let slot = search.results_offset;
        let width = search.widths().offset.bytes();
        let type_map_offset = u32::from_le_bytes([data[12], data[13], data[14], data[15]]);

        // Point the first record back at the type map
        data[slot..slot + width].copy_from_slice(&type_map_offset.to_le_bytes()[..width]);
        let search = SearchData::parse(&data).unwrap();
        assert!(matches!(search.result(0), Err(SearchError::Corrupt(_))));
        assert!(search.result(1).is_ok());
    }
}
