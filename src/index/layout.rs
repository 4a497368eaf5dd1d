//! Frozen index and its byte layout.
//!
//! Node sizes depend only on the node itself and the chosen widths. Subtree
//! sizes are summed bottom-up (children before parents), then absolute node
//! offsets are assigned top-down (root before children), which yields a
//! depth-first pre-order layout whose child offsets are known before any
//! byte is written.

use crate::error::{CapacityField, Result, SearchError};
use crate::index::results::ResultTable;
use crate::index::trie::{ROOT, Trie, TrieNode};
use crate::index::types::*;
use crate::index::widths::{FormatWidths, NameWidth, OffsetWidth, ResultIdWidth, WidthClass};
use tracing::debug;

/// Size of the fixed part of the header
pub const HEADER_SIZE: usize = 24;

/// Header flag: text was lowercased before indexing
pub const FLAG_CASE_INSENSITIVE: u8 = 1 << 0;

/// Byte offsets of every section, node and result record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub type_map_offset: u32,
    pub results_offset: u32,
    pub trie_offset: u32,
    /// Start of each result record plus the end of the last one
    pub result_offsets: Vec<u32>,
    /// Absolute offset per arena node
    pub node_offsets: Vec<u32>,
    pub total_size: u64,
}

/// Maxima scanned from the whole index, used to pick widths
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorpusStats {
    pub max_name_length: usize,
    pub max_child_count: usize,
    pub result_count: usize,
    pub node_count: usize,
}

/// An index that can no longer change, with widths and layout fixed
#[derive(Debug, Clone)]
pub struct FrozenIndex {
    pub(crate) config: IndexConfig,
    pub(crate) table: ResultTable,
    pub(crate) trie: Trie,
    pub(crate) type_map: Vec<TypeMapEntry>,
    /// Canonical node order
    pub(crate) order: Vec<NodeId>,
    pub(crate) stats: CorpusStats,
    pub(crate) widths: FormatWidths,
    pub(crate) layout: Layout,
}

impl FrozenIndex {
    pub(crate) fn new(config: IndexConfig, table: ResultTable, trie: Trie) -> Result<Self> {
        let type_map = table.type_map();
        if type_map.len() > u8::MAX as usize {
            return Err(capacity(CapacityField::TypeCount, type_map.len(), u8::MAX as u64));
        }

        let stats = scan(&config, &table, &trie, &type_map);
        if stats.max_child_count > u8::MAX as usize {
            return Err(capacity(CapacityField::ChildCount, stats.max_child_count, u8::MAX as u64));
        }

        let name = NameWidth::select(stats.max_name_length as u64, config.min_name_width)?;
        // Counts stay strictly below the all-ones "no alias" sentinel
        let result_id = ResultIdWidth::select(stats.result_count as u64 + 1, config.min_result_id_width)
            .map_err(|_| {
                capacity(
                    CapacityField::ResultCount,
                    stats.result_count,
                    ResultIdWidth::Bits32.max_value() - 1,
                )
            })?;

        let order = trie.preorder();
        let mut offsets = OffsetWidth::CLASSES
            .iter()
            .copied()
            .filter(|class| *class >= config.min_offset_width);
        let mut total_size = 0;
        let (widths, layout) = loop {
            let Some(offset) = offsets.next() else {
                return Err(capacity(
                    CapacityField::FileSize,
                    total_size as usize,
                    OffsetWidth::Bits32.max_value(),
                ));
            };
            let widths = FormatWidths {
                name,
                result_id,
                offset,
            };
            let layout = compute_layout(&config, &table, &trie, &type_map, widths);
            // Every offset points before the end of the file
            if layout.total_size.saturating_sub(1) <= offset.max_value() {
                break (widths, layout);
            }
            total_size = layout.total_size;
        };

        debug!(
            results = stats.result_count,
            nodes = stats.node_count,
            size = layout.total_size,
            %widths,
            "finalized search index"
        );

        Ok(Self {
            config,
            table,
            trie,
            type_map,
            order,
            stats,
            widths,
            layout,
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn results(&self) -> &ResultTable {
        &self.table
    }

    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    pub fn type_map(&self) -> &[TypeMapEntry] {
        &self.type_map
    }

    pub fn node_order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn stats(&self) -> CorpusStats {
        self.stats
    }

    pub fn widths(&self) -> FormatWidths {
        self.widths
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Query the frozen trie in memory
    pub fn lookup(&self, text: &str) -> QueryMatch {
        let normalized = crate::utils::normalize_text(text, self.config.case_insensitive);
        self.trie.lookup(normalized.as_bytes())
    }
}

fn capacity(field: CapacityField, value: usize, max: u64) -> SearchError {
    SearchError::CapacityExceeded {
        field,
        value: value as u64,
        max,
    }
}

fn scan(config: &IndexConfig, table: &ResultTable, trie: &Trie, type_map: &[TypeMapEntry]) -> CorpusStats {
    let entry_max = table
        .entries()
        .iter()
        .map(|e| e.name.len().max(e.url.len()))
        .max()
        .unwrap_or(0);
    let label_max = trie.nodes().iter().map(|n| n.label.len()).max().unwrap_or(0);
    let type_max = type_map.iter().map(|t| t.label.len()).max().unwrap_or(0);

    CorpusStats {
        max_name_length: entry_max
            .max(label_max)
            .max(type_max)
            .max(config.symbol_prefix.len()),
        max_child_count: trie.nodes().iter().map(|n| n.children.len()).max().unwrap_or(0),
        result_count: table.len(),
        node_count: trie.len(),
    }
}

pub(crate) fn header_size(config: &IndexConfig, widths: FormatWidths) -> usize {
    HEADER_SIZE + widths.name.bytes() + config.symbol_prefix.len()
}

pub(crate) fn type_map_size(type_map: &[TypeMapEntry], widths: FormatWidths) -> usize {
    1 + type_map
        .iter()
        .map(|t| 2 + widths.name.bytes() + t.label.len())
        .sum::<usize>()
}

pub(crate) fn record_size(entry: &Entry, widths: FormatWidths) -> usize {
    // flags, kind, alias, suffix length, name, url
    1 + 1 + widths.result_id.bytes() + 1 + 2 * widths.name.bytes() + entry.name.len() + entry.url.len()
}

pub(crate) fn node_size(node: &TrieNode, widths: FormatWidths) -> usize {
    let id = widths.result_id.bytes();
    widths.name.bytes()
        + node.label.len()
        + 1
        + node.children.len() * (1 + widths.offset.bytes())
        + id
        + node.exact.len() * id
        + id
        + node.prefix.len() * id
}

fn compute_layout(
    config: &IndexConfig,
    table: &ResultTable,
    trie: &Trie,
    type_map: &[TypeMapEntry],
    widths: FormatWidths,
) -> Layout {
    let type_map_offset = header_size(config, widths);
    let results_offset = type_map_offset + type_map_size(type_map, widths);

    let mut result_offsets = Vec::with_capacity(table.len() + 1);
    let mut pos = results_offset + (table.len() + 1) * widths.offset.bytes();
    for entry in table.entries() {
        result_offsets.push(pos as u64);
        pos += record_size(entry, widths);
    }
    result_offsets.push(pos as u64);
    let trie_offset = pos;

    // Bottom-up: a node's subtree size needs its children's first
    let mut subtree = vec![0u64; trie.len()];
    for &node in trie.preorder().iter().rev() {
        let own = node_size(trie.node(node), widths) as u64;
        let below: u64 = trie
            .node(node)
            .children
            .values()
            .map(|&c| subtree[c as usize])
            .sum();
        subtree[node as usize] = own + below;
    }

    // Top-down: children follow the parent in first-byte order
    let mut node_offsets = vec![0u64; trie.len()];
    node_offsets[ROOT as usize] = trie_offset as u64;
    let mut stack = vec![ROOT];
    while let Some(node) = stack.pop() {
        let mut next = node_offsets[node as usize] + node_size(trie.node(node), widths) as u64;
        for &child in trie.node(node).children.values() {
            node_offsets[child as usize] = next;
            next += subtree[child as usize];
            stack.push(child);
        }
    }

    let total_size = trie_offset as u64 + subtree[ROOT as usize];
    // Offsets are narrowed only after the caller checked the total size
    let narrow = |v: u64| v.min(u32::MAX as u64) as u32;

    Layout {
        type_map_offset: narrow(type_map_offset as u64),
        results_offset: narrow(results_offset as u64),
        trie_offset: narrow(trie_offset as u64),
        result_offsets: result_offsets.into_iter().map(narrow).collect(),
        node_offsets: node_offsets.into_iter().map(narrow).collect(),
        total_size,
    }
}
