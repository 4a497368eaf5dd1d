use crate::error::Result;
use crate::index::layout::{FLAG_CASE_INSENSITIVE, FrozenIndex};
use crate::index::trie::TrieNode;
use crate::index::types::*;
use crate::index::widths::{FormatWidths, WidthClass};
use crate::utils::{base85, write_u32_le, write_uint};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// First line of every generated script
pub const SCRIPT_HEADER: &str = "/* Generated by searchdex. Do not edit. */";

/// Serializes a [`FrozenIndex`] into the version 2 binary format
pub struct BinaryEncoder<'a> {
    index: &'a FrozenIndex,
    widths: FormatWidths,
    buf: Vec<u8>,
}

impl<'a> BinaryEncoder<'a> {
    pub fn new(index: &'a FrozenIndex) -> Self {
        Self {
            index,
            widths: index.widths(),
            buf: Vec::with_capacity(index.layout().total_size as usize),
        }
    }

    /// Encode the whole index. Output only depends on the index content.
    pub fn encode(index: &FrozenIndex) -> Vec<u8> {
        let mut encoder = BinaryEncoder::new(index);
        encoder.write_header();
        encoder.write_type_map();
        encoder.write_results();
        encoder.write_trie();
        debug_assert_eq!(encoder.buf.len() as u64, index.layout().total_size);
        encoder.buf
    }

    fn write_header(&mut self) {
        let index = self.index;
        let layout = index.layout();
        let config = index.config();

        self.buf.extend_from_slice(&MAGIC);
        self.buf.push(FORMAT_VERSION);
        self.buf.push(self.widths.name.selector());
        self.buf.push(self.widths.result_id.selector());
        self.buf.push(self.widths.offset.selector());
        self.buf.push(if config.case_insensitive {
            FLAG_CASE_INSENSITIVE
        } else {
            0
        });
        write_u32_le(&mut self.buf, index.results().len() as u32);
        write_u32_le(&mut self.buf, layout.type_map_offset);
        write_u32_le(&mut self.buf, layout.results_offset);
        write_u32_le(&mut self.buf, layout.trie_offset);
        self.write_name(config.symbol_prefix.as_bytes());
    }

    fn write_type_map(&mut self) {
        debug_assert_eq!(self.buf.len(), self.index.layout().type_map_offset as usize);
        let type_map = self.index.type_map();
        self.buf.push(type_map.len() as u8);
        for row in type_map {
            self.buf.push(row.kind.tag());
            self.buf.push(row.css_class as u8);
            self.write_name(row.label.as_bytes());
        }
    }

    fn write_results(&mut self) {
        let index = self.index;
        let layout = index.layout();
        debug_assert_eq!(self.buf.len(), layout.results_offset as usize);

        for &offset in &layout.result_offsets {
            self.write_offset(offset);
        }

        let sentinel = self.widths.result_id.sentinel();
        for (id, entry) in index.results().entries().iter().enumerate() {
            debug_assert_eq!(self.buf.len(), layout.result_offsets[id] as usize);
            self.buf.push(entry.flags.0);
            self.buf.push(entry.kind.tag());
            self.write_id(entry.alias.unwrap_or(sentinel));
            self.buf.push(entry.suffix_length);
            self.write_name(entry.name.as_bytes());
            self.write_name(entry.url.as_bytes());
        }
    }

    fn write_trie(&mut self) {
        let index = self.index;
        let layout = index.layout();
        for &node_id in index.node_order() {
            debug_assert_eq!(self.buf.len(), layout.node_offsets[node_id as usize] as usize);
            self.write_node(index.trie().node(node_id));
        }
    }

    fn write_node(&mut self, node: &TrieNode) {
        let layout = self.index.layout();
        self.write_name(&node.label);
        self.buf.push(node.children.len() as u8);
        for (&first, &child) in &node.children {
            self.buf.push(first);
            self.write_offset(layout.node_offsets[child as usize]);
        }
        self.write_ids(&node.exact);
        self.write_ids(&node.prefix);
    }

    fn write_ids(&mut self, ids: &[ResultId]) {
        self.write_id(ids.len() as u32);
        for &id in ids {
            self.write_id(id);
        }
    }

    fn write_name(&mut self, bytes: &[u8]) {
        write_uint(&mut self.buf, bytes.len() as u64, self.widths.name.bytes());
        self.buf.extend_from_slice(bytes);
    }

    fn write_id(&mut self, id: u32) {
        write_uint(&mut self.buf, id as u64, self.widths.result_id.bytes());
    }

    fn write_offset(&mut self, offset: u32) {
        write_uint(&mut self.buf, offset as u64, self.widths.offset.bytes());
    }
}

/// Wrap encoded data into a script that hands it to the search page
pub fn encode_script(data: &[u8]) -> String {
    format!("{SCRIPT_HEADER}\nSearch.load('{}');\n", base85::encode(data))
}

/// Extract the encoded data from a script produced by [`encode_script`],
/// including the zero padding of the last base85 group
pub fn decode_script(script: &str) -> Option<Vec<u8>> {
    let start = script.find("Search.load('")? + "Search.load('".len();
    let end = start + script[start..].find('\'')?;
    base85::decode(&script[start..end])
}

/// Write the binary file and its script variant into `dir`
pub fn write_search_data(dir: &Path, index: &FrozenIndex) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)?;
    let data = BinaryEncoder::encode(index);

    let binary_path = dir.join(index.config().binary_filename());
    fs::write(&binary_path, &data)?;

    let script_path = dir.join(index.config().script_filename());
    fs::write(&script_path, encode_script(&data))?;

    info!(
        binary = %binary_path.display(),
        script = %script_path.display(),
        bytes = data.len(),
        "wrote search data"
    );
    Ok((binary_path, script_path))
}
