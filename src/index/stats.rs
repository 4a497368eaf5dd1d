use crate::index::reader::SearchData;
use crate::index::types::FORMAT_VERSION;
use anyhow::Result;
use std::fmt::Write as _;

/// Shape of an encoded trie
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrieStats {
    pub node_count: usize,
    pub max_depth: usize,
    pub max_children: usize,
    pub max_exact: usize,
    pub max_prefix: usize,
    pub max_label: usize,
}

pub fn trie_stats(search: &SearchData<'_>) -> Result<TrieStats> {
    let mut stats = TrieStats::default();
    search.walk(|depth, node| {
        stats.node_count += 1;
        stats.max_depth = stats.max_depth.max(depth);
        stats.max_children = stats.max_children.max(node.children.len());
        stats.max_exact = stats.max_exact.max(node.exact.len());
        stats.max_prefix = stats.max_prefix.max(node.prefix.len());
        stats.max_label = stats.max_label.max(node.label.len());
    })?;
    Ok(stats)
}

/// Summary shown by the `stats` command
pub fn format_stats(search: &SearchData<'_>) -> Result<String> {
    let stats = trie_stats(search)?;
    let mut out = String::new();

    writeln!(out, "Search Data Statistics")?;
    writeln!(out, "======================")?;
    writeln!(out)?;
    writeln!(out, "Format version:     {} (supported: {})", search.version(), FORMAT_VERSION)?;
    writeln!(out, "Size:               {}", format_size(search.len() as u64))?;
    writeln!(out, "Widths:             {}", search.widths())?;
    writeln!(out, "Case-insensitive:   {}", search.case_insensitive())?;
    writeln!(out, "Symbol prefix:      {:?}", search.symbol_prefix())?;
    writeln!(out, "Results:            {}", search.result_count())?;
    writeln!(out)?;
    writeln!(out, "Trie nodes:         {}", stats.node_count)?;
    writeln!(out, "Max depth:          {}", stats.max_depth)?;
    writeln!(out, "Max children:       {}", stats.max_children)?;
    writeln!(out, "Max exact results:  {}", stats.max_exact)?;
    writeln!(out, "Max prefix results: {}", stats.max_prefix)?;
    writeln!(out, "Max label length:   {}", stats.max_label)?;

    if !search.type_map().is_empty() {
        writeln!(out)?;
        writeln!(out, "Kinds:")?;
        for row in search.type_map() {
            writeln!(out, "  {:10} {}", row.label, row.css_class.as_str())?;
        }
    }
    Ok(out)
}

/// Human-readable rendering of the trie and the result table.
///
/// Each trie line is the edge label indented by depth, then the exact
/// results and after `|` the prefix results. Each result line is
/// `id: name [label, flags] -> url`.
pub fn format_dump(search: &SearchData<'_>) -> Result<String> {
    let mut out = String::new();
    let mut failed = None;

    search.walk(|depth, node| {
        let label = String::from_utf8_lossy(node.label);
        let line = writeln!(
            out,
            "{:indent$}{:?} {:?} | {:?}",
            "",
            label,
            node.exact,
            node.prefix,
            indent = depth * 2
        );
        if let Err(err) = line {
            failed.get_or_insert(err);
        }
    })?;
    if let Some(err) = failed {
        return Err(err.into());
    }

    for id in 0..search.result_count() {
        let result = search.result(id)?;
        let mut extra = vec![result.label.to_string()];
        if result.deprecated {
            extra.push("deprecated".to_string());
        }
        if result.deleted {
            extra.push("deleted".to_string());
        }
        if result.suffix_length > 0 {
            extra.push(format!("suffix_length={}", result.suffix_length));
        }
        if let Some(target) = result.alias_of {
            extra.push(format!("alias of {target}"));
        }
        writeln!(out, "{id}: {} [{}] -> {}", result.name, extra.join(", "), result.url)?;
    }
    Ok(out)
}

/// Format byte size to human readable
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} kB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
