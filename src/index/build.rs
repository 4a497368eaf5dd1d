//! `searchdex build`: JSON entry list in, search data files out.

use crate::index::builder::TrieIndex;
use crate::index::types::*;
use crate::index::writer::write_search_data;
use crate::utils::progress::{entry_bar, phase_spinner};
use crate::utils::validate_text;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// One entry of the input file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntryRecord {
    pub name: String,
    pub url: String,
    pub kind: Option<EntryKind>,
    /// Position of the aliased entry in the same file
    pub alias_of: Option<usize>,
    pub deprecated: bool,
    pub deleted: bool,
    pub suffix_length: u8,
    pub keywords: Vec<String>,
}

/// Options of a single build run
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub config: IndexConfig,
    pub parallel: bool,
    /// Hide progress bars
    pub quiet: bool,
}

/// What a build produced
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub binary_path: PathBuf,
    pub script_path: PathBuf,
    pub entries: usize,
    pub skipped: usize,
    pub bytes: u64,
}

/// Read an entry list from a JSON file
pub fn read_entries(path: &Path) -> Result<Vec<EntryRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let records = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse entries from {}", path.display()))?;
    Ok(records)
}

/// Turn input records into entries with dense result IDs.
///
/// Records with unsupported characters are skipped with a warning, as are
/// aliases of skipped records. Returns the entries and the skipped count.
pub fn resolve_entries(records: Vec<EntryRecord>) -> Result<(Vec<Entry>, usize)> {
    let mut ids: Vec<Option<ResultId>> = Vec::with_capacity(records.len());
    let mut entries = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for (position, record) in records.into_iter().enumerate() {
        let entry = match to_entry(position, record, &ids)? {
            Some(entry) => entry,
            None => {
                skipped += 1;
                ids.push(None);
                continue;
            }
        };
        ids.push(Some(entries.len() as ResultId));
        entries.push(entry);
    }
    Ok((entries, skipped))
}

fn to_entry(position: usize, record: EntryRecord, ids: &[Option<ResultId>]) -> Result<Option<Entry>> {
    let checked = [&record.name, &record.url]
        .into_iter()
        .chain(record.keywords.iter())
        .try_for_each(|text| validate_text(text));
    if let Err(err) = checked {
        warn!(position, "skipping entry: {err}");
        return Ok(None);
    }

    let mut entry = match (record.alias_of, record.kind) {
        (Some(target), None | Some(EntryKind::Alias)) => {
            if target >= position {
                bail!("entry {position} aliases entry {target}, which does not precede it");
            }
            match ids[target] {
                Some(id) => Entry::alias(record.name, id),
                None => {
                    warn!(position, target, "skipping alias of a skipped entry");
                    return Ok(None);
                }
            }
        }
        (Some(_), Some(kind)) => bail!("entry {position} is an alias but has kind {kind:?}"),
        (None, Some(EntryKind::Alias)) => bail!("entry {position} has kind alias but no alias_of"),
        (None, Some(kind)) => Entry::new(record.name, record.url, kind),
        (None, None) => bail!("entry {position} has no kind"),
    };

    if record.deprecated {
        entry = entry.deprecated();
    }
    if record.deleted {
        entry = entry.deleted();
    }
    Ok(Some(entry.with_suffix_length(record.suffix_length).with_keywords(record.keywords)))
}

/// Index `entries` and write the search data files into `output_dir`
pub fn build_search_data(entries: Vec<Entry>, output_dir: &Path, options: &BuildOptions) -> Result<BuildSummary> {
    let start = Instant::now();
    let count = entries.len();

    let index = if options.parallel {
        let spinner = phase_spinner("Indexing entries in parallel...", options.quiet);
        let index = TrieIndex::build_parallel(options.config.clone(), entries)?;
        if let Some(spinner) = spinner {
            spinner.finish_with_message(format!("Indexed {count} entries"));
        }
        index
    } else {
        let bar = entry_bar(count as u64, "Indexing entries", options.quiet);
        let mut index = TrieIndex::new(options.config.clone());
        for entry in entries {
            index.add(entry)?;
            if let Some(ref bar) = bar {
                bar.inc(1);
            }
        }
        if let Some(bar) = bar {
            bar.finish_with_message(format!("Indexed {count} entries"));
        }
        index
    };

    let spinner = phase_spinner("Encoding search data...", options.quiet);
    let frozen = index.finalize()?;
    let bytes = frozen.layout().total_size;
    let (binary_path, script_path) = write_search_data(output_dir, &frozen)
        .with_context(|| format!("Failed to write search data to {}", output_dir.display()))?;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    info!(
        entries = count,
        bytes,
        widths = %frozen.widths(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "search data built"
    );

    Ok(BuildSummary {
        binary_path,
        script_path,
        entries: count,
        skipped: 0,
        bytes,
    })
}

/// Entry point of the `build` command
pub fn build_from_file(input: &Path, output_dir: &Path, options: &BuildOptions) -> Result<BuildSummary> {
    let records = read_entries(input)?;
    let (entries, skipped) = resolve_entries(records)?;
    if skipped > 0 {
        warn!(skipped, "some entries were not indexed");
    }

    let mut summary = build_search_data(entries, output_dir, options)?;
    summary.skipped = skipped;
    Ok(summary)
}
