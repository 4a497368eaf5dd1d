use crate::error::Result;
use crate::index::layout::FrozenIndex;
use crate::index::results::ResultTable;
use crate::index::trie::Trie;
use crate::index::types::*;
use crate::utils::{normalize_text, scope_suffixes, validate_text};
use rayon::prelude::*;
use tracing::debug;

/// One text to insert for a result
#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
    text: String,
    id: ResultId,
    exact: bool,
}

/// Search index under construction: result table plus the prefix trie
pub struct TrieIndex {
    config: IndexConfig,
    table: ResultTable,
    trie: Trie,
}

impl TrieIndex {
    pub fn new(config: IndexConfig) -> Self {
        let trie = Trie::new(config.max_prefix_results);
        Self {
            config,
            table: ResultTable::new(),
            trie,
        }
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

    /// Add an entry and index its name, scope suffixes and keywords.
    ///
    /// An entry that normalizes to the same name and URL as an earlier one is
    /// kept in the result table as an alias of it and the earlier ID is
    /// returned.
    pub fn add(&mut self, entry: Entry) -> Result<ResultId> {
        let (id, terms) = self.register(entry)?;
        for term in terms {
            self.trie
                .insert(term.text.as_bytes(), term.id, term.exact, &self.table);
        }
        Ok(id)
    }

    /// Add an alias entry named `name` redirecting to `target`
    pub fn add_alias(&mut self, name: impl Into<String>, target: ResultId) -> Result<ResultId> {
        self.add(Entry::alias(name, target))
    }

    /// Append an entry to the result table without indexing any text for it
    pub fn push_entry(&mut self, entry: Entry) -> Result<ResultId> {
        validate_text(&entry.name)?;
        validate_text(&entry.url)?;
        Ok(self.table.push(entry))
    }

    /// Insert `text` for an existing result.
    ///
    /// The text is normalized first. With `exact` the result is recorded as
    /// an exact match of the text, otherwise it is only offered as a
    /// completion of the text's prefixes.
    pub fn insert(&mut self, text: &str, result_id: ResultId, exact: bool) -> Result<()> {
        assert!(
            (result_id as usize) < self.table.len(),
            "result {result_id} is not in the result table"
        );
        validate_text(text)?;
        let normalized = normalize_text(text, self.config.case_insensitive);
        let id = self.table.canonical_id(result_id);
        self.trie.insert(normalized.as_bytes(), id, exact, &self.table);
        Ok(())
    }

    /// Keep `existing_id` and turn `new_id` into an alias of it.
    ///
    /// Every place the trie references `new_id` now references `existing_id`,
    /// so a query never returns both.
    pub fn merge_duplicate(&mut self, existing_id: ResultId, new_id: ResultId) {
        self.table.merge_into(existing_id, new_id);
        self.trie.replace_result(new_id, existing_id, &self.table);
        debug!(existing_id, new_id, "merged duplicate result");
    }

    /// Merge a sub-trie built over this index's result table
    pub fn merge(&mut self, other: &Trie) {
        self.trie.merge(other, &self.table);
    }

    /// Query the trie in memory
    pub fn lookup(&self, text: &str) -> QueryMatch {
        let normalized = normalize_text(text, self.config.case_insensitive);
        self.trie.lookup(normalized.as_bytes())
    }

    /// Freeze the index and compute its binary layout
    pub fn finalize(mut self) -> Result<FrozenIndex> {
        self.trie.sort_results(&self.table);
        FrozenIndex::new(self.config, self.table, self.trie)
    }

    /// Build an index from a list of entries, inserting independent chunks
    /// into separate tries in parallel and merging them in chunk order.
    ///
    /// The result is identical to calling [`TrieIndex::add`] for every entry.
    pub fn build_parallel(config: IndexConfig, entries: Vec<Entry>) -> Result<Self> {
        let mut index = Self::new(config);

        let mut terms = Vec::new();
        for entry in entries {
            let (_, entry_terms) = index.register(entry)?;
            terms.extend(entry_terms);
        }

        let chunk_size = index.config.parallel_chunk_size.max(1);
        let max_prefix_results = index.config.max_prefix_results;
        let table = &index.table;
        let tries: Vec<Trie> = terms
            .par_chunks(chunk_size)
            .map(|chunk| {
                let mut trie = Trie::new(max_prefix_results);
                for term in chunk {
                    trie.insert(term.text.as_bytes(), term.id, term.exact, table);
                }
                trie
            })
            .collect();

        debug!(
            entries = index.table.len(),
            terms = terms.len(),
            chunks = tries.len(),
            "built sub-tries"
        );

        for trie in &tries {
            index.trie.merge(trie, &index.table);
        }
        Ok(index)
    }

    /// Validate an entry, append it to the result table and collect the
    /// texts to index for it. Nothing is mutated when validation fails.
    fn register(&mut self, entry: Entry) -> Result<(ResultId, Vec<Term>)> {
        validate_text(&entry.name)?;
        validate_text(&entry.url)?;
        for keyword in &entry.keywords {
            validate_text(keyword)?;
        }

        let normalized = normalize_text(&entry.name, self.config.case_insensitive);
        let keywords: Vec<String> = entry
            .keywords
            .iter()
            .map(|k| normalize_text(k, self.config.case_insensitive))
            .collect();

        if !entry.is_alias() {
            if let Some(existing) = self.table.find_normalized(&normalized, &entry.url) {
                let new_id = self.table.push(entry);
                self.merge_duplicate(existing, new_id);
                let terms = keywords
                    .into_iter()
                    .map(|text| Term {
                        text,
                        id: existing,
                        exact: false,
                    })
                    .collect();
                return Ok((existing, terms));
            }
        }

        let is_alias = entry.is_alias();
        let id = self.table.push(entry);
        if !is_alias {
            self.table.register_normalized(normalized.clone(), id);
        }

        let mut terms = vec![Term {
            text: normalized.clone(),
            id,
            exact: true,
        }];
        if self.config.index_scope_suffixes {
            for suffix in scope_suffixes(&normalized, &self.config.scope_separator) {
                terms.push(Term {
                    text: suffix.to_string(),
                    id,
                    exact: true,
                });
            }
        }
        terms.extend(keywords.into_iter().map(|text| Term {
            text,
            id,
            exact: false,
        }));

        Ok((id, terms))
    }
}
