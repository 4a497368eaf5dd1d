use crate::index::types::*;
use ahash::AHashMap;

/// Ranking key of a result: lower sorts first.
///
/// Usable entries come before deleted and deprecated ones, then pages and
/// scopes before functions and values, then shorter suffixes and names. The
/// ID makes the order total.
pub type RankKey = (u8, u8, u8, usize, ResultId);

/// Dense table of entries addressed by [`ResultId`]
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    entries: Vec<Entry>,
    /// (normalized name, url) -> canonical entry
    canonical: AHashMap<(String, String), ResultId>,
    /// Merged duplicate -> entry it was merged into
    redirects: AHashMap<ResultId, ResultId>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, id: ResultId) -> Option<&Entry> {
        self.entries.get(id as usize)
    }

    /// Append an entry and return its ID
    pub fn push(&mut self, entry: Entry) -> ResultId {
        assert_eq!(
            entry.kind == EntryKind::Alias,
            entry.alias.is_some(),
            "alias entries and only alias entries carry an alias target"
        );
        if let Some(target) = entry.alias {
            assert!(
                (target as usize) < self.entries.len(),
                "alias target {target} is not in the result table"
            );
        }
        let id = self.entries.len() as ResultId;
        self.entries.push(entry);
        id
    }

    /// Canonical entry with the same normalized name and URL, if any
    pub fn find_normalized(&self, normalized_name: &str, url: &str) -> Option<ResultId> {
        self.canonical
            .get(&(normalized_name.to_string(), url.to_string()))
            .copied()
    }

    /// Remember `id` as the canonical entry for its normalized name and URL
    pub fn register_normalized(&mut self, normalized_name: String, id: ResultId) {
        let url = self.entries[id as usize].url.clone();
        self.canonical.entry((normalized_name, url)).or_insert(id);
    }

    /// Turn `new_id` into an alias of `existing_id`
    pub fn merge_into(&mut self, existing_id: ResultId, new_id: ResultId) {
        let len = self.entries.len() as ResultId;
        assert!(existing_id < len, "unknown result {existing_id}");
        assert!(new_id < len, "unknown result {new_id}");
        assert_ne!(existing_id, new_id, "cannot merge a result into itself");
        assert!(
            self.entries[existing_id as usize].kind != EntryKind::Alias,
            "cannot merge into alias {existing_id}"
        );

        let entry = &mut self.entries[new_id as usize];
        entry.alias = Some(existing_id);
        entry.kind = EntryKind::Alias;
        entry.url.clear();
        self.redirects.insert(new_id, existing_id);

        // Anything previously merged into `new_id` now points at `existing_id`
        for target in self.redirects.values_mut() {
            if *target == new_id {
                *target = existing_id;
            }
        }
        for target in self.canonical.values_mut() {
            if *target == new_id {
                *target = existing_id;
            }
        }
        for entry in &mut self.entries {
            if entry.alias == Some(new_id) && entry.kind == EntryKind::Alias {
                entry.alias = Some(existing_id);
            }
        }
    }

    /// Resolve a merged duplicate to the entry it was merged into
    pub fn canonical_id(&self, id: ResultId) -> ResultId {
        self.redirects.get(&id).copied().unwrap_or(id)
    }

    pub fn is_merged(&self, id: ResultId) -> bool {
        self.redirects.contains_key(&id)
    }

    /// Entry an alias chain ends at, or `id` itself for a plain entry
    pub fn resolve(&self, id: ResultId) -> ResultId {
        let mut current = id;
        // Bounded so a cyclic chain from a bad merge cannot hang
        for _ in 0..=self.entries.len() {
            let entry = &self.entries[current as usize];
            match entry.alias {
                Some(target) if entry.kind == EntryKind::Alias => current = target,
                _ => return current,
            }
        }
        current
    }

    /// Kind after following alias references
    pub fn resolved_kind(&self, id: ResultId) -> EntryKind {
        self.entries[self.resolve(id) as usize].kind
    }

    pub fn rank_key(&self, id: ResultId) -> RankKey {
        let entry = &self.entries[id as usize];
        (
            entry.flags.status(),
            self.resolved_kind(id).tag(),
            entry.suffix_length,
            entry.name.len(),
            id,
        )
    }

    /// Two results that would render identically: same name, and the same
    /// URL once aliases are followed
    pub fn same_target(&self, a: ResultId, b: ResultId) -> bool {
        if self.entries[a as usize].name != self.entries[b as usize].name {
            return false;
        }
        let (a, b) = (self.resolve(a), self.resolve(b));
        a == b || self.entries[a as usize].url == self.entries[b as usize].url
    }

    /// Type map rows for every kind a result resolves to, ordered by tag
    pub fn type_map(&self) -> Vec<TypeMapEntry> {
        let mut kinds: Vec<EntryKind> = (0..self.entries.len() as ResultId)
            .map(|id| self.resolved_kind(id))
            .filter(|kind| *kind != EntryKind::Alias)
            .collect();
        kinds.sort_unstable();
        kinds.dedup();
        kinds.into_iter().map(TypeMapEntry::for_kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_dense_ids() {
        let mut table = ResultTable::new();
        assert_eq!(table.push(Entry::new("Math", "namespaceMath.html", EntryKind::Namespace)), 0);
        assert_eq!(table.push(Entry::new("Math::min()", "namespaceMath.html#a1", EntryKind::Function)), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    #[should_panic(expected = "alias target")]
    fn test_alias_to_missing_entry_panics() {
        let mut table = ResultTable::new();
        table.push(Entry::alias("Rect", 5));
    }

    #[test]
    fn test_rank_key_order() {
        let mut table = ResultTable::new();
        let func = table.push(Entry::new("min", "a.html#min", EntryKind::Function));
        let page = table.push(Entry::new("minimal", "minimal.html", EntryKind::Page));
        let deprecated = table.push(Entry::new("min", "b.html", EntryKind::Page).deprecated());
        let suffixed = table.push(
            Entry::new("min(int)", "a.html#min2", EntryKind::Function).with_suffix_length(5),
        );

        let mut ids = vec![func, page, deprecated, suffixed];
        ids.sort_by_key(|&id| table.rank_key(id));
        assert_eq!(ids, vec![page, func, suffixed, deprecated]);
    }

    #[test]
    fn test_alias_resolves_kind() {
        let mut table = ResultTable::new();
        let class = table.push(Entry::new("Range", "classRange.html", EntryKind::Class));
        let alias = table.push(Entry::alias("Rect", class));
        let alias2 = table.push(Entry::alias("Rectangle", alias));
        assert_eq!(table.resolved_kind(alias), EntryKind::Class);
        assert_eq!(table.resolved_kind(alias2), EntryKind::Class);

        let map = table.type_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map[0].kind, EntryKind::Class);
    }

    #[test]
    fn test_same_target_follows_aliases() {
        let mut table = ResultTable::new();
        let range = table.push(Entry::new("Range", "classRange.html", EntryKind::Class));
        let rectangle = table.push(Entry::new("Rectangle", "structRectangle.html", EntryKind::Struct));
        let to_range = table.push(Entry::alias("Rect", range));
        let to_rectangle = table.push(Entry::alias("Rect", rectangle));
        let to_range_again = table.push(Entry::alias("Rect", range));
        let page = table.push(Entry::new("Rect", "classRange.html", EntryKind::Page));

        assert_eq!(table.resolve(to_rectangle), rectangle);
        assert!(!table.same_target(to_range, to_rectangle));
        assert!(table.same_target(to_range, to_range_again));
        assert!(table.same_target(to_range, page));
        assert!(!table.same_target(range, to_range));
    }

    #[test]
    fn test_merge_into() {
        let mut table = ResultTable::new();
        let a = table.push(Entry::new("Foo", "foo.html", EntryKind::Class));
        let b = table.push(Entry::new("foo", "foo.html", EntryKind::Class));
        table.register_normalized("foo".to_string(), a);

        table.merge_into(a, b);
        assert_eq!(table.canonical_id(b), a);
        assert!(table.is_merged(b));
        assert_eq!(table.get(b).unwrap().alias, Some(a));
        assert_eq!(table.get(b).unwrap().url, "");
        assert_eq!(table.find_normalized("foo", "foo.html"), Some(a));
    }

    #[test]
    #[should_panic(expected = "cannot merge into alias")]
    fn test_merge_into_alias_panics() {
        let mut table = ResultTable::new();
        let a = table.push(Entry::new("Foo", "foo.html", EntryKind::Class));
        let b = table.push(Entry::alias("Bar", a));
        let c = table.push(Entry::new("Baz", "baz.html", EntryKind::Class));
        table.merge_into(b, c);
    }

    #[test]
    #[should_panic(expected = "into itself")]
    fn test_merge_into_self_panics() {
        let mut table = ResultTable::new();
        let a = table.push(Entry::new("Foo", "foo.html", EntryKind::Class));
        table.merge_into(a, a);
    }
}
