//! Edge-compressed prefix trie stored in an arena.
//!
//! Nodes are addressed by [`NodeId`] and never removed, so splitting an edge
//! only appends the new middle node and relinks its parent. Every node keeps
//! two ranked result sets:
//!
//! - `exact`: results whose indexed text ends at this node
//! - `prefix`: results whose indexed text passes through or ends at this
//!   node, bounded to the best `max_prefix_results` by [`ResultTable::rank_key`]
//!
//! The bounded set is the top-K of everything ever propagated into the node,
//! so it does not depend on insertion order and two tries built from disjoint
//! inputs can be merged into exactly the trie a sequential build produces.

use crate::index::results::ResultTable;
use crate::index::types::*;
use std::collections::BTreeMap;

/// Root node of every trie
pub const ROOT: NodeId = 0;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrieNode {
    /// Edge label leading into this node, empty for the root
    pub label: Vec<u8>,
    /// First byte of the child label -> child
    pub children: BTreeMap<u8, NodeId>,
    pub exact: Vec<ResultId>,
    pub prefix: Vec<ResultId>,
}

#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    max_prefix_results: usize,
}

impl Trie {
    pub fn new(max_prefix_results: usize) -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            max_prefix_results,
        }
    }

    pub fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id as usize]
    }

    pub fn nodes(&self) -> &[TrieNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        let root = self.node(ROOT);
        root.children.is_empty() && root.exact.is_empty() && root.prefix.is_empty()
    }

    pub fn max_prefix_results(&self) -> usize {
        self.max_prefix_results
    }

    /// Insert already normalized `text` for result `id`.
    ///
    /// `exact` records the result at the terminal node; in any case it is
    /// propagated into the prefix set of the terminal node and its ancestors.
    pub fn insert(&mut self, text: &[u8], id: ResultId, exact: bool, table: &ResultTable) {
        let mut node = ROOT;
        let mut rest = text;
        self.add_prefix(node, id, table);

        while !rest.is_empty() {
            let existing = self.nodes[node as usize].children.get(&rest[0]).copied();
            let child = match existing {
                Some(child) => child,
                None => {
                    let leaf = self.push_node(rest.to_vec());
                    self.link(node, leaf);
                    node = leaf;
                    self.add_prefix(node, id, table);
                    break;
                }
            };

            let common = common_prefix_len(&self.nodes[child as usize].label, rest);
            let next = if common < self.nodes[child as usize].label.len() {
                self.split(node, child, common)
            } else {
                child
            };

            node = next;
            rest = &rest[common..];
            self.add_prefix(node, id, table);
        }

        if exact {
            insert_ranked(&mut self.nodes[node as usize].exact, id, table, None);
        }
    }

    /// Query with the same semantics as the binary decoder.
    ///
    /// A query that ends inside an edge label matches the child below it: no
    /// exact results, the child's completions.
    pub fn lookup(&self, text: &[u8]) -> QueryMatch {
        let mut node = ROOT;
        let mut rest = text;

        loop {
            let current = self.node(node);
            if rest.is_empty() {
                return QueryMatch {
                    exact: current.exact.clone(),
                    prefix: current.prefix.clone(),
                };
            }

            let Some(&child) = current.children.get(&rest[0]) else {
                return QueryMatch::default();
            };
            let label = &self.node(child).label;

            if rest.starts_with(label) {
                node = child;
                rest = &rest[label.len()..];
            } else if label.starts_with(rest) {
                return QueryMatch {
                    exact: Vec::new(),
                    prefix: self.node(child).prefix.clone(),
                };
            } else {
                return QueryMatch::default();
            }
        }
    }

    /// Replace every occurrence of `old` by `new` in all result sets
    pub fn replace_result(&mut self, old: ResultId, new: ResultId, table: &ResultTable) {
        let bound = Some(self.max_prefix_results);
        for node in &mut self.nodes {
            if let Some(pos) = node.exact.iter().position(|&id| id == old) {
                node.exact.remove(pos);
                insert_ranked(&mut node.exact, new, table, None);
            }
            if let Some(pos) = node.prefix.iter().position(|&id| id == old) {
                node.prefix.remove(pos);
                insert_ranked(&mut node.prefix, new, table, bound);
            }
        }
    }

    /// Merge a trie built over the same result table into this one
    pub fn merge(&mut self, other: &Trie, table: &ResultTable) {
        let mut stack = vec![(ROOT, ROOT)];

        while let Some((node, other_node)) = stack.pop() {
            let source = other.node(other_node);
            for &id in &source.exact {
                insert_ranked(&mut self.nodes[node as usize].exact, id, table, None);
            }
            for &id in &source.prefix {
                self.add_prefix(node, id, table);
            }

            for &other_child in source.children.values() {
                let child = other.node(other_child);
                let target = self.descend_for_merge(node, &child.label, &child.prefix, table);
                stack.push((target, other_child));
            }
        }
    }

    /// Re-sort every result set, used after entries changed kind
    pub fn sort_results(&mut self, table: &ResultTable) {
        for node in &mut self.nodes {
            node.exact.sort_by_key(|&id| table.rank_key(id));
            node.prefix.sort_by_key(|&id| table.rank_key(id));
        }
    }

    /// Depth-first pre-order, children by ascending first byte
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ROOT];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.node(node).children.values().rev());
        }
        order
    }

    /// Walk `label` below `start`, creating or splitting nodes as needed.
    /// Nodes strictly inside the walked label receive `ids` as completions;
    /// the returned end node is left for the caller.
    fn descend_for_merge(
        &mut self,
        start: NodeId,
        label: &[u8],
        ids: &[ResultId],
        table: &ResultTable,
    ) -> NodeId {
        let mut node = start;
        let mut rest = label;

        while !rest.is_empty() {
            let existing = self.nodes[node as usize].children.get(&rest[0]).copied();
            let Some(child) = existing else {
                let leaf = self.push_node(rest.to_vec());
                self.link(node, leaf);
                return leaf;
            };

            let common = common_prefix_len(&self.nodes[child as usize].label, rest);
            node = if common < self.nodes[child as usize].label.len() {
                self.split(node, child, common)
            } else {
                child
            };
            rest = &rest[common..];

            if !rest.is_empty() {
                for &id in ids {
                    self.add_prefix(node, id, table);
                }
            }
        }

        node
    }

    fn push_node(&mut self, label: Vec<u8>) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(TrieNode {
            label,
            ..TrieNode::default()
        });
        id
    }

    /// Attach `child` under a byte that `parent` does not use yet
    fn link(&mut self, parent: NodeId, child: NodeId) {
        let first = self.nodes[child as usize].label[0];
        let previous = self.nodes[parent as usize].children.insert(first, child);
        debug_assert!(previous.is_none());
    }

    /// Split the edge into `child` after `at` bytes, returning the new middle node
    fn split(&mut self, parent: NodeId, child: NodeId, at: usize) -> NodeId {
        debug_assert!(at > 0 && at < self.nodes[child as usize].label.len());

        let tail = self.nodes[child as usize].label.split_off(at);
        let head = std::mem::replace(&mut self.nodes[child as usize].label, tail);
        // Everything below the middle node passes through it
        let prefix = self.nodes[child as usize].prefix.clone();

        let first = head[0];
        let middle = self.push_node(head);
        self.nodes[middle as usize].prefix = prefix;
        // The middle node takes over the parent's slot for this byte
        let replaced = self.nodes[parent as usize].children.insert(first, middle);
        debug_assert_eq!(replaced, Some(child));
        self.link(middle, child);
        middle
    }

    fn add_prefix(&mut self, node: NodeId, id: ResultId, table: &ResultTable) {
        let bound = Some(self.max_prefix_results);
        insert_ranked(&mut self.nodes[node as usize].prefix, id, table, bound);
    }
}

/// Insert `id` into a set ordered by rank, keeping at most `bound` entries.
///
/// Of two results with the same name and URL only the lower ID is kept.
fn insert_ranked(set: &mut Vec<ResultId>, id: ResultId, table: &ResultTable, bound: Option<usize>) {
    if set.contains(&id) {
        return;
    }
    if let Some(pos) = set.iter().position(|&other| table.same_target(other, id)) {
        if set[pos] < id {
            return;
        }
        set.remove(pos);
    }

    let key = table.rank_key(id);
    let at = set.partition_point(|&other| table.rank_key(other) < key);
    if let Some(bound) = bound {
        if at >= bound {
            return;
        }
    }
    set.insert(at, id);
    if let Some(bound) = bound {
        set.truncate(bound);
    }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
