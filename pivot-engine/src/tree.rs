//! FILENAME: pivot-engine/src/tree.rs
//! Group Tree - lazily built group-by hierarchy over the row dimensions.
//!
//! Only the root level is partitioned up front. A node's children (the
//! partition of its records by the next dimension) are built the first time
//! something asks for them, so work stays bounded by the visible subtree.
//!
//! Node identity is the `PathId`: the escaped chain of keys from the root.
//! It depends only on the dimension sequence and the records, never on which
//! nodes are expanded.

use std::fmt;

use records::LeadRecord;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::definition::{DimensionCatalog, DimensionSpec};
use crate::resolver::{FieldResolver, GroupKey};

// ============================================================================
// PATH ID
// ============================================================================

const PATH_SEPARATOR: char = '/';
const PATH_ESCAPE: char = '\\';
/// Escape code marking a `GroupKey::Undefined` segment.
const UNDEFINED_CODE: char = 'u';

/// Stable identity of a tree node, e.g. `Won/Referral`.
/// Key text is escaped so distinct key chains never share a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathId(String);

impl PathId {
    /// Path of a root-level node.
    pub fn root(key: &GroupKey) -> Self {
        let mut s = String::new();
        push_segment(&mut s, key);
        PathId(s)
    }

    /// Path of a child of this node.
    pub fn child(&self, key: &GroupKey) -> Self {
        let mut s = self.0.clone();
        s.push(PATH_SEPARATOR);
        push_segment(&mut s, key);
        PathId(s)
    }

    /// Builds the path for a full key chain. `None` for an empty chain.
    pub fn from_keys(keys: &[GroupKey]) -> Option<Self> {
        let (first, rest) = keys.split_first()?;
        Some(
            rest.iter()
                .fold(PathId::root(first), |path, key| path.child(key)),
        )
    }

    /// Wraps an already-encoded path (as handed back by the UI).
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        PathId(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decodes the key chain. `None` when the encoding is malformed.
    pub fn keys(&self) -> Option<Vec<GroupKey>> {
        let mut keys = Vec::new();
        let mut current = String::new();
        let mut undefined = false;
        let mut chars = self.0.chars();

        while let Some(c) = chars.next() {
            match c {
                PATH_ESCAPE => match chars.next()? {
                    UNDEFINED_CODE if current.is_empty() && !undefined => undefined = true,
                    esc @ (PATH_ESCAPE | PATH_SEPARATOR) if !undefined => current.push(esc),
                    _ => return None,
                },
                PATH_SEPARATOR => keys.push(finish_segment(&mut current, &mut undefined)),
                other if !undefined => current.push(other),
                _ => return None,
            }
        }
        keys.push(finish_segment(&mut current, &mut undefined));
        Some(keys)
    }

    /// Number of keys in the chain.
    pub fn len(&self) -> usize {
        self.keys().map(|k| k.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn push_segment(out: &mut String, key: &GroupKey) {
    match key {
        GroupKey::Undefined => {
            out.push(PATH_ESCAPE);
            out.push(UNDEFINED_CODE);
        }
        GroupKey::Value(text) => {
            for c in text.chars() {
                if c == PATH_ESCAPE || c == PATH_SEPARATOR {
                    out.push(PATH_ESCAPE);
                }
                out.push(c);
            }
        }
    }
}

fn finish_segment(current: &mut String, undefined: &mut bool) -> GroupKey {
    if std::mem::take(undefined) {
        GroupKey::Undefined
    } else {
        GroupKey::Value(std::mem::take(current))
    }
}

// ============================================================================
// GROUP NODE
// ============================================================================

/// One partition of the records at one tree depth.
#[derive(Debug, Clone)]
pub struct GroupNode<'a> {
    pub key: GroupKey,

    /// Depth in the tree (0 = root level).
    pub depth: usize,

    /// The records in this group, in input order.
    pub records: Vec<&'a LeadRecord>,

    pub path_id: PathId,

    /// Sub-groups for the next dimension; `None` until materialized.
    pub children: Option<Vec<GroupNode<'a>>>,
}

impl<'a> GroupNode<'a> {
    pub fn label(&self) -> &str {
        self.key.label()
    }

    /// Builds the children for `resolvers[depth + 1]` if not done yet and
    /// returns them. Empty when there is no further dimension.
    pub fn materialize_children(&mut self, resolvers: &[FieldResolver]) -> &mut [GroupNode<'a>] {
        if self.children.is_none() {
            let children = match resolvers.get(self.depth + 1) {
                Some(next) => {
                    build_level(&self.records, next, self.depth + 1, Some(&self.path_id))
                }
                None => Vec::new(),
            };
            self.children = Some(children);
        }
        match self.children.as_mut() {
            Some(children) => children.as_mut_slice(),
            None => &mut [],
        }
    }
}

/// Partitions `records` by one dimension into sorted sibling nodes.
pub fn build_level<'a>(
    records: &[&'a LeadRecord],
    resolver: &FieldResolver,
    depth: usize,
    parent: Option<&PathId>,
) -> Vec<GroupNode<'a>> {
    let mut partitions: FxHashMap<GroupKey, Vec<&'a LeadRecord>> = FxHashMap::default();
    for &record in records {
        partitions
            .entry(resolver.resolve(record))
            .or_default()
            .push(record);
    }

    let mut groups: Vec<(GroupKey, Vec<&'a LeadRecord>)> = partitions.into_iter().collect();
    groups.sort_by(|a, b| a.0.cmp(&b.0));

    groups
        .into_iter()
        .map(|(key, records)| {
            let path_id = match parent {
                Some(p) => p.child(&key),
                None => PathId::root(&key),
            };
            GroupNode {
                key,
                depth,
                records,
                path_id,
                children: None,
            }
        })
        .collect()
}

// ============================================================================
// GROUP TREE
// ============================================================================

/// The root-level groups plus what is needed to grow the tree on demand.
#[derive(Debug, Clone)]
pub struct GroupTree<'a> {
    resolvers: Vec<FieldResolver>,
    roots: Vec<GroupNode<'a>>,
    record_count: usize,
}

impl<'a> GroupTree<'a> {
    pub fn new(
        records: &'a [LeadRecord],
        dimensions: &[DimensionSpec],
        catalog: &DimensionCatalog,
    ) -> Self {
        let resolvers: Vec<FieldResolver> = dimensions
            .iter()
            .map(|d| FieldResolver::new(d, catalog))
            .collect();

        let roots = match resolvers.first() {
            Some(first) => {
                let all: Vec<&'a LeadRecord> = records.iter().collect();
                build_level(&all, first, 0, None)
            }
            None => Vec::new(),
        };

        log::debug!(
            "group tree: {} records, {} dimensions, {} root groups",
            records.len(),
            resolvers.len(),
            roots.len()
        );

        GroupTree {
            resolvers,
            roots,
            record_count: records.len(),
        }
    }

    pub fn roots(&self) -> &[GroupNode<'a>] {
        &self.roots
    }

    pub fn resolvers(&self) -> &[FieldResolver] {
        &self.resolvers
    }

    pub fn levels(&self) -> usize {
        self.resolvers.len()
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Whether a node at `depth` has a further dimension below it.
    pub fn is_expandable(&self, depth: usize) -> bool {
        depth + 1 < self.resolvers.len()
    }

    /// Split borrow used by traversals that grow the tree while walking it.
    pub fn parts_mut(&mut self) -> (&[FieldResolver], &mut [GroupNode<'a>]) {
        (&self.resolvers, &mut self.roots)
    }

    /// Finds the node for `path`, materializing the groups along the way.
    pub fn node_at(&mut self, path: &PathId) -> Option<&GroupNode<'a>> {
        let keys = path.keys()?;
        let (first, rest) = keys.split_first()?;
        let resolvers = &self.resolvers;

        let mut node = self.roots.iter_mut().find(|n| &n.key == first)?;
        for key in rest {
            node = node
                .materialize_children(resolvers)
                .iter_mut()
                .find(|n| &n.key == key)?;
        }
        Some(node)
    }
}

/// Builds the root-level groups for `dimensions[0]`.
pub fn build<'a>(
    records: &'a [LeadRecord],
    dimensions: &[DimensionSpec],
    catalog: &DimensionCatalog,
) -> GroupTree<'a> {
    GroupTree::new(records, dimensions, catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::DateGranularity;

    fn leads() -> Vec<LeadRecord> {
        vec![
            LeadRecord::new()
                .with("status", "Won")
                .with("source", "Web"),
            LeadRecord::new()
                .with("status", "new")
                .with("source", "Referral"),
            LeadRecord::new()
                .with("status", "Won")
                .with("source", "Referral"),
            LeadRecord::new().with("source", "Web"),
            LeadRecord::new()
                .with("status", "Lost")
                .with("source", "Web"),
        ]
    }

    #[test]
    fn test_empty_dimensions_build_no_groups() {
        let records = leads();
        let tree = build(&records, &[], &DimensionCatalog::default());
        assert!(tree.roots().is_empty());
        assert_eq!(tree.record_count(), 5);
    }

    #[test]
    fn test_roots_sorted_and_children_lazy() {
        let records = leads();
        let dims = vec![DimensionSpec::new("status"), DimensionSpec::new("source")];
        let tree = build(&records, &dims, &DimensionCatalog::default());

        let labels: Vec<&str> = tree.roots().iter().map(GroupNode::label).collect();
        assert_eq!(labels, vec!["(undefined)", "Lost", "new", "Won"]);
        assert!(tree.roots().iter().all(|n| n.children.is_none()));
        assert!(tree.roots().iter().all(|n| n.depth == 0));
    }

    #[test]
    fn test_partition_covers_every_record_once() {
        let records = leads();
        let dims = vec![DimensionSpec::new("status"), DimensionSpec::new("source")];
        let mut tree = build(&records, &dims, &DimensionCatalog::default());

        let total: usize = tree.roots().iter().map(|n| n.records.len()).sum();
        assert_eq!(total, records.len());

        let (resolvers, roots) = tree.parts_mut();
        for root in roots.iter_mut() {
            let parent_len = root.records.len();
            let children = root.materialize_children(resolvers);
            let child_len: usize = children.iter().map(|c| c.records.len()).sum();
            assert_eq!(child_len, parent_len);
            assert!(children.iter().all(|c| c.depth == 1));
        }
    }

    #[test]
    fn test_leaf_has_no_children() {
        let records = leads();
        let dims = vec![DimensionSpec::new("status")];
        let mut tree = build(&records, &dims, &DimensionCatalog::default());
        assert!(!tree.is_expandable(0));

        let (resolvers, roots) = tree.parts_mut();
        assert!(roots[0].materialize_children(resolvers).is_empty());
    }

    #[test]
    fn test_path_ids_chain_keys() {
        let records = leads();
        let dims = vec![DimensionSpec::new("status"), DimensionSpec::new("source")];
        let mut tree = build(&records, &dims, &DimensionCatalog::default());

        let won = PathId::from_keys(&[GroupKey::value("Won")]).unwrap();
        let node = tree.node_at(&won).unwrap();
        assert_eq!(node.records.len(), 2);

        let won_web = won.child(&GroupKey::value("Web"));
        assert_eq!(won_web.as_str(), "Won/Web");
        let node = tree.node_at(&won_web).unwrap();
        assert_eq!(node.records.len(), 1);
        assert_eq!(node.depth, 1);

        assert!(tree
            .node_at(&won.child(&GroupKey::value("Email")))
            .is_none());
    }

    #[test]
    fn test_path_ids_stable_across_rebuilds() {
        let records = leads();
        let dims = vec![DimensionSpec::new("status"), DimensionSpec::new("source")];
        let catalog = DimensionCatalog::default();
        let first: Vec<PathId> = build(&records, &dims, &catalog)
            .roots()
            .iter()
            .map(|n| n.path_id.clone())
            .collect();
        let second: Vec<PathId> = build(&records, &dims, &catalog)
            .roots()
            .iter()
            .map(|n| n.path_id.clone())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_path_escaping_keeps_chains_distinct() {
        let a = PathId::from_keys(&[GroupKey::value("a/b"), GroupKey::value("c")]).unwrap();
        let b = PathId::from_keys(&[GroupKey::value("a"), GroupKey::value("b/c")]).unwrap();
        assert_ne!(a, b);

        let literal = PathId::root(&GroupKey::value("(undefined)"));
        let sentinel = PathId::root(&GroupKey::Undefined);
        assert_ne!(literal, sentinel);
    }

    #[test]
    fn test_path_keys_decode() {
        let keys = vec![
            GroupKey::value(r"back\slash"),
            GroupKey::Undefined,
            GroupKey::value("x/y"),
        ];
        let path = PathId::from_keys(&keys).unwrap();
        assert_eq!(path.keys(), Some(keys));
        assert_eq!(path.len(), 3);

        assert_eq!(PathId::from_encoded(r"bad\q").keys(), None);
        assert_eq!(PathId::from_encoded(r"\ux").keys(), None);
        assert_eq!(PathId::from_encoded("trailing\\").keys(), None);
    }

    #[test]
    fn test_date_dimension_groups_by_bucket() {
        let records = vec![
            LeadRecord::new().with("created_at", "2024-02-10"),
            LeadRecord::new().with("created_at", "2024-03-02"),
            LeadRecord::new().with("created_at", "2024-07-19"),
            LeadRecord::new().with("created_at", "someday"),
        ];
        let dims = vec![DimensionSpec::dated("created_at", DateGranularity::Quarter)];
        let tree = build(&records, &dims, &DimensionCatalog::default());

        let summary: Vec<(&str, usize)> = tree
            .roots()
            .iter()
            .map(|n| (n.label(), n.records.len()))
            .collect();
        assert_eq!(
            summary,
            vec![("(undefined)", 1), ("Q1 2024", 2), ("Q3 2024", 1)]
        );
    }
}
