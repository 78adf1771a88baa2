//! HierarchyBuilder - parent/child views over a flat record collection
//!
//! The builder takes a set of rows that each name their parent and answers
//! hierarchical questions about them:
//! - direct children of a node
//! - the sibling set at the grandparent level
//! - the ancestor chain of a node
//! - a pre-order flattening of a subtree with levels attached
//! - a nested tree
//!
//! Both indexes (id → row, parent id → rows) are built once at load time.
//! Traversals never touch them afterwards; each call keeps its own visited
//! set, so the builder can be shared across threads for reads.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::config::{FieldAliases, HierarchyConfig};
use crate::error::{HierarchyError, Result};
use crate::node::{FlatNode, TreeNode};
use crate::record::{parent_of, Record, RecordId};

/// A loaded row with its normalised ids
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) id: RecordId,
    pub(crate) parent: RecordId,
    pub(crate) record: Record,
}

/// Position in one sibling list during an iterative walk
struct Frame<'a> {
    siblings: &'a [usize],
    next: usize,
}

/// Builds hierarchical views from flat records
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    config: HierarchyConfig,
    entries: Vec<Entry>,
    by_id: HashMap<RecordId, usize>,
    by_parent: HashMap<RecordId, Vec<usize>>,
}

impl HierarchyBuilder {
    /// Create an empty builder with the given configuration
    pub fn new(config: HierarchyConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Create a builder and load `records` into it
    pub fn from_records(records: Vec<Record>, config: HierarchyConfig) -> Result<Self> {
        let mut builder = Self::new(config);
        builder.load(records)?;
        Ok(builder)
    }

    /// Create a builder and load a JSON collection into it (see [`Self::load_value`])
    pub fn from_value(value: Value, config: HierarchyConfig) -> Result<Self> {
        let mut builder = Self::new(config);
        builder.load_value(value)?;
        Ok(builder)
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Replace the working set with `records`, keeping the current aliases.
    ///
    /// Every row must carry a usable id; parent ids that are absent, null or
    /// empty attach the row to the configured root. On error the previously
    /// loaded data is left untouched.
    pub fn load(&mut self, records: Vec<Record>) -> Result<()> {
        self.config.validate()?;
        let indexed = Indexed::build(records, &self.config)?;
        self.install(indexed);
        Ok(())
    }

    /// Replace the working set and the field aliases together.
    ///
    /// The new aliases only take effect if the records load; a failed call
    /// leaves both the previous data and the previous aliases in place.
    pub fn load_with_aliases(
        &mut self,
        records: Vec<Record>,
        aliases: FieldAliases,
    ) -> Result<()> {
        let config = self.config.clone().with_aliases(aliases);
        config.validate()?;
        let indexed = Indexed::build(records, &config)?;
        self.config = config;
        self.install(indexed);
        Ok(())
    }

    /// Load a JSON collection: either an array of objects, or an object
    /// whose values are objects (rows keyed by id, in document order).
    pub fn load_value(&mut self, value: Value) -> Result<()> {
        self.load(records_from_value(value)?)
    }

    /// [`Self::load_value`] with new field aliases
    pub fn load_value_with_aliases(
        &mut self,
        value: Value,
        aliases: FieldAliases,
    ) -> Result<()> {
        self.load_with_aliases(records_from_value(value)?, aliases)
    }

    fn install(&mut self, indexed: Indexed) {
        self.entries = indexed.entries;
        self.by_id = indexed.by_id;
        self.by_parent = indexed.by_parent;
    }

    /// Parse `json` and load it with [`Self::load_value`]
    pub fn load_json_str(&mut self, json: &str) -> Result<()> {
        let value: Value = serde_json::from_str(json)?;
        self.load_value(value)
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All loaded records in input order
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Record for `id` (the last one loaded if ids repeat)
    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.by_id.get(id).map(|&idx| &self.entries[idx].record)
    }

    /// Direct children of `id`, in input order. Empty for unknown ids.
    pub fn get_children(&self, id: &RecordId) -> Vec<&Record> {
        self.by_parent
            .get(id)
            .map(|children| {
                children
                    .iter()
                    .map(|&idx| &self.entries[idx].record)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every record sharing the node's grandparent as parent.
    ///
    /// When the node's parent is not loaded (a top-level node, or a dangling
    /// reference) the grandparent is taken to be the root, so top-level
    /// siblings are returned.
    pub fn get_ancestor_siblings(&self, id: &RecordId) -> Vec<&Record> {
        let Some(&idx) = self.by_id.get(id) else {
            return Vec::new();
        };
        let parent = &self.entries[idx].parent;
        let grandparent = match self.by_id.get(parent) {
            Some(&p) => &self.entries[p].parent,
            None => &self.config.root_id,
        };
        self.get_children(grandparent)
    }

    /// The chain from the top-most loaded ancestor down to `id` itself.
    ///
    /// The climb stops at the root, at a parent that is not loaded, or when
    /// it would revisit a node. Empty for unknown ids.
    pub fn get_ancestors(&self, id: &RecordId) -> Result<Vec<&Record>> {
        let mut chain = Vec::new();
        let mut seen: HashSet<&RecordId> = HashSet::new();
        let mut current = self.by_id.get(id).copied();

        while let Some(idx) = current {
            let entry = &self.entries[idx];
            if !seen.insert(&entry.id) {
                tracing::trace!("Ancestor chain of '{}' loops at '{}'", id, entry.id);
                break;
            }
            if chain.len() == self.config.max_depth {
                return Err(self.depth_exceeded(id));
            }
            chain.push(&entry.record);
            if entry.parent == self.config.root_id {
                break;
            }
            current = self.by_id.get(&entry.parent).copied();
        }

        chain.reverse();
        Ok(chain)
    }

    // =========================================================================
    // TRAVERSALS
    // =========================================================================

    /// Pre-order walk of everything below `root` (root itself excluded).
    ///
    /// Children of `root` are level 1. Each id is emitted at most once, so
    /// cyclic data terminates.
    pub fn flatten_descendants(&self, root: &RecordId) -> Result<Vec<FlatNode<'_>>> {
        let mut out = Vec::new();
        self.walk(root, |entry, level, _| {
            out.push(FlatNode {
                id: &entry.id,
                record: &entry.record,
                level,
            });
        })?;
        Ok(out)
    }

    /// Nested tree of everything below `root`, siblings in input order
    pub fn build_tree(&self, root: &RecordId) -> Result<Vec<TreeNode>> {
        self.build_forest(root, None)
    }

    /// Nested tree with every sibling list stable-sorted by `cmp` before
    /// descending
    pub fn build_tree_sorted<F>(&self, root: &RecordId, cmp: F) -> Result<Vec<TreeNode>>
    where
        F: Fn(&Record, &Record) -> Ordering,
    {
        self.build_forest(root, Some(&cmp))
    }

    /// Expand the tree into a slot arena with an explicit work stack, then
    /// assemble nodes bottom-up. Children always get higher slots than their
    /// parent, so walking the slots backwards finishes every child first.
    fn build_forest(
        &self,
        root: &RecordId,
        cmp: Option<&dyn Fn(&Record, &Record) -> Ordering>,
    ) -> Result<Vec<TreeNode>> {
        // (entry index, level) per slot
        let mut slots: Vec<(usize, u32)> = Vec::new();
        let mut child_slots: Vec<Vec<usize>> = Vec::new();
        let mut top: Vec<usize> = Vec::new();
        let mut pending: Vec<(Option<usize>, usize)> = vec![(None, 1)];

        while let Some((parent_slot, level)) = pending.pop() {
            let parent = match parent_slot {
                Some(slot) => &self.entries[slots[slot].0].id,
                None => root,
            };
            let Some(children) = self.by_parent.get(parent) else {
                continue;
            };
            if level > self.config.max_depth {
                return Err(self.depth_exceeded(root));
            }

            let mut order = children.clone();
            if let Some(cmp) = cmp {
                order.sort_by(|&a, &b| cmp(&self.entries[a].record, &self.entries[b].record));
            }

            for idx in order {
                let slot = slots.len();
                slots.push((idx, level as u32));
                child_slots.push(Vec::new());
                match parent_slot {
                    Some(p) => child_slots[p].push(slot),
                    None => top.push(slot),
                }
                pending.push((Some(slot), level + 1));
            }
        }

        let mut built: Vec<Option<TreeNode>> = Vec::with_capacity(slots.len());
        built.resize_with(slots.len(), || None);
        for slot in (0..slots.len()).rev() {
            let (idx, level) = slots[slot];
            let entry = &self.entries[idx];
            let mut node = TreeNode::new(entry.id.clone(), entry.record.clone(), level);
            node.children = child_slots[slot]
                .iter()
                .filter_map(|&c| built[c].take())
                .collect();
            built[slot] = Some(node);
        }

        Ok(top.iter().filter_map(|&slot| built[slot].take()).collect())
    }

    /// Iterative pre-order walk below `root`.
    ///
    /// `visit` receives the entry, its level and the trail of "is last
    /// sibling" flags from level 1 down to the entry itself. The root is
    /// marked visited up front so a cycle through it is never re-entered.
    pub(crate) fn walk<'a, F>(&'a self, root: &RecordId, mut visit: F) -> Result<()>
    where
        F: FnMut(&'a Entry, u32, &[bool]),
    {
        let Some(top) = self.by_parent.get(root) else {
            return Ok(());
        };

        let mut visited: HashSet<&RecordId> = HashSet::new();
        visited.insert(root);
        let mut stack = vec![Frame {
            siblings: top.as_slice(),
            next: 0,
        }];
        let mut trail: Vec<bool> = Vec::new();

        loop {
            let level = stack.len();
            let Some(frame) = stack.last_mut() else {
                break;
            };
            if frame.next == frame.siblings.len() {
                stack.pop();
                continue;
            }
            let idx = frame.siblings[frame.next];
            frame.next += 1;

            let entry = &self.entries[idx];
            if !visited.insert(&entry.id) {
                tracing::trace!("Skipping revisit of '{}' below '{}'", entry.id, root);
                continue;
            }
            // Last among the siblings that will actually be emitted
            let is_last = stack.last().map_or(true, |frame| {
                frame.siblings[frame.next..]
                    .iter()
                    .all(|&later| visited.contains(&self.entries[later].id))
            });
            if level > self.config.max_depth {
                return Err(self.depth_exceeded(root));
            }

            trail.truncate(level - 1);
            trail.push(is_last);
            visit(entry, level as u32, &trail);

            if let Some(children) = self.by_parent.get(&entry.id) {
                stack.push(Frame {
                    siblings: children.as_slice(),
                    next: 0,
                });
            }
        }

        Ok(())
    }

    fn depth_exceeded(&self, root: &RecordId) -> HierarchyError {
        tracing::warn!(
            "Depth guard of {} tripped below '{}'; parent data is likely cyclic",
            self.config.max_depth,
            root
        );
        HierarchyError::MaxDepthExceeded {
            root: root.clone(),
            max_depth: self.config.max_depth,
        }
    }
}

/// Rows and both indexes, built before anything is swapped into the builder
struct Indexed {
    entries: Vec<Entry>,
    by_id: HashMap<RecordId, usize>,
    by_parent: HashMap<RecordId, Vec<usize>>,
}

impl Indexed {
    fn build(records: Vec<Record>, config: &HierarchyConfig) -> Result<Self> {
        let aliases = &config.aliases;
        let root = &config.root_id;

        let mut entries = Vec::with_capacity(records.len());
        let mut by_id: HashMap<RecordId, usize> = HashMap::with_capacity(records.len());
        let mut by_parent: HashMap<RecordId, Vec<usize>> = HashMap::new();

        for (position, record) in records.into_iter().enumerate() {
            let id = match record.get(&aliases.id) {
                None => {
                    return Err(HierarchyError::invalid_record(
                        position,
                        format!("missing id field '{}'", aliases.id),
                    ))
                }
                Some(value) => RecordId::from_value(value).ok_or_else(|| {
                    HierarchyError::invalid_record(
                        position,
                        format!(
                            "id field '{}' is {}",
                            aliases.id,
                            RecordId::describe(value)
                        ),
                    )
                })?,
            };
            let parent = parent_of(&record, &aliases.parent_id, root).map_err(|kind| {
                HierarchyError::invalid_record(
                    position,
                    format!("parent field '{}' is {}", aliases.parent_id, kind),
                )
            })?;

            if let Some(previous) = by_id.insert(id.clone(), position) {
                tracing::warn!(
                    "Duplicate id '{}' at positions {} and {}; the later row wins id lookups",
                    id,
                    previous,
                    position
                );
            }
            by_parent.entry(parent.clone()).or_default().push(position);
            entries.push(Entry { id, parent, record });
        }

        let dangling = by_parent
            .keys()
            .filter(|p| *p != root && !by_id.contains_key(*p))
            .count();
        tracing::debug!(
            "Loaded {} records under {} distinct parents ({} dangling parent references)",
            entries.len(),
            by_parent.len(),
            dangling
        );

        Ok(Self {
            entries,
            by_id,
            by_parent,
        })
    }
}

/// Unwrap a JSON array (or id-keyed object) of objects into records
fn records_from_value(value: Value) -> Result<Vec<Record>> {
    let rows: Vec<Value> = match value {
        Value::Array(rows) => rows,
        Value::Object(keyed) => keyed.into_iter().map(|(_, row)| row).collect(),
        other => {
            return Err(HierarchyError::invalid_input(format!(
                "expected an array or object of records, found {}",
                json_kind(&other)
            )))
        }
    };

    rows.into_iter()
        .enumerate()
        .map(|(position, row)| match row {
            Value::Object(record) => Ok(record),
            other => Err(HierarchyError::invalid_input(format!(
                "record at position {} is {}, expected an object",
                position,
                json_kind(&other)
            ))),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> HierarchyBuilder {
        HierarchyBuilder::from_value(
            json!([
                { "id": 1, "parent_id": 0, "name": "A" },
                { "id": 2, "parent_id": 0, "name": "B" },
                { "id": 3, "parent_id": 1, "name": "A1" },
                { "id": 4, "parent_id": 1, "name": "A2" },
                { "id": 5, "parent_id": 2, "name": "B1" }
            ]),
            HierarchyConfig::default(),
        )
        .unwrap()
    }

    fn ids(records: &[&Record]) -> Vec<i64> {
        records
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect()
    }

    #[test]
    fn test_get_children_in_input_order() {
        let builder = sample();
        assert_eq!(ids(&builder.get_children(&RecordId::Int(1))), vec![3, 4]);
        assert_eq!(ids(&builder.get_children(&RecordId::Int(0))), vec![1, 2]);
        assert!(builder.get_children(&RecordId::Int(999)).is_empty());
    }

    #[test]
    fn test_flatten_levels() {
        let builder = sample();
        let flat: Vec<(RecordId, u32)> = builder
            .flatten_descendants(&RecordId::Int(0))
            .unwrap()
            .into_iter()
            .map(|n| (n.id.clone(), n.level))
            .collect();
        assert_eq!(
            flat,
            vec![
                (RecordId::Int(1), 1),
                (RecordId::Int(3), 2),
                (RecordId::Int(4), 2),
                (RecordId::Int(2), 1),
                (RecordId::Int(5), 2),
            ]
        );
    }

    #[test]
    fn test_ancestor_siblings() {
        let builder = sample();
        // 3 -> 1 -> 0: siblings at the top level
        assert_eq!(
            ids(&builder.get_ancestor_siblings(&RecordId::Int(3))),
            vec![1, 2]
        );
        // 1's parent is the root, which is not a loaded row
        assert_eq!(
            ids(&builder.get_ancestor_siblings(&RecordId::Int(1))),
            vec![1, 2]
        );
        assert!(builder
            .get_ancestor_siblings(&RecordId::Int(42))
            .is_empty());
    }

    #[test]
    fn test_ancestors_chain() {
        let builder = sample();
        let chain = builder.get_ancestors(&RecordId::Int(4)).unwrap();
        assert_eq!(ids(&chain), vec![1, 4]);
        assert!(builder.get_ancestors(&RecordId::Int(77)).unwrap().is_empty());
    }

    #[test]
    fn test_load_rejects_scalars() {
        let mut builder = HierarchyBuilder::default();
        let err = builder.load_value(json!("rows")).unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidInput { .. }));

        let err = builder.load_value(json!([{ "id": 1 }, 7])).unwrap_err();
        match err {
            HierarchyError::InvalidInput { reason } => {
                assert_eq!(reason, "record at position 1 is a number, expected an object");
            }
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_bad_ids() {
        let mut builder = HierarchyBuilder::default();
        let err = builder.load_value(json!([{ "name": "x" }])).unwrap_err();
        assert!(err.to_string().contains("missing id field 'id'"));

        let err = builder
            .load_value(json!([{ "id": 1, "parent_id": [2] }]))
            .unwrap_err();
        assert!(err.to_string().contains("parent field 'parent_id' is an array"));
    }

    #[test]
    fn test_failed_load_keeps_previous_data() {
        let mut builder = sample();
        assert!(builder.load_value(json!([{ "id": null }])).is_err());
        assert_eq!(builder.len(), 5);
    }

    #[test]
    fn test_keyed_rows_and_aliases() {
        let config = HierarchyConfig::default().with_aliases(FieldAliases {
            parent_id: "pid".into(),
            ..Default::default()
        });
        let builder = HierarchyBuilder::from_value(
            json!({
                "1": { "id": "1", "pid": 0, "name": "top" },
                "2": { "id": "2", "pid": 1, "name": "child" }
            }),
            config,
        )
        .unwrap();
        let children = builder.get_children(&RecordId::from("1"));
        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["name"], json!("child"));
    }

    #[test]
    fn test_reload_with_new_parent_column() {
        let mut builder = sample();
        let pid = FieldAliases {
            parent_id: "pid".into(),
            ..Default::default()
        };
        builder
            .load_value_with_aliases(
                json!([
                    { "id": 10, "pid": 0, "name": "top" },
                    { "id": 11, "pid": 10, "name": "child" }
                ]),
                pid,
            )
            .unwrap();

        assert_eq!(builder.config().aliases.parent_id, "pid");
        assert_eq!(builder.len(), 2);
        assert_eq!(ids(&builder.get_children(&RecordId::Int(10))), vec![11]);
    }

    #[test]
    fn test_failed_aliased_load_keeps_aliases_and_data() {
        let mut builder = sample();
        let key = FieldAliases {
            id: "key".into(),
            ..Default::default()
        };
        let err = builder
            .load_with_aliases(vec![json!({ "id": 1 }).as_object().unwrap().clone()], key)
            .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidRecord { position: 0, .. }));

        assert_eq!(builder.config().aliases, FieldAliases::default());
        assert_eq!(builder.len(), 5);
    }

    #[test]
    fn test_tree_levels_and_order() {
        let builder = sample();
        let forest = builder.build_tree(&RecordId::Int(0)).unwrap();
        let flat: Vec<(RecordId, u32)> = forest.iter().flat_map(|n| n.flatten()).collect();
        let expected: Vec<(RecordId, u32)> = builder
            .flatten_descendants(&RecordId::Int(0))
            .unwrap()
            .into_iter()
            .map(|n| (n.id.clone(), n.level))
            .collect();
        assert_eq!(flat, expected);
    }

    #[test]
    fn test_depth_guard() {
        let config = HierarchyConfig::default().with_max_depth(2);
        let builder = HierarchyBuilder::from_value(
            json!([
                { "id": 1, "parent_id": 0 },
                { "id": 2, "parent_id": 1 },
                { "id": 3, "parent_id": 2 }
            ]),
            config,
        )
        .unwrap();

        let err = builder.flatten_descendants(&RecordId::Int(0)).unwrap_err();
        assert!(err.is_max_depth_exceeded());
        let err = builder.build_tree(&RecordId::Int(0)).unwrap_err();
        assert!(err.is_max_depth_exceeded());
        assert!(builder.get_ancestors(&RecordId::Int(3)).is_err());

        assert_eq!(builder.flatten_descendants(&RecordId::Int(1)).unwrap().len(), 2);
        assert_eq!(builder.get_ancestors(&RecordId::Int(2)).unwrap().len(), 2);
    }

    #[test]
    fn test_builder_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HierarchyBuilder>();
    }
}
