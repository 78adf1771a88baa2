//! Derived node types produced by traversals
//!
//! [`FlatNode`] borrows from the loaded records and is what the pre-order
//! walk yields. [`TreeNode`] owns a copy of its record so a nested tree can
//! outlive the builder and be serialised on its own.

use serde_json::Value;

use crate::record::{Record, RecordId};

/// One entry of a flattened pre-order walk
#[derive(Debug, Clone, PartialEq)]
pub struct FlatNode<'a> {
    pub id: &'a RecordId,
    pub record: &'a Record,
    /// 1-based depth below the traversal root
    pub level: u32,
}

/// Nested tree node
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: RecordId,
    pub record: Record,
    /// 1-based depth below the traversal root
    pub level: u32,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(id: RecordId, record: Record, level: u32) -> Self {
        Self {
            id,
            record,
            level,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total descendants
    pub fn descendant_count(&self) -> usize {
        let mut count = 0;
        let mut pending: Vec<&TreeNode> = self.children.iter().collect();
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children.iter());
        }
        count
    }

    /// Find a node by ID in this subtree (including self), first in pre-order
    pub fn find(&self, id: &RecordId) -> Option<&TreeNode> {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            if &node.id == id {
                return Some(node);
            }
            pending.extend(node.children.iter().rev());
        }
        None
    }

    /// Pre-order `(id, level)` pairs for this subtree (including self)
    pub fn flatten(&self) -> Vec<(RecordId, u32)> {
        let mut out = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            out.push((node.id.clone(), node.level));
            pending.extend(node.children.iter().rev());
        }
        out
    }

    /// Convert to a nested JSON object.
    ///
    /// Children are stored under `children_key`; leaves carry no such key.
    /// The key overwrites any same-named field of the record.
    pub fn into_value(mut self, children_key: &str) -> Value {
        let mut parents: Vec<Unfolding> = Vec::new();
        let mut current = Unfolding::take(&mut self);
        loop {
            if let Some(mut child) = current.children.next() {
                parents.push(std::mem::replace(&mut current, Unfolding::take(&mut child)));
                continue;
            }
            let value = current.finish(children_key);
            match parents.pop() {
                Some(mut parent) => {
                    parent.values.push(value);
                    current = parent;
                }
                None => return value,
            }
        }
    }
}

impl Drop for TreeNode {
    // Unlink the subtree level by level so deep chains don't recurse
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// A node being converted to JSON, with the values of its finished children
struct Unfolding {
    record: Record,
    children: std::vec::IntoIter<TreeNode>,
    values: Vec<Value>,
}

impl Unfolding {
    fn take(node: &mut TreeNode) -> Self {
        let children = std::mem::take(&mut node.children);
        Self {
            record: std::mem::take(&mut node.record),
            values: Vec::with_capacity(children.len()),
            children: children.into_iter(),
        }
    }

    fn finish(self, children_key: &str) -> Value {
        let mut record = self.record;
        if !self.values.is_empty() {
            record.insert(children_key.to_string(), Value::Array(self.values));
        }
        Value::Object(record)
    }
}

/// Pre-order `(id, level)` pairs across a forest
pub fn flatten_forest(nodes: &[TreeNode]) -> Vec<(RecordId, u32)> {
    nodes.iter().flat_map(|n| n.flatten()).collect()
}

/// Convert a forest to a JSON array of nested objects
pub fn forest_to_value(nodes: Vec<TreeNode>, children_key: &str) -> Value {
    Value::Array(
        nodes
            .into_iter()
            .map(|n| n.into_value(children_key))
            .collect(),
    )
}
