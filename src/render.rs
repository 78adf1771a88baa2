//! Indented listings for tree-shaped output
//!
//! Produces the glyph prefix for each node of a pre-order walk (`├`, `└`,
//! `│`) and hands every node to a caller-supplied formatting function.
//! Markup is the caller's business; nothing here knows about HTML.

use serde::{Deserialize, Serialize};

use crate::builder::HierarchyBuilder;
use crate::error::Result;
use crate::record::{name_of, Record, RecordId};

/// Glyphs used to draw the tree prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeGlyphs {
    /// Continuation of an ancestor that has more siblings below
    pub pipe: String,
    /// A node with later siblings
    pub branch: String,
    /// The last node of its sibling list
    pub last: String,
    /// Spacing between columns
    pub pad: String,
}

impl Default for TreeGlyphs {
    fn default() -> Self {
        Self {
            pipe: "│".into(),
            branch: "├".into(),
            last: "└".into(),
            pad: " ".into(),
        }
    }
}

impl TreeGlyphs {
    /// Prefix for a node given its "is last sibling" trail (level 1 first).
    ///
    /// Level-1 nodes get no prefix. Below that: one `pad`, then for every
    /// intermediate ancestor a `pipe` (if it has later siblings) and a `pad`,
    /// then `last` or `branch` for the node itself.
    pub fn prefix(&self, trail: &[bool]) -> String {
        let Some((&is_last, ancestors)) = trail.split_last() else {
            return String::new();
        };
        if ancestors.is_empty() {
            return String::new();
        }

        let mut prefix = self.pad.clone();
        for &ancestor_last in &ancestors[1..] {
            if !ancestor_last {
                prefix.push_str(&self.pipe);
            }
            prefix.push_str(&self.pad);
        }
        prefix.push_str(if is_last { &self.last } else { &self.branch });
        prefix
    }
}

/// A node of an indented listing
#[derive(Debug, Clone, PartialEq)]
pub struct IndentedNode<'a> {
    pub id: &'a RecordId,
    pub record: &'a Record,
    pub level: u32,
    pub prefix: String,
}

impl HierarchyBuilder {
    /// Pre-order listing below `root` with glyph prefixes attached.
    ///
    /// Same order, revisit rules and depth guard as
    /// [`HierarchyBuilder::flatten_descendants`].
    pub fn indented(
        &self,
        root: &RecordId,
        glyphs: &TreeGlyphs,
    ) -> Result<Vec<IndentedNode<'_>>> {
        let mut out = Vec::new();
        self.walk(root, |entry, level, trail| {
            out.push(IndentedNode {
                id: &entry.id,
                record: &entry.record,
                level,
                prefix: glyphs.prefix(trail),
            });
        })?;
        Ok(out)
    }

    /// Concatenate `format(node)` over the indented listing below `root`.
    ///
    /// Nothing is formatted if the walk fails.
    pub fn render_with<F>(&self, root: &RecordId, glyphs: &TreeGlyphs, format: F) -> Result<String>
    where
        F: FnMut(&IndentedNode<'_>) -> String,
    {
        let nodes = self.indented(root, glyphs)?;
        Ok(nodes.iter().map(format).collect())
    }

    /// `prefix + name` for every node below `root`
    pub fn render_names(&self, root: &RecordId, glyphs: &TreeGlyphs) -> Result<Vec<String>> {
        let name_field = &self.config().aliases.name;
        Ok(self
            .indented(root, glyphs)?
            .into_iter()
            .map(|node| format!("{}{}", node.prefix, name_of(node.record, name_field)))
            .collect())
    }
}
