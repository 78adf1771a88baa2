//! ob-hierarchy - hierarchical views over flat parent/child records
//!
//! Rows pulled from a category table, an org chart or any other
//! self-referencing source name their own id and their parent's id. The
//! [`HierarchyBuilder`] indexes them once and answers:
//!
//! - `get_children` - direct children, in input order
//! - `get_ancestor_siblings` - the sibling set at the grandparent level
//! - `get_ancestors` - the chain from the top-most ancestor down to a node
//! - `flatten_descendants` - pre-order walk with 1-based levels
//! - `build_tree` / `build_tree_sorted` - nested [`TreeNode`]s
//! - `indented` / `render_with` - glyph-prefixed listings for display
//!
//! ```
//! use ob_hierarchy::{HierarchyBuilder, HierarchyConfig, RecordId};
//! use serde_json::json;
//!
//! let builder = HierarchyBuilder::from_value(
//!     json!([
//!         { "id": 1, "parent_id": 0, "name": "A" },
//!         { "id": 2, "parent_id": 1, "name": "A1" }
//!     ]),
//!     HierarchyConfig::default(),
//! )?;
//!
//! let flat = builder.flatten_descendants(&RecordId::Int(0))?;
//! assert_eq!(flat.len(), 2);
//! assert_eq!(flat[1].level, 2);
//! # Ok::<(), ob_hierarchy::HierarchyError>(())
//! ```
//!
//! Cyclic or dangling parent references never hang a traversal: each walk
//! keeps its own visited set and every traversal is bounded by
//! [`HierarchyConfig::max_depth`].

mod builder;
mod config;
mod error;
mod node;
mod record;
mod render;

pub use builder::HierarchyBuilder;
pub use config::{FieldAliases, HierarchyConfig, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
pub use error::{HierarchyError, Result};
pub use node::{flatten_forest, forest_to_value, FlatNode, TreeNode};
pub use record::{Record, RecordId};
pub use render::{IndentedNode, TreeGlyphs};
