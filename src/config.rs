//! Builder configuration: field aliases, root sentinel and depth guard

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{HierarchyError, Result};
use crate::record::RecordId;

/// Depth guard applied when no explicit limit is configured
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Highest accepted `max_depth`. Derived trait impls on [`crate::TreeNode`]
/// and nested JSON output still recurse per level.
pub const MAX_DEPTH_LIMIT: usize = 4096;

/// Column names the engine reads from each record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldAliases {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub children: String,
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            id: "id".into(),
            parent_id: "parent_id".into(),
            name: "name".into(),
            children: "children".into(),
        }
    }
}

impl FieldAliases {
    /// Build aliases from a plain string-to-string mapping.
    ///
    /// Keys are the logical names (`id`, `parent_id`, `name`, `children`).
    /// Empty values keep the default; unknown keys are ignored.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let mut aliases = Self::default();
        for (key, value) in map {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "id" => aliases.id = value.clone(),
                "parent_id" => aliases.parent_id = value.clone(),
                "name" => aliases.name = value.clone(),
                "children" => aliases.children = value.clone(),
                other => tracing::debug!("Ignoring unknown field alias '{}'", other),
            }
        }
        aliases
    }
}

/// Everything a [`crate::HierarchyBuilder`] needs besides the records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Field-name mapping
    pub aliases: FieldAliases,

    /// Parent id meaning "attach at top level"
    pub root_id: RecordId,

    /// Maximum level a traversal may reach before it is treated as corrupt
    pub max_depth: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            aliases: FieldAliases::default(),
            root_id: RecordId::Int(0),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl HierarchyConfig {
    /// Parse a YAML document, e.g.
    ///
    /// ```yaml
    /// aliases:
    ///   parent_id: pid
    /// root_id: 0
    /// max_depth: 64
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: HierarchyConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_aliases(mut self, aliases: FieldAliases) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_root_id(mut self, root_id: impl Into<RecordId>) -> Self {
        self.root_id = root_id.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(HierarchyError::InvalidConfig(
                "max_depth must be at least 1".into(),
            ));
        }
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(HierarchyError::InvalidConfig(format!(
                "max_depth {} is above the limit of {}",
                self.max_depth, MAX_DEPTH_LIMIT
            )));
        }
        let a = &self.aliases;
        for (key, value) in [
            ("id", &a.id),
            ("parent_id", &a.parent_id),
            ("name", &a.name),
            ("children", &a.children),
        ] {
            if value.is_empty() {
                return Err(HierarchyError::InvalidConfig(format!(
                    "alias for '{}' must not be empty",
                    key
                )));
            }
        }
        if a.id == a.parent_id {
            return Err(HierarchyError::InvalidConfig(format!(
                "id and parent_id cannot share the column '{}'",
                a.id
            )));
        }
        Ok(())
    }
}
