//! Shared fixtures for hierarchy integration tests

#![allow(dead_code)]

use std::sync::Once;

use ob_hierarchy::{HierarchyBuilder, HierarchyConfig, Record, RecordId};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install a test subscriber once per binary. `RUST_LOG=ob_hierarchy=trace`
/// shows revisit skips and depth-guard trips.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Two top-level categories with one level of children
pub fn categories() -> Value {
    json!([
        { "id": 1, "parent_id": 0, "name": "A" },
        { "id": 2, "parent_id": 0, "name": "B" },
        { "id": 3, "parent_id": 1, "name": "A1" },
        { "id": 4, "parent_id": 1, "name": "A2" },
        { "id": 5, "parent_id": 2, "name": "B1" }
    ])
}

pub fn builder(value: Value) -> HierarchyBuilder {
    init_tracing();
    HierarchyBuilder::from_value(value, HierarchyConfig::default())
        .expect("fixture should load")
}

pub fn id(i: i64) -> RecordId {
    RecordId::Int(i)
}

pub fn ids(records: &[&Record]) -> Vec<i64> {
    records
        .iter()
        .map(|r| r["id"].as_i64().expect("integer id"))
        .collect()
}

/// Deterministic pseudo-random forest: node `i` (1-based) hangs under a
/// node with a smaller id, or under the root.
pub fn generated_forest(size: i64, seed: u64) -> Value {
    let mut state = seed.max(1);
    let mut rows = Vec::with_capacity(size as usize);
    for i in 1..=size {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let parent = (state % i as u64) as i64;
        rows.push(json!({ "id": i, "parent_id": parent, "name": format!("node-{}", i) }));
    }
    Value::Array(rows)
}
