//! Loading items and edges from a JSON snapshot or a SQLite database

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use memrank::graph::edge::CausalEdge;
use memrank::graph::sqlite::SqliteGraphStore;
use memrank::graph::store::{EdgeStore, InMemoryGraphStore, ItemStore};
use memrank::memory::types::MemoryItem;

use crate::error::CliResult;

/// JSON snapshot: `{ "items": [...], "edges": [...], "session_boosts": {"7": 0.1} }`
#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub items: Vec<MemoryItem>,
    #[serde(default)]
    pub edges: Vec<CausalEdge>,
    #[serde(default)]
    pub session_boosts: BTreeMap<i64, f64>,
}

impl Snapshot {
    pub fn from_json(content: &str) -> CliResult<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

pub enum GraphBackend {
    Memory(InMemoryGraphStore),
    Sqlite(SqliteGraphStore),
}

impl GraphBackend {
    pub fn edges(&self) -> &dyn EdgeStore {
        match self {
            GraphBackend::Memory(store) => store,
            GraphBackend::Sqlite(store) => store,
        }
    }

    pub fn items(&self) -> &dyn ItemStore {
        match self {
            GraphBackend::Memory(store) => store,
            GraphBackend::Sqlite(store) => store,
        }
    }
}

/// Candidate items plus the graph they live in
pub struct Dataset {
    pub items: Vec<MemoryItem>,
    pub session_boosts: BTreeMap<i64, f64>,
    pub backend: GraphBackend,
}

impl Dataset {
    /// Load `.json` files as snapshots and anything else as a SQLite database
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Err(format!("Input not found: {}", path.display()).into());
        }

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            tracing::debug!("Loading snapshot from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            Ok(Self::from_snapshot(Snapshot::from_json(&content)?))
        } else {
            tracing::debug!("Opening database {}", path.display());
            let store = SqliteGraphStore::open_read_only(path)?;
            let items = store.load_items()?;
            Ok(Self {
                items,
                session_boosts: BTreeMap::new(),
                backend: GraphBackend::Sqlite(store),
            })
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let store = InMemoryGraphStore::from_parts(snapshot.items.clone(), snapshot.edges);
        Self {
            items: snapshot.items,
            session_boosts: snapshot.session_boosts,
            backend: GraphBackend::Memory(store),
        }
    }

    pub fn find(&self, id: i64) -> Option<&MemoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Items restricted to `ids` (all items when `ids` is empty)
    pub fn candidates(&self, ids: &[i64]) -> Vec<MemoryItem> {
        if ids.is_empty() {
            return self.items.clone();
        }
        self.items
            .iter()
            .filter(|item| ids.contains(&item.id))
            .cloned()
            .collect()
    }
}
