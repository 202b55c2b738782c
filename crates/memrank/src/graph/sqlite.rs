//! SQLite-backed edge and item store
//!
//! Reads the `memory_index` and `causal_edges` tables. Traversal runs inside
//! the database as a recursive CTE that mirrors the in-memory walk: edges are
//! followed in both directions, each path carries the product of its edge
//! weights, and a path never revisits a node it already contains.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, ToSql, params};

use crate::error::{RankError, Result};
use crate::graph::edge::{CausalEdge, Relation};
use crate::graph::store::{EdgeStore, ItemStore, NeighborHit};
use crate::memory::tier::ImportanceTier;
use crate::memory::types::{MemoryItem, parse_timestamp};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS memory_index (
    id INTEGER PRIMARY KEY,
    title TEXT,
    spec_folder TEXT NOT NULL DEFAULT '',
    importance_tier TEXT DEFAULT 'normal',
    importance_weight REAL DEFAULT 0.5,
    access_count INTEGER DEFAULT 0,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS causal_edges (
    id INTEGER PRIMARY KEY,
    source_id INTEGER NOT NULL,
    target_id INTEGER NOT NULL,
    relation TEXT NOT NULL CHECK(relation IN (
        'caused', 'enabled', 'supports', 'derived_from', 'supersedes', 'contradicts'
    )),
    strength REAL DEFAULT 1.0,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(source_id, target_id, relation)
);

CREATE INDEX IF NOT EXISTS idx_causal_edges_source ON causal_edges(source_id);
CREATE INDEX IF NOT EXISTS idx_causal_edges_target ON causal_edges(target_id);
"#;

const ITEM_COLUMNS: &str = "id, title, spec_folder, importance_tier, importance_weight, \
                            access_count, created_at, updated_at";

/// Causal graph and item metadata in a SQLite database
pub struct SqliteGraphStore {
    conn: Mutex<Connection>,
}

impl SqliteGraphStore {
    /// Open (or create) a database file and ensure the schema exists
    pub fn open(path: &Path) -> Result<Self> {
        tracing::debug!("Opening graph store at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an existing database without creating or altering anything.
    ///
    /// Writes through this handle fail with [`RankError::Storage`].
    pub fn open_read_only(path: &Path) -> Result<Self> {
        tracing::debug!("Opening graph store read-only at {}", path.display());
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RankError::Storage("Connection lock poisoned".to_string()))
    }

    /// Insert or replace an item row
    pub fn insert_item(&self, item: &MemoryItem) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO memory_index
             (id, title, spec_folder, importance_tier, importance_weight, access_count,
              created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                item.id,
                item.title,
                item.folder_path,
                item.importance_tier.as_str(),
                item.importance_weight,
                item.access_count,
                item.created_at.map(|ts| ts.to_rfc3339()),
                item.updated_at.map(|ts| ts.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Record a causal edge; linking the same pair and relation again
    /// replaces its strength
    pub fn link(&self, edge: &CausalEdge) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO causal_edges (source_id, target_id, relation, strength)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(source_id, target_id, relation) DO UPDATE SET strength = excluded.strength",
            params![
                edge.source_id,
                edge.target_id,
                edge.relation.as_str(),
                edge.strength_or_default(),
            ],
        )?;
        Ok(())
    }

    pub fn get_item(&self, id: i64) -> Result<Option<MemoryItem>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {ITEM_COLUMNS} FROM memory_index WHERE id = ?1");
        let item = conn.query_row(&sql, [id], row_to_item).optional()?;
        Ok(item)
    }

    /// Every item, ordered by id
    pub fn load_items(&self) -> Result<Vec<MemoryItem>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {ITEM_COLUMNS} FROM memory_index ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map([], row_to_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Every edge, skipping rows with an unrecognized relation
    pub fn load_edges(&self) -> Result<Vec<CausalEdge>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT source_id, target_id, relation, strength FROM causal_edges ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<f64>>(3)?,
            ))
        })?;

        let mut edges = Vec::new();
        for row in rows {
            let (source_id, target_id, relation, strength) = row?;
            match relation.parse::<Relation>() {
                Ok(relation) => edges.push(CausalEdge {
                    source_id,
                    target_id,
                    relation,
                    strength,
                }),
                Err(e) => tracing::warn!("Skipping edge {} -> {}: {}", source_id, target_id, e),
            }
        }
        Ok(edges)
    }
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<MemoryItem> {
    let tier: Option<String> = row.get(3)?;
    let created_at: Option<String> = row.get(6)?;
    let updated_at: Option<String> = row.get(7)?;

    Ok(MemoryItem {
        id: row.get(0)?,
        title: row.get(1)?,
        folder_path: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        importance_tier: ImportanceTier::normalize_opt(tier.as_deref()),
        importance_weight: row.get(4)?,
        access_count: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
        created_at: created_at.as_deref().and_then(parse_timestamp),
        updated_at: updated_at.as_deref().and_then(parse_timestamp),
        similarity: None,
        rrf_score: None,
    })
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

impl EdgeStore for SqliteGraphStore {
    fn neighbors(&self, origin_ids: &[i64], max_hops: u32) -> Result<Vec<NeighborHit>> {
        if origin_ids.is_empty() || max_hops == 0 {
            return Ok(Vec::new());
        }

        let seed_values = vec!["(?)"; origin_ids.len()].join(", ");
        let sql = format!(
            "WITH RECURSIVE
                seeds(id) AS (VALUES {seed_values}),
                links(from_id, to_id, weight) AS (
                    SELECT source_id, target_id, {weight} FROM causal_edges
                    UNION ALL
                    SELECT target_id, source_id, {weight} FROM causal_edges
                    WHERE target_id != source_id
                ),
                walk(origin_id, node_id, hop, walk_score, path) AS (
                    SELECT id, id, 0, 1.0, ',' || id || ',' FROM seeds
                    UNION ALL
                    SELECT w.origin_id, l.to_id, w.hop + 1, w.walk_score * l.weight,
                           w.path || l.to_id || ','
                    FROM walk w
                    JOIN links l ON l.from_id = w.node_id
                    WHERE w.hop < ?
                      AND instr(w.path, ',' || l.to_id || ',') = 0
                )
             SELECT node_id, MIN(hop), MAX(walk_score)
             FROM walk
             WHERE hop > 0 AND node_id NOT IN (SELECT id FROM seeds)
             GROUP BY node_id
             ORDER BY node_id",
            weight = "(CASE relation WHEN 'supersedes' THEN 1.5 \
                      WHEN 'contradicts' THEN 0.8 ELSE 1.0 END \
                      * COALESCE(strength, 1.0))",
        );

        let hops = i64::from(max_hops);
        let mut params: Vec<&dyn ToSql> = origin_ids.iter().map(|id| id as &dyn ToSql).collect();
        params.push(&hops);

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let hits = stmt
            .query_map(params.as_slice(), |row| {
                Ok(NeighborHit {
                    node_id: row.get(0)?,
                    min_hop: row.get(1)?,
                    max_walk_score: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        tracing::debug!(
            origins = origin_ids.len(),
            neighbors = hits.len(),
            "Recursive neighbor query complete"
        );
        Ok(hits)
    }
}

impl ItemStore for SqliteGraphStore {
    fn fetch_by_ids(&self, ids: &[i64]) -> Result<Vec<MemoryItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM memory_index WHERE id IN ({}) ORDER BY id",
            placeholders(ids.len())
        );
        let params: Vec<&dyn ToSql> = ids.iter().map(|id| id as &dyn ToSql).collect();

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params.as_slice(), row_to_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        let conn = store.conn().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
    }

    #[test]
    fn test_item_round_trip_normalizes_tier() {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        {
            let conn = store.conn().unwrap();
            conn.execute(
                "INSERT INTO memory_index (id, spec_folder, importance_tier, access_count, updated_at)
                 VALUES (1, 'specs/a', 'Bogus', NULL, 'garbage')",
                [],
            )
            .unwrap();
        }

        let item = store.get_item(1).unwrap().expect("item exists");
        assert_eq!(item.importance_tier, ImportanceTier::Normal);
        assert_eq!(item.access_count, 0);
        assert!(item.updated_at.is_none());
        assert!(item.created_at.is_some());
        assert!(store.get_item(2).unwrap().is_none());
    }

    #[test]
    fn test_link_upserts_strength() {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        store.link(&CausalEdge::new(1, 2, Relation::Caused)).unwrap();
        store
            .link(&CausalEdge::new(1, 2, Relation::Caused).with_strength(0.4))
            .unwrap();

        let edges = store.load_edges().unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].strength, Some(0.4));
    }

    #[test]
    fn test_neighbors_without_origins() {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        assert!(store.neighbors(&[], 2).unwrap().is_empty());
        assert!(store.neighbors(&[1], 0).unwrap().is_empty());
    }
}
