use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemMeta {
    pub item_id: i64,
    pub key: String,
    pub value: String,
}

/// One (item, key) presence row from the reporting queries.
/// The tools group these by item id in application code.
#[derive(Debug)]
pub struct MetaRow {
    pub item_id: i64,
    pub title: String,
    pub key: String,
}

impl ItemMeta {
    pub fn get(pool: &DbPool, item_id: i64, key: &str) -> Option<String> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT value FROM item_meta WHERE item_id = ?1 AND key = ?2",
            params![item_id, key],
            |row| row.get(0),
        )
        .ok()
    }

    pub fn set(pool: &DbPool, item_id: i64, key: &str, value: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO item_meta (item_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(item_id, key) DO UPDATE SET value = ?3",
            params![item_id, key, value],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, item_id: i64, key: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM item_meta WHERE item_id = ?1 AND key = ?2",
            params![item_id, key],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// All (item, key) pairs where an item of the given type holds a non-empty
    /// value under either key, ordered by item id ascending.
    pub fn presence_rows(pool: &DbPool, item_type: &str, k1: &str, k2: &str) -> Vec<MetaRow> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        // key DESC sorts the header key before the footer key for both the
        // current and the legacy key names
        let mut stmt = match conn.prepare(
            "SELECT DISTINCT i.id, i.title, m.key
             FROM items i
             INNER JOIN item_meta m ON i.id = m.item_id
             WHERE i.item_type = ?1
             AND m.key IN (?2, ?3)
             AND m.value != ''
             ORDER BY i.id ASC, m.key DESC",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        stmt.query_map(params![item_type, k1, k2], |row| {
            Ok(MetaRow {
                item_id: row.get(0)?,
                title: row.get(1)?,
                key: row.get(2)?,
            })
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }

    /// Count of distinct items of the given type holding a non-empty value
    /// under either key.
    pub fn count_with_keys(pool: &DbPool, item_type: &str, k1: &str, k2: &str) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };

        conn.query_row(
            "SELECT COUNT(DISTINCT i.id)
             FROM items i
             INNER JOIN item_meta m ON i.id = m.item_id
             WHERE i.item_type = ?1
             AND m.key IN (?2, ?3)
             AND m.value != ''",
            params![item_type, k1, k2],
            |row| row.get(0),
        )
        .unwrap_or(0)
    }

    /// One page of distinct matching item ids, ascending, for batch work.
    pub fn ids_with_keys(
        pool: &DbPool,
        item_type: &str,
        k1: &str,
        k2: &str,
        limit: i64,
        offset: i64,
    ) -> Vec<i64> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let mut stmt = match conn.prepare(
            "SELECT DISTINCT i.id
             FROM items i
             INNER JOIN item_meta m ON i.id = m.item_id
             WHERE i.item_type = ?1
             AND m.key IN (?2, ?3)
             AND m.value != ''
             ORDER BY i.id ASC
             LIMIT ?4 OFFSET ?5",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        stmt.query_map(params![item_type, k1, k2, limit, offset], |row| row.get(0))
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }
}
