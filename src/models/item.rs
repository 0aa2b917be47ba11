use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

/// The two content kinds that share the items table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Post,
    Page,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Post => "post",
            ItemType::Page => "page",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "post" => Some(ItemType::Post),
            "page" => Some(ItemType::Page),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContentItem {
    pub id: i64,
    pub item_type: String,
    pub title: String,
    pub slug: String,
    pub body_html: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, FromForm, Deserialize)]
pub struct ItemForm {
    pub item_type: String,
    pub title: String,
    pub slug: String,
    pub body_html: String,
    pub status: String,
    pub header_code: Option<String>,
    pub footer_code: Option<String>,
}

impl ContentItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ContentItem {
            id: row.get("id")?,
            item_type: row.get("item_type")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            body_html: row.get("body_html")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM items WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    pub fn find_by_slug(pool: &DbPool, item_type: &str, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM items WHERE item_type = ?1 AND slug = ?2",
            params![item_type, slug],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool, item_type: Option<&str>, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match item_type {
            Some(t) => (
                "SELECT * FROM items WHERE item_type = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
                    .to_string(),
                vec![
                    Box::new(t.to_string()),
                    Box::new(limit),
                    Box::new(offset),
                ],
            ),
            None => (
                "SELECT * FROM items ORDER BY created_at DESC LIMIT ?1 OFFSET ?2".to_string(),
                vec![Box::new(limit), Box::new(offset)],
            ),
        };

        let mut stmt = match conn.prepare(&sql) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        stmt.query_map(params_refs.as_slice(), Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn published(pool: &DbPool, item_type: &str, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let mut stmt = match conn.prepare(
            "SELECT * FROM items WHERE item_type = ?1 AND status = 'published'
             ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        stmt.query_map(params![item_type, limit, offset], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool, item_type: Option<&str>) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };

        match item_type {
            Some(t) => conn
                .query_row(
                    "SELECT COUNT(*) FROM items WHERE item_type = ?1",
                    params![t],
                    |row| row.get(0),
                )
                .unwrap_or(0),
            None => conn
                .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
                .unwrap_or(0),
        }
    }

    pub fn create(pool: &DbPool, form: &ItemForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;

        let slug = if form.slug.trim().is_empty() {
            slug::slugify(&form.title)
        } else {
            slug::slugify(&form.slug)
        };

        conn.execute(
            "INSERT INTO items (item_type, title, slug, body_html, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![form.item_type, form.title, slug, form.body_html, form.status],
        )
        .map_err(|e| e.to_string())?;

        let id = conn.last_insert_rowid();
        Ok(id)
    }

    pub fn update(pool: &DbPool, id: i64, form: &ItemForm) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;

        let slug = if form.slug.trim().is_empty() {
            slug::slugify(&form.title)
        } else {
            slug::slugify(&form.slug)
        };

        conn.execute(
            "UPDATE items SET title=?1, slug=?2, body_html=?3, status=?4,
             updated_at=CURRENT_TIMESTAMP WHERE id=?5",
            params![form.title, slug, form.body_html, form.status, id],
        )
        .map_err(|e| e.to_string())?;

        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM item_meta WHERE item_id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM items WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
