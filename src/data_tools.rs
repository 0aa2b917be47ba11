use serde::Serialize;
use serde_json::{json, Value};

use crate::db::DbPool;
use crate::inject;
use crate::models::item::ItemType;
use crate::models::item_meta::ItemMeta;
use crate::models::settings::Setting;

#[derive(Debug, Serialize)]
struct ReportItem {
    id: i64,
    title: String,
    fields: Vec<String>,
    edit_url: String,
}

/// Lists every item of the given type carrying injection code, with which
/// positions it uses and a link to its edit screen.
pub fn usage_report(pool: &DbPool, item_type: ItemType) -> Value {
    let admin_slug = Setting::get_or(pool, "admin_slug", "admin");
    let rows = ItemMeta::presence_rows(
        pool,
        item_type.as_str(),
        inject::ITEM_HEADER_CODE,
        inject::ITEM_FOOTER_CODE,
    );

    let mut items: Vec<ReportItem> = Vec::new();
    for row in rows {
        let label = if row.key == inject::ITEM_HEADER_CODE {
            "Header".to_string()
        } else {
            "Footer".to_string()
        };
        match items.last_mut() {
            Some(last) if last.id == row.item_id => last.fields.push(label),
            _ => items.push(ReportItem {
                id: row.item_id,
                edit_url: format!("/{}/items/{}/edit", admin_slug, row.item_id),
                title: row.title,
                fields: vec![label],
            }),
        }
    }

    let mut header_only = 0;
    let mut footer_only = 0;
    let mut both = 0;
    for item in &items {
        let has_header = item.fields.iter().any(|f| f == "Header");
        let has_footer = item.fields.iter().any(|f| f == "Footer");
        if has_header && has_footer {
            both += 1;
        } else if has_header {
            header_only += 1;
        } else {
            footer_only += 1;
        }
    }

    json!({
        "found": items.len(),
        "items": items,
        "header_count": header_only,
        "footer_count": footer_only,
        "both_count": both,
    })
}

/// How many items of the given type still carry injection code.
pub fn count(pool: &DbPool, item_type: ItemType) -> i64 {
    ItemMeta::count_with_keys(
        pool,
        item_type.as_str(),
        inject::ITEM_HEADER_CODE,
        inject::ITEM_FOOTER_CODE,
    )
}

/// Removes injection code from one batch of items and reports how many were
/// touched. The limit is clamped to `MAX_DELETE_BATCH`; a non-positive limit
/// deletes nothing. Matching ids are re-queried on every call, so callers
/// loop with a fixed offset of zero until this returns zero.
pub fn delete_batch(
    pool: &DbPool,
    item_type: ItemType,
    limit: i64,
    offset: i64,
) -> Result<i64, String> {
    let limit = limit.clamp(0, inject::MAX_DELETE_BATCH);
    let ids = ItemMeta::ids_with_keys(
        pool,
        item_type.as_str(),
        inject::ITEM_HEADER_CODE,
        inject::ITEM_FOOTER_CODE,
        limit,
        offset,
    );

    let mut deleted = 0;
    for id in ids {
        ItemMeta::delete(pool, id, inject::ITEM_HEADER_CODE)?;
        ItemMeta::delete(pool, id, inject::ITEM_FOOTER_CODE)?;
        deleted += 1;
    }

    Ok(deleted)
}

/// Removes both global snippets. Fails with a plain message when neither
/// was set.
pub fn delete_global(pool: &DbPool) -> Result<Value, String> {
    let mut deleted = 0;

    for key in [inject::GLOBAL_HEADER_CODE, inject::GLOBAL_FOOTER_CODE] {
        if let Some(value) = Setting::get(pool, key) {
            if !value.is_empty() {
                Setting::delete(pool, key)?;
                deleted += 1;
            }
        }
    }

    if deleted > 0 {
        Ok(json!({
            "deleted": deleted,
            "message": format!("Successfully deleted {} global option(s).", deleted),
        }))
    } else {
        Err("No global data found to delete.".to_string())
    }
}
