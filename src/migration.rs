use serde::Serialize;
use serde_json::{json, Value};

use crate::db::DbPool;
use crate::inject;
use crate::models::item_meta::ItemMeta;
use crate::models::settings::Setting;

/// What a detect or migrate call operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Post,
    Page,
}

impl Scope {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "global" => Some(Scope::Global),
            "post" => Some(Scope::Post),
            "page" => Some(Scope::Page),
            _ => None,
        }
    }

    fn item_type(self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Post => "post",
            Scope::Page => "page",
        }
    }
}

// Legacy-to-current key pairs, header first.
const GLOBAL_PAIRS: [(&str, &str); 2] = [
    (inject::LEGACY_GLOBAL_HEADER, inject::GLOBAL_HEADER_CODE),
    (inject::LEGACY_GLOBAL_FOOTER, inject::GLOBAL_FOOTER_CODE),
];

const ITEM_PAIRS: [(&str, &str); 2] = [
    (inject::LEGACY_ITEM_HEADER, inject::ITEM_HEADER_CODE),
    (inject::LEGACY_ITEM_FOOTER, inject::ITEM_FOOTER_CODE),
];

#[derive(Debug, Serialize)]
struct LegacyItem {
    id: i64,
    title: String,
    fields: Vec<String>,
}

/// Reports what legacy data exists in the given scope without touching it.
pub fn detect(pool: &DbPool, scope: Scope) -> Result<Value, String> {
    match scope {
        Scope::Global => {
            let mut items = serde_json::Map::new();
            let mut found = 0;

            let header = Setting::get(pool, inject::LEGACY_GLOBAL_HEADER).unwrap_or_default();
            if !header.is_empty() {
                items.insert("header".to_string(), Value::Bool(true));
                found += 1;
            }

            let footer = Setting::get(pool, inject::LEGACY_GLOBAL_FOOTER).unwrap_or_default();
            if !footer.is_empty() {
                items.insert("footer".to_string(), Value::Bool(true));
                found += 1;
            }

            Ok(json!({ "found": found, "items": items }))
        }
        Scope::Post | Scope::Page => {
            let rows = ItemMeta::presence_rows(
                pool,
                scope.item_type(),
                inject::LEGACY_ITEM_HEADER,
                inject::LEGACY_ITEM_FOOTER,
            );

            // Rows arrive ordered by item id, so grouping only has to look
            // at the previous entry.
            let mut items: Vec<LegacyItem> = Vec::new();
            for row in rows {
                match items.last_mut() {
                    Some(last) if last.id == row.item_id => last.fields.push(row.key),
                    _ => items.push(LegacyItem {
                        id: row.item_id,
                        title: row.title,
                        fields: vec![row.key],
                    }),
                }
            }

            Ok(json!({ "found": items.len(), "items": items }))
        }
    }
}

/// Copies legacy values onto the current keys, then removes the legacy keys.
/// Running it again is harmless: with nothing left to find it just reports
/// that there was no legacy data.
pub fn migrate(pool: &DbPool, scope: Scope) -> Result<Value, String> {
    match scope {
        Scope::Global => {
            let mut migrated = 0;

            for (legacy, current) in GLOBAL_PAIRS {
                if let Some(value) = Setting::get(pool, legacy) {
                    if !value.is_empty() {
                        Setting::set(pool, current, &value)?;
                        Setting::delete(pool, legacy)?;
                        migrated += 1;
                    }
                }
            }

            if migrated > 0 {
                Ok(json!({
                    "migrated": migrated,
                    "message": format!("Successfully migrated {} global option(s).", migrated),
                }))
            } else {
                Err("No legacy data found to migrate.".to_string())
            }
        }
        Scope::Post | Scope::Page => {
            let item_type = scope.item_type();
            let rows = ItemMeta::presence_rows(
                pool,
                item_type,
                inject::LEGACY_ITEM_HEADER,
                inject::LEGACY_ITEM_FOOTER,
            );

            let mut ids: Vec<i64> = Vec::new();
            for row in &rows {
                if ids.last() != Some(&row.item_id) {
                    ids.push(row.item_id);
                }
            }

            let mut migrated = 0;
            for id in ids {
                for (legacy, current) in ITEM_PAIRS {
                    if let Some(value) = ItemMeta::get(pool, id, legacy) {
                        if !value.is_empty() {
                            ItemMeta::set(pool, id, current, &value)?;
                            ItemMeta::delete(pool, id, legacy)?;
                        }
                    }
                }
                migrated += 1;
            }

            if migrated > 0 {
                Ok(json!({
                    "migrated": migrated,
                    "message": format!("Successfully migrated {} {}(s).", migrated, item_type),
                }))
            } else {
                Err("No legacy data found to migrate.".to_string())
            }
        }
    }
}
