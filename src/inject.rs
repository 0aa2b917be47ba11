use crate::db::DbPool;
use crate::models::item::ContentItem;
use crate::models::item_meta::ItemMeta;
use crate::models::settings::Setting;

// Settings keys for the global snippets and the per-type switches.
pub const GLOBAL_HEADER_CODE: &str = "inject_global_header_code";
pub const GLOBAL_FOOTER_CODE: &str = "inject_global_footer_code";
pub const ENABLE_FOR_POSTS: &str = "inject_enable_for_posts";
pub const ENABLE_FOR_PAGES: &str = "inject_enable_for_pages";

// Per-item meta keys.
pub const ITEM_HEADER_CODE: &str = "inject_item_header_code";
pub const ITEM_FOOTER_CODE: &str = "inject_item_footer_code";

// Keys written by releases before the inject_ naming. Only the migration and
// data tools read these; the renderer never does.
pub const LEGACY_GLOBAL_HEADER: &str = "attr_global_header_code";
pub const LEGACY_GLOBAL_FOOTER: &str = "attr_global_footer_code";
pub const LEGACY_ITEM_HEADER: &str = "attr_page_header_code";
pub const LEGACY_ITEM_FOOTER: &str = "attr_page_footer_code";

/// Hard cap on items removed per delete-batch request.
pub const MAX_DELETE_BATCH: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Header,
    Footer,
}

impl Position {
    pub fn global_key(self) -> &'static str {
        match self {
            Position::Header => GLOBAL_HEADER_CODE,
            Position::Footer => GLOBAL_FOOTER_CODE,
        }
    }

    pub fn item_key(self) -> &'static str {
        match self {
            Position::Header => ITEM_HEADER_CODE,
            Position::Footer => ITEM_FOOTER_CODE,
        }
    }
}

/// Whether per-item injection is switched on for the given item type.
pub fn enabled_for(pool: &DbPool, item_type: &str) -> bool {
    match item_type {
        "post" => Setting::get_bool(pool, ENABLE_FOR_POSTS),
        "page" => Setting::get_bool(pool, ENABLE_FOR_PAGES),
        _ => false,
    }
}

/// Builds the markup injected at one position of a rendered page.
///
/// The global snippet is emitted exactly as stored. The per-item snippet is
/// trimmed first and only considered on a single-item view whose type switch
/// is on. Every emitted snippet gets a trailing newline, global before item.
pub fn fragment(pool: &DbPool, position: Position, item: Option<&ContentItem>) -> String {
    let mut out = String::new();

    if let Some(global) = Setting::get(pool, position.global_key()) {
        if !global.is_empty() {
            out.push_str(&global);
            out.push('\n');
        }
    }

    if let Some(item) = item {
        if enabled_for(pool, &item.item_type) {
            if let Some(code) = ItemMeta::get(pool, item.id, position.item_key()) {
                let code = code.trim();
                if !code.is_empty() {
                    out.push_str(code);
                    out.push('\n');
                }
            }
        }
    }

    out
}

/// Persists the code fields submitted with an item edit. A `None` field was
/// absent from the submission and leaves the stored value alone; `Some`
/// overwrites, empty string included.
pub fn save_item_code(
    pool: &DbPool,
    item_id: i64,
    header: Option<&str>,
    footer: Option<&str>,
) -> Result<(), String> {
    if let Some(code) = header {
        ItemMeta::set(pool, item_id, ITEM_HEADER_CODE, code)?;
    }
    if let Some(code) = footer {
        ItemMeta::set(pool, item_id, ITEM_FOOTER_CODE, code)?;
    }
    Ok(())
}
