#![cfg(test)]

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::collections::HashMap;

use crate::data_tools;
use crate::db::{run_migrations, seed_defaults, DbPool};
use crate::inject::{self, Position};
use crate::migration::{self, Scope};
use crate::models::item::{ContentItem, ItemForm, ItemType};
use crate::models::item_meta::ItemMeta;
use crate::models::settings::Setting;
use crate::rate_limit::RateLimiter;
use crate::render;
use crate::security::auth;
use crate::security::constant_time_eq;
use crate::security::nonce::{self, Action, NonceKey};

/// Atomic counter for unique shared-cache DB names so parallel tests don't collide.
static TEST_DB_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Create a fresh in-memory SQLite pool with all migrations + seed defaults applied.
/// Uses a named shared-cache in-memory DB so multiple connections see the same data.
/// Pre-seeds admin_password_hash with a fast bcrypt hash to avoid the expensive
/// DEFAULT_COST hash in seed_defaults (which can take 60s+ in debug builds).
fn test_pool() -> DbPool {
    let id = TEST_DB_COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let uri = format!("file:testdb_{}?mode=memory&cache=shared", id);
    let manager = SqliteConnectionManager::file(uri);
    let pool = Pool::builder()
        .max_size(2)
        .build(manager)
        .expect("Failed to create test pool");
    {
        let conn = pool.get().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    }
    run_migrations(&pool).expect("Failed to run migrations");
    // Pre-insert admin_password_hash so seed_defaults skips the slow bcrypt call
    {
        let conn = pool.get().unwrap();
        let fast = bcrypt::hash("admin", 4).unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES ('admin_password_hash', ?1)",
            rusqlite::params![fast],
        )
        .unwrap();
    }
    seed_defaults(&pool).expect("Failed to seed defaults");
    pool
}

/// Fast bcrypt hash for tests (cost=4 instead of DEFAULT_COST=12).
fn fast_hash(password: &str) -> String {
    bcrypt::hash(password, 4).unwrap()
}

fn make_item(pool: &DbPool, item_type: &str, title: &str, slug: &str, status: &str) -> i64 {
    ContentItem::create(
        pool,
        &ItemForm {
            item_type: item_type.to_string(),
            title: title.to_string(),
            slug: slug.to_string(),
            body_html: "<p>body</p>".to_string(),
            status: status.to_string(),
            header_code: None,
            footer_code: None,
        },
    )
    .unwrap()
}

// ═══════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════

#[test]
fn settings_set_and_get() {
    let pool = test_pool();
    Setting::set(&pool, "test_key", "hello").unwrap();
    assert_eq!(Setting::get(&pool, "test_key"), Some("hello".to_string()));
}

#[test]
fn settings_get_or_default() {
    let pool = test_pool();
    assert_eq!(Setting::get_or(&pool, "nonexistent", "fallback"), "fallback");
    Setting::set(&pool, "exists", "val").unwrap();
    assert_eq!(Setting::get_or(&pool, "exists", "fallback"), "val");
}

#[test]
fn settings_get_bool() {
    let pool = test_pool();
    Setting::set(&pool, "flag_true", "true").unwrap();
    Setting::set(&pool, "flag_one", "1").unwrap();
    Setting::set(&pool, "flag_false", "false").unwrap();
    assert!(Setting::get_bool(&pool, "flag_true"));
    assert!(Setting::get_bool(&pool, "flag_one"));
    assert!(!Setting::get_bool(&pool, "flag_false"));
    assert!(!Setting::get_bool(&pool, "missing_flag"));
}

#[test]
fn settings_get_i64() {
    let pool = test_pool();
    Setting::set(&pool, "num", "42").unwrap();
    assert_eq!(Setting::get_i64(&pool, "num"), 42);
    assert_eq!(Setting::get_i64(&pool, "missing"), 0);
}

#[test]
fn settings_set_many() {
    let pool = test_pool();
    let mut map = HashMap::new();
    map.insert("k1".to_string(), "v1".to_string());
    map.insert("k2".to_string(), "v2".to_string());
    Setting::set_many(&pool, &map).unwrap();
    assert_eq!(Setting::get(&pool, "k1"), Some("v1".to_string()));
    assert_eq!(Setting::get(&pool, "k2"), Some("v2".to_string()));
}

#[test]
fn settings_upsert() {
    let pool = test_pool();
    Setting::set(&pool, "key", "first").unwrap();
    Setting::set(&pool, "key", "second").unwrap();
    assert_eq!(Setting::get(&pool, "key"), Some("second".to_string()));
}

#[test]
fn settings_delete() {
    let pool = test_pool();
    Setting::set(&pool, "doomed", "x").unwrap();
    Setting::delete(&pool, "doomed").unwrap();
    assert_eq!(Setting::get(&pool, "doomed"), None);
}

// ═══════════════════════════════════════════════════════════
// Content items
// ═══════════════════════════════════════════════════════════

#[test]
fn item_crud() {
    let pool = test_pool();

    // Create
    let id = make_item(&pool, "post", "Hello", "hello", "draft");
    assert!(id > 0);

    // Read
    let item = ContentItem::find_by_id(&pool, id).unwrap();
    assert_eq!(item.item_type, "post");
    assert_eq!(item.title, "Hello");
    assert_eq!(item.slug, "hello");
    assert_eq!(item.status, "draft");

    // Update
    let form = ItemForm {
        item_type: "post".to_string(),
        title: "Updated".to_string(),
        slug: "hello".to_string(),
        body_html: "<p>new</p>".to_string(),
        status: "published".to_string(),
        header_code: None,
        footer_code: None,
    };
    ContentItem::update(&pool, id, &form).unwrap();
    let updated = ContentItem::find_by_id(&pool, id).unwrap();
    assert_eq!(updated.title, "Updated");
    assert_eq!(updated.status, "published");

    // Count
    assert_eq!(ContentItem::count(&pool, Some("post")), 1);
    assert_eq!(ContentItem::count(&pool, Some("page")), 0);

    // Delete
    ContentItem::delete(&pool, id).unwrap();
    assert!(ContentItem::find_by_id(&pool, id).is_none());
    assert_eq!(ContentItem::count(&pool, None), 0);
}

#[test]
fn item_slug_derived_from_title() {
    let pool = test_pool();
    let id = make_item(&pool, "post", "Hello World!", "", "draft");
    let item = ContentItem::find_by_id(&pool, id).unwrap();
    assert_eq!(item.slug, "hello-world");
}

#[test]
fn item_slug_must_be_unique() {
    let pool = test_pool();
    make_item(&pool, "post", "First", "shared", "published");

    let dup = ContentItem::create(
        &pool,
        &ItemForm {
            item_type: "page".to_string(),
            title: "Second".to_string(),
            slug: "shared".to_string(),
            body_html: String::new(),
            status: "draft".to_string(),
            header_code: None,
            footer_code: None,
        },
    );
    assert!(dup.is_err());
    assert_eq!(ContentItem::count(&pool, None), 1);
}

#[test]
fn item_find_by_slug_scoped_to_type() {
    let pool = test_pool();
    make_item(&pool, "post", "About the blog", "about-blog", "published");
    make_item(&pool, "page", "About", "about", "published");

    assert!(ContentItem::find_by_slug(&pool, "page", "about").is_some());
    assert!(ContentItem::find_by_slug(&pool, "post", "about").is_none());
    assert!(ContentItem::find_by_slug(&pool, "post", "about-blog").is_some());
}

#[test]
fn item_published_listing() {
    let pool = test_pool();
    for i in 0..4 {
        make_item(&pool, "post", &format!("Post {}", i), &format!("post-{}", i), "published");
    }
    make_item(&pool, "post", "Draft", "draft-1", "draft");
    make_item(&pool, "page", "Page", "a-page", "published");

    assert_eq!(ContentItem::published(&pool, "post", 10, 0).len(), 4);
    assert_eq!(ContentItem::published(&pool, "post", 3, 0).len(), 3);
    assert_eq!(ContentItem::published(&pool, "post", 10, 3).len(), 1);
    assert_eq!(ContentItem::published(&pool, "page", 10, 0).len(), 1);
    assert_eq!(ContentItem::list(&pool, Some("post"), 100, 0).len(), 5);
}

#[test]
fn item_delete_removes_meta() {
    let pool = test_pool();
    let id = make_item(&pool, "post", "With meta", "with-meta", "published");
    ItemMeta::set(&pool, id, inject::ITEM_HEADER_CODE, "<script>x</script>").unwrap();

    ContentItem::delete(&pool, id).unwrap();
    assert!(ItemMeta::get(&pool, id, inject::ITEM_HEADER_CODE).is_none());
}

// ═══════════════════════════════════════════════════════════
// Item meta
// ═══════════════════════════════════════════════════════════

#[test]
fn meta_set_get_delete() {
    let pool = test_pool();
    let id = make_item(&pool, "post", "P", "p", "published");

    assert_eq!(ItemMeta::get(&pool, id, "k"), None);
    ItemMeta::set(&pool, id, "k", "v").unwrap();
    assert_eq!(ItemMeta::get(&pool, id, "k"), Some("v".to_string()));

    ItemMeta::delete(&pool, id, "k").unwrap();
    assert_eq!(ItemMeta::get(&pool, id, "k"), None);
}

#[test]
fn meta_upsert() {
    let pool = test_pool();
    let id = make_item(&pool, "post", "P", "p", "published");
    ItemMeta::set(&pool, id, "k", "first").unwrap();
    ItemMeta::set(&pool, id, "k", "second").unwrap();
    assert_eq!(ItemMeta::get(&pool, id, "k"), Some("second".to_string()));
}

#[test]
fn meta_presence_rows() {
    let pool = test_pool();
    let a = make_item(&pool, "post", "A", "a", "published");
    let b = make_item(&pool, "post", "B", "b", "published");
    let c = make_item(&pool, "page", "C", "c", "published");

    ItemMeta::set(&pool, a, inject::ITEM_HEADER_CODE, "x").unwrap();
    ItemMeta::set(&pool, a, inject::ITEM_FOOTER_CODE, "y").unwrap();
    ItemMeta::set(&pool, b, inject::ITEM_FOOTER_CODE, "").unwrap(); // empty, excluded
    ItemMeta::set(&pool, b, "unrelated_key", "z").unwrap(); // other key, excluded
    ItemMeta::set(&pool, c, inject::ITEM_HEADER_CODE, "w").unwrap(); // wrong type

    let rows = ItemMeta::presence_rows(
        &pool,
        "post",
        inject::ITEM_HEADER_CODE,
        inject::ITEM_FOOTER_CODE,
    );
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].item_id, a);
    assert_eq!(rows[0].title, "A");
    // Header key sorts before footer key within an item
    assert_eq!(rows[0].key, inject::ITEM_HEADER_CODE);
    assert_eq!(rows[1].key, inject::ITEM_FOOTER_CODE);
}

#[test]
fn meta_count_and_ids() {
    let pool = test_pool();
    let mut ids = Vec::new();
    for i in 0..5 {
        let id = make_item(&pool, "post", &format!("P{}", i), &format!("p-{}", i), "published");
        ItemMeta::set(&pool, id, inject::ITEM_HEADER_CODE, "code").unwrap();
        ids.push(id);
    }
    // Both keys on one item still count it once
    ItemMeta::set(&pool, ids[0], inject::ITEM_FOOTER_CODE, "code").unwrap();

    assert_eq!(
        ItemMeta::count_with_keys(&pool, "post", inject::ITEM_HEADER_CODE, inject::ITEM_FOOTER_CODE),
        5
    );

    let page = ItemMeta::ids_with_keys(
        &pool,
        "post",
        inject::ITEM_HEADER_CODE,
        inject::ITEM_FOOTER_CODE,
        2,
        0,
    );
    assert_eq!(page, vec![ids[0], ids[1]]);

    let rest = ItemMeta::ids_with_keys(
        &pool,
        "post",
        inject::ITEM_HEADER_CODE,
        inject::ITEM_FOOTER_CODE,
        10,
        2,
    );
    assert_eq!(rest, vec![ids[2], ids[3], ids[4]]);
}

// ═══════════════════════════════════════════════════════════
// Injection fragments
// ═══════════════════════════════════════════════════════════

#[test]
fn fragment_empty_when_nothing_configured() {
    let pool = test_pool();
    assert_eq!(inject::fragment(&pool, Position::Header, None), "");
    assert_eq!(inject::fragment(&pool, Position::Footer, None), "");
}

#[test]
fn fragment_global_code_verbatim() {
    let pool = test_pool();
    // Global code is emitted exactly as stored, whitespace included
    Setting::set(&pool, inject::GLOBAL_HEADER_CODE, "  <script>a</script>  ").unwrap();
    assert_eq!(
        inject::fragment(&pool, Position::Header, None),
        "  <script>a</script>  \n"
    );
    // The other position is untouched
    assert_eq!(inject::fragment(&pool, Position::Footer, None), "");
}

#[test]
fn fragment_item_code_trimmed() {
    let pool = test_pool();
    let id = make_item(&pool, "page", "P", "p", "published");
    ItemMeta::set(&pool, id, inject::ITEM_HEADER_CODE, "\n  <script>b</script>  \n").unwrap();
    let item = ContentItem::find_by_id(&pool, id).unwrap();

    // Pages are enabled by default
    assert_eq!(
        inject::fragment(&pool, Position::Header, Some(&item)),
        "<script>b</script>\n"
    );
}

#[test]
fn fragment_whitespace_only_item_code_ignored() {
    let pool = test_pool();
    let id = make_item(&pool, "page", "P", "p", "published");
    ItemMeta::set(&pool, id, inject::ITEM_FOOTER_CODE, "   \n  ").unwrap();
    let item = ContentItem::find_by_id(&pool, id).unwrap();

    assert_eq!(inject::fragment(&pool, Position::Footer, Some(&item)), "");
}

#[test]
fn fragment_global_before_item() {
    let pool = test_pool();
    Setting::set(&pool, inject::GLOBAL_HEADER_CODE, "<meta name=\"g\">").unwrap();
    let id = make_item(&pool, "page", "P", "p", "published");
    ItemMeta::set(&pool, id, inject::ITEM_HEADER_CODE, "<meta name=\"i\">").unwrap();
    let item = ContentItem::find_by_id(&pool, id).unwrap();

    assert_eq!(
        inject::fragment(&pool, Position::Header, Some(&item)),
        "<meta name=\"g\">\n<meta name=\"i\">\n"
    );
}

#[test]
fn fragment_respects_type_switch() {
    let pool = test_pool();
    let id = make_item(&pool, "post", "P", "p", "published");
    ItemMeta::set(&pool, id, inject::ITEM_HEADER_CODE, "<script>x</script>").unwrap();
    let item = ContentItem::find_by_id(&pool, id).unwrap();

    // Posts are disabled by default
    assert_eq!(inject::fragment(&pool, Position::Header, Some(&item)), "");

    Setting::set(&pool, inject::ENABLE_FOR_POSTS, "true").unwrap();
    assert_eq!(
        inject::fragment(&pool, Position::Header, Some(&item)),
        "<script>x</script>\n"
    );
}

#[test]
fn fragment_switch_does_not_gate_global_code() {
    let pool = test_pool();
    Setting::set(&pool, inject::ENABLE_FOR_POSTS, "false").unwrap();
    Setting::set(&pool, inject::ENABLE_FOR_PAGES, "false").unwrap();
    Setting::set(&pool, inject::GLOBAL_FOOTER_CODE, "<script>g</script>").unwrap();

    let id = make_item(&pool, "post", "P", "p", "published");
    let item = ContentItem::find_by_id(&pool, id).unwrap();

    assert_eq!(
        inject::fragment(&pool, Position::Footer, Some(&item)),
        "<script>g</script>\n"
    );
}

#[test]
fn fragment_ignores_item_meta_on_list_views() {
    let pool = test_pool();
    let id = make_item(&pool, "page", "P", "p", "published");
    ItemMeta::set(&pool, id, inject::ITEM_HEADER_CODE, "<script>x</script>").unwrap();

    // No item in scope: only global code applies
    assert_eq!(inject::fragment(&pool, Position::Header, None), "");
}

#[test]
fn enabled_for_unknown_type_is_false() {
    let pool = test_pool();
    assert!(!inject::enabled_for(&pool, "attachment"));
}

// ═══════════════════════════════════════════════════════════
// Saving item code
// ═══════════════════════════════════════════════════════════

#[test]
fn save_item_code_absent_field_keeps_value() {
    let pool = test_pool();
    let id = make_item(&pool, "page", "P", "p", "published");
    inject::save_item_code(&pool, id, Some("<script>h</script>"), Some("<script>f</script>")).unwrap();

    // None means the field was not part of the submission
    inject::save_item_code(&pool, id, None, Some("<script>f2</script>")).unwrap();

    assert_eq!(
        ItemMeta::get(&pool, id, inject::ITEM_HEADER_CODE),
        Some("<script>h</script>".to_string())
    );
    assert_eq!(
        ItemMeta::get(&pool, id, inject::ITEM_FOOTER_CODE),
        Some("<script>f2</script>".to_string())
    );
}

#[test]
fn save_item_code_empty_string_overwrites() {
    let pool = test_pool();
    let id = make_item(&pool, "page", "P", "p", "published");
    inject::save_item_code(&pool, id, Some("<script>h</script>"), None).unwrap();
    inject::save_item_code(&pool, id, Some(""), None).unwrap();

    assert_eq!(ItemMeta::get(&pool, id, inject::ITEM_HEADER_CODE), Some(String::new()));
    // Cleared code no longer renders
    let item = ContentItem::find_by_id(&pool, id).unwrap();
    assert_eq!(inject::fragment(&pool, Position::Header, Some(&item)), "");
}

// ═══════════════════════════════════════════════════════════
// Legacy migration: detect
// ═══════════════════════════════════════════════════════════

#[test]
fn detect_global_reports_each_field() {
    let pool = test_pool();
    Setting::set(&pool, inject::LEGACY_GLOBAL_HEADER, "<script>old</script>").unwrap();

    let data = migration::detect(&pool, Scope::Global).unwrap();
    assert_eq!(data["found"], 1);
    assert_eq!(data["items"]["header"], true);
    assert!(data["items"].get("footer").is_none());

    Setting::set(&pool, inject::LEGACY_GLOBAL_FOOTER, "<script>old2</script>").unwrap();
    let data = migration::detect(&pool, Scope::Global).unwrap();
    assert_eq!(data["found"], 2);
    assert_eq!(data["items"]["footer"], true);
}

#[test]
fn detect_global_ignores_empty_values() {
    let pool = test_pool();
    Setting::set(&pool, inject::LEGACY_GLOBAL_HEADER, "").unwrap();

    let data = migration::detect(&pool, Scope::Global).unwrap();
    assert_eq!(data["found"], 0);
}

#[test]
fn detect_items_groups_fields_per_item() {
    let pool = test_pool();
    let a = make_item(&pool, "post", "A", "a", "published");
    let b = make_item(&pool, "post", "B", "b", "published");
    make_item(&pool, "post", "C", "c", "published"); // no legacy data

    ItemMeta::set(&pool, a, inject::LEGACY_ITEM_HEADER, "x").unwrap();
    ItemMeta::set(&pool, a, inject::LEGACY_ITEM_FOOTER, "y").unwrap();
    ItemMeta::set(&pool, b, inject::LEGACY_ITEM_FOOTER, "z").unwrap();

    let data = migration::detect(&pool, Scope::Post).unwrap();
    assert_eq!(data["found"], 2);

    let items = data["items"].as_array().unwrap();
    assert_eq!(items[0]["id"], a);
    assert_eq!(items[0]["title"], "A");
    assert_eq!(
        items[0]["fields"],
        serde_json::json!([inject::LEGACY_ITEM_HEADER, inject::LEGACY_ITEM_FOOTER])
    );
    assert_eq!(items[1]["id"], b);
    assert_eq!(items[1]["fields"], serde_json::json!([inject::LEGACY_ITEM_FOOTER]));
}

#[test]
fn detect_items_scoped_by_type() {
    let pool = test_pool();
    let page = make_item(&pool, "page", "P", "p", "published");
    ItemMeta::set(&pool, page, inject::LEGACY_ITEM_HEADER, "x").unwrap();

    let posts = migration::detect(&pool, Scope::Post).unwrap();
    assert_eq!(posts["found"], 0);

    let pages = migration::detect(&pool, Scope::Page).unwrap();
    assert_eq!(pages["found"], 1);
}

// ═══════════════════════════════════════════════════════════
// Legacy migration: migrate
// ═══════════════════════════════════════════════════════════

#[test]
fn migrate_global_moves_and_deletes() {
    let pool = test_pool();
    Setting::set(&pool, inject::LEGACY_GLOBAL_HEADER, "<script>h</script>").unwrap();
    Setting::set(&pool, inject::LEGACY_GLOBAL_FOOTER, "<script>f</script>").unwrap();

    let data = migration::migrate(&pool, Scope::Global).unwrap();
    assert_eq!(data["migrated"], 2);
    assert_eq!(data["message"], "Successfully migrated 2 global option(s).");

    assert_eq!(
        Setting::get(&pool, inject::GLOBAL_HEADER_CODE),
        Some("<script>h</script>".to_string())
    );
    assert_eq!(
        Setting::get(&pool, inject::GLOBAL_FOOTER_CODE),
        Some("<script>f</script>".to_string())
    );
    assert_eq!(Setting::get(&pool, inject::LEGACY_GLOBAL_HEADER), None);
    assert_eq!(Setting::get(&pool, inject::LEGACY_GLOBAL_FOOTER), None);
}

#[test]
fn migrate_global_twice_reports_nothing_left() {
    let pool = test_pool();
    Setting::set(&pool, inject::LEGACY_GLOBAL_HEADER, "<script>h</script>").unwrap();

    migration::migrate(&pool, Scope::Global).unwrap();
    let err = migration::migrate(&pool, Scope::Global).unwrap_err();
    assert_eq!(err, "No legacy data found to migrate.");
}

#[test]
fn migrate_items_moves_both_fields() {
    let pool = test_pool();
    let a = make_item(&pool, "post", "A", "a", "published");
    let b = make_item(&pool, "post", "B", "b", "published");
    ItemMeta::set(&pool, a, inject::LEGACY_ITEM_HEADER, "<script>ah</script>").unwrap();
    ItemMeta::set(&pool, a, inject::LEGACY_ITEM_FOOTER, "<script>af</script>").unwrap();
    ItemMeta::set(&pool, b, inject::LEGACY_ITEM_HEADER, "<script>bh</script>").unwrap();

    let data = migration::migrate(&pool, Scope::Post).unwrap();
    assert_eq!(data["migrated"], 2);
    assert_eq!(data["message"], "Successfully migrated 2 post(s).");

    assert_eq!(
        ItemMeta::get(&pool, a, inject::ITEM_HEADER_CODE),
        Some("<script>ah</script>".to_string())
    );
    assert_eq!(
        ItemMeta::get(&pool, a, inject::ITEM_FOOTER_CODE),
        Some("<script>af</script>".to_string())
    );
    assert_eq!(
        ItemMeta::get(&pool, b, inject::ITEM_HEADER_CODE),
        Some("<script>bh</script>".to_string())
    );
    assert_eq!(ItemMeta::get(&pool, a, inject::LEGACY_ITEM_HEADER), None);
    assert_eq!(ItemMeta::get(&pool, a, inject::LEGACY_ITEM_FOOTER), None);
    assert_eq!(ItemMeta::get(&pool, b, inject::LEGACY_ITEM_HEADER), None);

    // Nothing left on the second pass
    let err = migration::migrate(&pool, Scope::Post).unwrap_err();
    assert_eq!(err, "No legacy data found to migrate.");
}

#[test]
fn migrate_items_skips_empty_legacy_values() {
    let pool = test_pool();
    let id = make_item(&pool, "page", "P", "p", "published");
    ItemMeta::set(&pool, id, inject::LEGACY_ITEM_HEADER, "").unwrap();
    ItemMeta::set(&pool, id, inject::LEGACY_ITEM_FOOTER, "<script>f</script>").unwrap();

    let data = migration::migrate(&pool, Scope::Page).unwrap();
    assert_eq!(data["migrated"], 1);
    assert_eq!(data["message"], "Successfully migrated 1 page(s).");

    // The empty legacy row is not copied and not removed
    assert_eq!(ItemMeta::get(&pool, id, inject::ITEM_HEADER_CODE), None);
    assert_eq!(ItemMeta::get(&pool, id, inject::LEGACY_ITEM_HEADER), Some(String::new()));
    assert_eq!(
        ItemMeta::get(&pool, id, inject::ITEM_FOOTER_CODE),
        Some("<script>f</script>".to_string())
    );
}

#[test]
fn migrate_then_render_serves_migrated_code() {
    let pool = test_pool();
    Setting::set(&pool, inject::LEGACY_GLOBAL_HEADER, "<script>legacy</script>").unwrap();

    // Before migration the renderer never reads legacy keys
    let before = render::page_shell(&pool, "T", "", None);
    assert!(!before.contains("<script>legacy</script>"));

    migration::migrate(&pool, Scope::Global).unwrap();

    let after = render::page_shell(&pool, "T", "", None);
    assert!(after.contains("<script>legacy</script>\n</head>"));
}

// ═══════════════════════════════════════════════════════════
// Data tools: usage report
// ═══════════════════════════════════════════════════════════

#[test]
fn usage_report_partitions_items() {
    let pool = test_pool();
    let a = make_item(&pool, "post", "Header only", "a", "published");
    let b = make_item(&pool, "post", "Footer only", "b", "published");
    let c = make_item(&pool, "post", "Both", "c", "published");
    let d = make_item(&pool, "post", "Empty", "d", "published");
    make_item(&pool, "post", "None", "e", "published");

    ItemMeta::set(&pool, a, inject::ITEM_HEADER_CODE, "x").unwrap();
    ItemMeta::set(&pool, b, inject::ITEM_FOOTER_CODE, "y").unwrap();
    ItemMeta::set(&pool, c, inject::ITEM_HEADER_CODE, "z").unwrap();
    ItemMeta::set(&pool, c, inject::ITEM_FOOTER_CODE, "w").unwrap();
    ItemMeta::set(&pool, d, inject::ITEM_HEADER_CODE, "").unwrap();

    let data = data_tools::usage_report(&pool, ItemType::Post);
    assert_eq!(data["found"], 3);
    assert_eq!(data["header_count"], 1);
    assert_eq!(data["footer_count"], 1);
    assert_eq!(data["both_count"], 1);

    let items = data["items"].as_array().unwrap();
    assert_eq!(items[0]["fields"], serde_json::json!(["Header"]));
    assert_eq!(items[1]["fields"], serde_json::json!(["Footer"]));
    assert_eq!(items[2]["fields"], serde_json::json!(["Header", "Footer"]));
}

#[test]
fn usage_report_edit_urls_use_admin_slug() {
    let pool = test_pool();
    Setting::set(&pool, "admin_slug", "backstage").unwrap();
    let id = make_item(&pool, "page", "P", "p", "published");
    ItemMeta::set(&pool, id, inject::ITEM_HEADER_CODE, "x").unwrap();

    let data = data_tools::usage_report(&pool, ItemType::Page);
    assert_eq!(
        data["items"][0]["edit_url"],
        format!("/backstage/items/{}/edit", id)
    );
}

#[test]
fn usage_report_ignores_legacy_keys() {
    let pool = test_pool();
    let id = make_item(&pool, "post", "P", "p", "published");
    ItemMeta::set(&pool, id, inject::LEGACY_ITEM_HEADER, "x").unwrap();

    let data = data_tools::usage_report(&pool, ItemType::Post);
    assert_eq!(data["found"], 0);
}

#[test]
fn usage_report_includes_disabled_types() {
    let pool = test_pool();
    // Injection for posts is off by default; reporting still sees the data
    let id = make_item(&pool, "post", "P", "p", "published");
    ItemMeta::set(&pool, id, inject::ITEM_FOOTER_CODE, "x").unwrap();

    assert!(!inject::enabled_for(&pool, "post"));
    let data = data_tools::usage_report(&pool, ItemType::Post);
    assert_eq!(data["found"], 1);
}

// ═══════════════════════════════════════════════════════════
// Data tools: bulk deletion
// ═══════════════════════════════════════════════════════════

#[test]
fn delete_count_matches_report() {
    let pool = test_pool();
    for i in 0..3 {
        let id = make_item(&pool, "post", &format!("P{}", i), &format!("p-{}", i), "published");
        ItemMeta::set(&pool, id, inject::ITEM_HEADER_CODE, "x").unwrap();
    }
    assert_eq!(data_tools::count(&pool, ItemType::Post), 3);
    assert_eq!(data_tools::count(&pool, ItemType::Page), 0);
}

#[test]
fn delete_batch_removes_both_keys() {
    let pool = test_pool();
    let id = make_item(&pool, "post", "P", "p", "published");
    ItemMeta::set(&pool, id, inject::ITEM_HEADER_CODE, "x").unwrap();
    ItemMeta::set(&pool, id, inject::ITEM_FOOTER_CODE, "y").unwrap();

    let deleted = data_tools::delete_batch(&pool, ItemType::Post, 50, 0).unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(ItemMeta::get(&pool, id, inject::ITEM_HEADER_CODE), None);
    assert_eq!(ItemMeta::get(&pool, id, inject::ITEM_FOOTER_CODE), None);
}

#[test]
fn delete_batch_clamps_limit() {
    let pool = test_pool();
    for i in 0..60 {
        let id = make_item(&pool, "post", &format!("P{}", i), &format!("p-{}", i), "published");
        ItemMeta::set(&pool, id, inject::ITEM_HEADER_CODE, "x").unwrap();
    }

    // Requesting more than the cap only removes one cap's worth
    let deleted = data_tools::delete_batch(&pool, ItemType::Post, 1000, 0).unwrap();
    assert_eq!(deleted, 50);
    assert_eq!(data_tools::count(&pool, ItemType::Post), 10);

    // Non-positive limits delete nothing
    assert_eq!(data_tools::delete_batch(&pool, ItemType::Post, 0, 0).unwrap(), 0);
    assert_eq!(data_tools::delete_batch(&pool, ItemType::Post, -5, 0).unwrap(), 0);
    assert_eq!(data_tools::count(&pool, ItemType::Post), 10);
}

#[test]
fn delete_batch_loop_with_fixed_offset_drains_everything() {
    let pool = test_pool();
    for i in 0..23 {
        let id = make_item(&pool, "post", &format!("P{}", i), &format!("p-{}", i), "published");
        ItemMeta::set(&pool, id, inject::ITEM_HEADER_CODE, "x").unwrap();
    }
    let before = data_tools::count(&pool, ItemType::Post);
    assert_eq!(before, 23);

    // The client loops with offset 0 because each batch re-queries the live set
    let mut total = 0;
    loop {
        let deleted = data_tools::delete_batch(&pool, ItemType::Post, 10, 0).unwrap();
        if deleted == 0 {
            break;
        }
        total += deleted;
    }
    assert_eq!(total, before);
    assert_eq!(data_tools::count(&pool, ItemType::Post), 0);
}

#[test]
fn delete_batch_leaves_other_type_alone() {
    let pool = test_pool();
    let post = make_item(&pool, "post", "P", "p", "published");
    let page = make_item(&pool, "page", "G", "g", "published");
    ItemMeta::set(&pool, post, inject::ITEM_HEADER_CODE, "x").unwrap();
    ItemMeta::set(&pool, page, inject::ITEM_HEADER_CODE, "y").unwrap();

    data_tools::delete_batch(&pool, ItemType::Post, 50, 0).unwrap();
    assert_eq!(ItemMeta::get(&pool, post, inject::ITEM_HEADER_CODE), None);
    assert_eq!(ItemMeta::get(&pool, page, inject::ITEM_HEADER_CODE), Some("y".to_string()));
}

#[test]
fn delete_global_removes_set_values() {
    let pool = test_pool();
    Setting::set(&pool, inject::GLOBAL_HEADER_CODE, "<script>h</script>").unwrap();
    Setting::set(&pool, inject::GLOBAL_FOOTER_CODE, "<script>f</script>").unwrap();

    let data = data_tools::delete_global(&pool).unwrap();
    assert_eq!(data["deleted"], 2);
    assert_eq!(data["message"], "Successfully deleted 2 global option(s).");
    assert_eq!(Setting::get(&pool, inject::GLOBAL_HEADER_CODE), None);
    assert_eq!(Setting::get(&pool, inject::GLOBAL_FOOTER_CODE), None);
}

#[test]
fn delete_global_with_nothing_set_fails() {
    let pool = test_pool();
    let err = data_tools::delete_global(&pool).unwrap_err();
    assert_eq!(err, "No global data found to delete.");

    // Empty strings count as nothing
    Setting::set(&pool, inject::GLOBAL_HEADER_CODE, "").unwrap();
    assert!(data_tools::delete_global(&pool).is_err());
}

#[test]
fn delete_global_only_header_set() {
    let pool = test_pool();
    Setting::set(&pool, inject::GLOBAL_HEADER_CODE, "<script>h</script>").unwrap();

    let data = data_tools::delete_global(&pool).unwrap();
    assert_eq!(data["deleted"], 1);
    assert_eq!(data["message"], "Successfully deleted 1 global option(s).");
}

// ═══════════════════════════════════════════════════════════
// Anti-forgery tokens
// ═══════════════════════════════════════════════════════════

#[test]
fn nonce_issue_and_verify() {
    let key = NonceKey("test-secret".to_string());
    let token = nonce::issue(&key, Action::Migration, "session-1");
    assert_eq!(token.len(), 16); // 8 bytes hex-encoded
    assert!(nonce::verify(&key, Action::Migration, "session-1", &token));
}

#[test]
fn nonce_rejects_other_action() {
    let key = NonceKey("test-secret".to_string());
    let token = nonce::issue(&key, Action::Migration, "session-1");
    assert!(!nonce::verify(&key, Action::DataTools, "session-1", &token));
}

#[test]
fn nonce_rejects_other_session() {
    let key = NonceKey("test-secret".to_string());
    let token = nonce::issue(&key, Action::DataTools, "session-1");
    assert!(!nonce::verify(&key, Action::DataTools, "session-2", &token));
}

#[test]
fn nonce_rejects_garbage() {
    let key = NonceKey("test-secret".to_string());
    assert!(!nonce::verify(&key, Action::Migration, "session-1", ""));
    assert!(!nonce::verify(&key, Action::Migration, "session-1", "deadbeef"));
    assert!(!nonce::verify(
        &key,
        Action::Migration,
        "session-1",
        "0000000000000000"
    ));
}

#[test]
fn nonce_depends_on_key() {
    let k1 = NonceKey("secret-one".to_string());
    let k2 = NonceKey("secret-two".to_string());
    let token = nonce::issue(&k1, Action::Migration, "s");
    assert!(!nonce::verify(&k2, Action::Migration, "s", &token));
}

#[test]
fn nonce_previous_tick_still_valid() {
    let key = NonceKey("test-secret".to_string());
    let previous = nonce::current_tick() - 1;
    let token = nonce::sign(&key, previous, Action::DataTools, "s");
    assert!(nonce::verify(&key, Action::DataTools, "s", &token));
}

#[test]
fn nonce_two_ticks_old_rejected() {
    let key = NonceKey("test-secret".to_string());
    let stale = nonce::current_tick() - 2;
    let token = nonce::sign(&key, stale, Action::Migration, "s");
    assert!(!nonce::verify(&key, Action::Migration, "s", &token));
}

// ═══════════════════════════════════════════════════════════
// Security: passwords and hashing
// ═══════════════════════════════════════════════════════════

#[test]
fn password_hash_and_verify() {
    let hash = fast_hash("my_secure_password");
    assert!(auth::verify_password("my_secure_password", &hash));
    assert!(!auth::verify_password("wrong_password", &hash));
}

#[test]
fn password_verify_bad_hash() {
    assert!(!auth::verify_password("anything", "not-a-bcrypt-hash"));
}

#[test]
fn ip_hashing() {
    let h1 = auth::hash_ip("192.168.1.1");
    let h2 = auth::hash_ip("192.168.1.1");
    let h3 = auth::hash_ip("10.0.0.1");
    assert_eq!(h1, h2); // deterministic
    assert_ne!(h1, h3); // different IPs
    assert_eq!(h1.len(), 64); // SHA-256 hex
}

#[test]
fn constant_time_eq_basics() {
    assert!(constant_time_eq(b"abc", b"abc"));
    assert!(!constant_time_eq(b"abc", b"abd"));
    assert!(!constant_time_eq(b"abc", b"abcd"));
    assert!(constant_time_eq(b"", b""));
}

// ═══════════════════════════════════════════════════════════
// Security: sessions
// ═══════════════════════════════════════════════════════════

#[test]
fn session_create_and_validate() {
    let pool = test_pool();

    let sid = auth::create_session(&pool, Some("1.2.3.4"), Some("TestAgent")).unwrap();
    assert!(!sid.is_empty());

    assert!(auth::validate_session(&pool, &sid));
    assert!(!auth::validate_session(&pool, "nonexistent"));
}

#[test]
fn session_destroy() {
    let pool = test_pool();
    let sid = auth::create_session(&pool, None, None).unwrap();
    assert!(auth::validate_session(&pool, &sid));

    auth::destroy_session(&pool, &sid).unwrap();
    assert!(!auth::validate_session(&pool, &sid));
}

#[test]
fn session_cleanup_expired() {
    let pool = test_pool();
    let sid = auth::create_session(&pool, None, None).unwrap();

    // Manually insert an expired session
    {
        let conn = pool.get().unwrap();
        let now = chrono::Utc::now().naive_utc();
        conn.execute(
            "INSERT INTO sessions (id, created_at, expires_at) VALUES ('expired-sess', ?1, ?2)",
            rusqlite::params![now - chrono::Duration::days(2), now - chrono::Duration::days(1)],
        )
        .unwrap();
    }

    let removed = auth::cleanup_expired_sessions(&pool).unwrap();
    assert_eq!(removed, 1);

    // Valid session should still exist
    assert!(auth::validate_session(&pool, &sid));
    // Expired session should be gone
    assert!(!auth::validate_session(&pool, "expired-sess"));
}

#[test]
fn session_expiry_floor() {
    let pool = test_pool();
    // A zero or negative setting still yields a session valid right now
    Setting::set(&pool, "session_expiry_hours", "0").unwrap();
    let sid = auth::create_session(&pool, None, None).unwrap();
    assert!(auth::validate_session(&pool, &sid));
}

// ═══════════════════════════════════════════════════════════
// Rendering
// ═══════════════════════════════════════════════════════════

#[test]
fn html_escape_basics() {
    assert_eq!(
        render::html_escape("<b>\"a\" & 'b'</b>"),
        "&lt;b&gt;&quot;a&quot; &amp; 'b'&lt;/b&gt;"
    );
    assert_eq!(render::html_escape("plain"), "plain");
}

#[test]
fn page_shell_splices_head_and_footer() {
    let pool = test_pool();
    Setting::set(&pool, inject::GLOBAL_HEADER_CODE, "<script>A</script>").unwrap();
    Setting::set(&pool, inject::GLOBAL_FOOTER_CODE, "<style>B</style>").unwrap();

    let html = render::page_shell(&pool, "Title", "    <p>hi</p>\n", None);
    assert!(html.contains("<script>A</script>\n</head>"));
    assert!(html.contains("<style>B</style>\n</body>"));
    // Header code does not leak into the body region
    assert_eq!(html.matches("<script>A</script>").count(), 1);
}

#[test]
fn page_shell_unchanged_when_nothing_configured() {
    let pool = test_pool();
    let pristine = render::page_shell(&pool, "T", "", None);

    Setting::set(&pool, inject::GLOBAL_HEADER_CODE, "<script>A</script>").unwrap();
    let with_code = render::page_shell(&pool, "T", "", None);
    assert_ne!(pristine, with_code);

    Setting::delete(&pool, inject::GLOBAL_HEADER_CODE).unwrap();
    let cleared = render::page_shell(&pool, "T", "", None);
    assert_eq!(pristine, cleared);
}

#[test]
fn page_shell_escapes_title() {
    let pool = test_pool();
    let html = render::page_shell(&pool, "A <b>bold</b> title", "", None);
    assert!(html.contains("<title>A &lt;b&gt;bold&lt;/b&gt; title</title>"));
}

#[test]
fn item_page_injects_item_code() {
    let pool = test_pool();
    let id = make_item(&pool, "page", "About", "about", "published");
    ItemMeta::set(&pool, id, inject::ITEM_HEADER_CODE, "<script>page-only</script>").unwrap();
    let item = ContentItem::find_by_id(&pool, id).unwrap();

    let html = render::item_page(&pool, &item);
    assert!(html.contains("<script>page-only</script>\n</head>"));

    // The same code never appears on the home page
    let home = render::home_page(&pool, &[]);
    assert!(!home.contains("page-only"));
}

#[test]
fn item_page_head_order_global_then_item() {
    let pool = test_pool();
    Setting::set(&pool, inject::GLOBAL_HEADER_CODE, "<script>A</script>").unwrap();
    let id = make_item(&pool, "page", "Landing", "landing", "published");
    ItemMeta::set(&pool, id, inject::ITEM_HEADER_CODE, "<style>B</style>").unwrap();
    let item = ContentItem::find_by_id(&pool, id).unwrap();

    // Global code first, then the item's, both ending the head region
    let html = render::item_page(&pool, &item);
    assert!(html.contains("<script>A</script>\n<style>B</style>\n</head>"));
    // Nothing was configured for the footer region
    assert!(html.contains("</footer>\n</body>"));
}

#[test]
fn item_page_disabled_type_renders_clean() {
    let pool = test_pool();
    let id = make_item(&pool, "post", "Post", "post-1", "published");
    ItemMeta::set(&pool, id, inject::ITEM_HEADER_CODE, "<script>hidden</script>").unwrap();
    let item = ContentItem::find_by_id(&pool, id).unwrap();

    // Posts are disabled by default: the stored code stays dormant
    let html = render::item_page(&pool, &item);
    assert!(!html.contains("hidden"));
}

#[test]
fn home_page_lists_posts() {
    let pool = test_pool();
    make_item(&pool, "post", "First & Last", "first", "published");
    let posts = ContentItem::published(&pool, "post", 10, 0);

    let html = render::home_page(&pool, &posts);
    assert!(html.contains("href=\"/posts/first\""));
    assert!(html.contains("First &amp; Last"));

    let empty = render::home_page(&pool, &[]);
    assert!(empty.contains("No posts yet."));
}

// ═══════════════════════════════════════════════════════════
// In-memory RateLimiter
// ═══════════════════════════════════════════════════════════

#[test]
fn rate_limiter_basic() {
    let rl = RateLimiter::new();
    let window = std::time::Duration::from_secs(60);

    assert!(rl.check_and_record("login:1.2.3.4", 3, window));
    assert!(rl.check_and_record("login:1.2.3.4", 3, window));
    assert!(rl.check_and_record("login:1.2.3.4", 3, window));
    // 4th should be blocked
    assert!(!rl.check_and_record("login:1.2.3.4", 3, window));

    // Different key is independent
    assert!(rl.check_and_record("login:5.6.7.8", 3, window));
}

#[test]
fn rate_limiter_cleanup() {
    let rl = RateLimiter::new();
    let window = std::time::Duration::from_secs(60);

    assert!(rl.check_and_record("a", 1, window));
    assert!(!rl.check_and_record("a", 1, window));

    // Cleanup with zero max_age drops the key, so the next attempt passes
    rl.cleanup(std::time::Duration::from_secs(0));
    assert!(rl.check_and_record("a", 1, window));
}
