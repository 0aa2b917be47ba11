use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::content::RawHtml;
use rocket::response::{Flash, Redirect};
use rocket::State;
use std::collections::HashMap;

use crate::admin_ui;
use crate::db::DbPool;
use crate::inject;
use crate::models::item::{ContentItem, ItemForm, ItemType};
use crate::models::settings::Setting;
use crate::security::auth::{self, AdminUser};
use crate::security::nonce::{self, Action, NonceKey};
use crate::AdminSlug;

// Path segments the admin slug may not shadow.
const RESERVED_SLUGS: &[&str] = &["posts", "pages", "login", "logout", "api", "items"];

fn notice_of<'a>(flash: &'a Option<FlashMessage<'_>>) -> Option<(&'a str, &'a str)> {
    flash.as_ref().map(|f| (f.kind(), f.message()))
}

// ── Dashboard ──────────────────────────────────────────

#[get("/")]
pub fn dashboard(
    _admin: AdminUser,
    pool: &State<DbPool>,
    admin_slug: &State<AdminSlug>,
) -> RawHtml<String> {
    RawHtml(admin_ui::dashboard(pool, &admin_slug.0))
}

// ── Content items ──────────────────────────────────────

#[get("/posts")]
pub fn posts_list(
    _admin: AdminUser,
    pool: &State<DbPool>,
    admin_slug: &State<AdminSlug>,
    flash: Option<FlashMessage<'_>>,
) -> RawHtml<String> {
    let items = ContentItem::list(pool, Some("post"), 500, 0);
    RawHtml(admin_ui::items_list(
        pool,
        &admin_slug.0,
        ItemType::Post,
        &items,
        notice_of(&flash),
    ))
}

#[get("/pages")]
pub fn pages_list(
    _admin: AdminUser,
    pool: &State<DbPool>,
    admin_slug: &State<AdminSlug>,
    flash: Option<FlashMessage<'_>>,
) -> RawHtml<String> {
    let items = ContentItem::list(pool, Some("page"), 500, 0);
    RawHtml(admin_ui::items_list(
        pool,
        &admin_slug.0,
        ItemType::Page,
        &items,
        notice_of(&flash),
    ))
}

#[get("/items/new?<item_type>")]
pub fn item_new(
    _admin: AdminUser,
    pool: &State<DbPool>,
    admin_slug: &State<AdminSlug>,
    item_type: Option<String>,
) -> Option<RawHtml<String>> {
    let item_type = ItemType::parse(item_type.as_deref().unwrap_or("post"))?;
    Some(RawHtml(admin_ui::item_form(
        pool,
        &admin_slug.0,
        item_type,
        None,
        None,
    )))
}

#[post("/items", data = "<form>")]
pub fn item_create(
    _admin: AdminUser,
    pool: &State<DbPool>,
    admin_slug: &State<AdminSlug>,
    form: Form<ItemForm>,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let form = form.into_inner();
    let list_path = match form.item_type.as_str() {
        "page" => format!("/{}/pages", admin_slug.0),
        _ => format!("/{}/posts", admin_slug.0),
    };
    if ItemType::parse(&form.item_type).is_none() {
        return Err(Flash::error(Redirect::to(list_path), "Invalid item type"));
    }
    if form.title.trim().is_empty() {
        return Err(Flash::error(Redirect::to(list_path), "Title is required"));
    }

    match ContentItem::create(pool, &form) {
        Ok(id) => {
            if let Err(e) =
                inject::save_item_code(pool, id, form.header_code.as_deref(), form.footer_code.as_deref())
            {
                return Err(Flash::error(Redirect::to(list_path), e));
            }
            Ok(Flash::success(
                Redirect::to(format!("/{}/items/{}/edit", admin_slug.0, id)),
                "Saved",
            ))
        }
        Err(e) => Err(Flash::error(Redirect::to(list_path), e)),
    }
}

#[get("/items/<id>/edit")]
pub fn item_edit(
    _admin: AdminUser,
    pool: &State<DbPool>,
    admin_slug: &State<AdminSlug>,
    id: i64,
    flash: Option<FlashMessage<'_>>,
) -> Option<RawHtml<String>> {
    let item = ContentItem::find_by_id(pool, id)?;
    let item_type = ItemType::parse(&item.item_type)?;
    Some(RawHtml(admin_ui::item_form(
        pool,
        &admin_slug.0,
        item_type,
        Some(&item),
        notice_of(&flash),
    )))
}

#[post("/items/<id>", data = "<form>")]
pub fn item_update(
    _admin: AdminUser,
    pool: &State<DbPool>,
    admin_slug: &State<AdminSlug>,
    id: i64,
    form: Form<ItemForm>,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let form = form.into_inner();
    let edit_path = format!("/{}/items/{}/edit", admin_slug.0, id);
    if form.title.trim().is_empty() {
        return Err(Flash::error(Redirect::to(edit_path), "Title is required"));
    }

    if let Err(e) = ContentItem::update(pool, id, &form) {
        return Err(Flash::error(Redirect::to(edit_path), e));
    }
    if let Err(e) =
        inject::save_item_code(pool, id, form.header_code.as_deref(), form.footer_code.as_deref())
    {
        return Err(Flash::error(Redirect::to(edit_path), e));
    }
    Ok(Flash::success(Redirect::to(edit_path), "Saved"))
}

#[post("/items/<id>/delete")]
pub fn item_delete(
    _admin: AdminUser,
    pool: &State<DbPool>,
    admin_slug: &State<AdminSlug>,
    id: i64,
) -> Flash<Redirect> {
    let list_path = match ContentItem::find_by_id(pool, id).map(|i| i.item_type) {
        Some(t) if t == "page" => format!("/{}/pages", admin_slug.0),
        _ => format!("/{}/posts", admin_slug.0),
    };
    match ContentItem::delete(pool, id) {
        Ok(()) => Flash::success(Redirect::to(list_path), "Deleted"),
        Err(e) => Flash::error(Redirect::to(list_path), e),
    }
}

// ── Settings ───────────────────────────────────────────

#[get("/settings")]
pub fn settings_page(
    _admin: AdminUser,
    pool: &State<DbPool>,
    admin_slug: &State<AdminSlug>,
    flash: Option<FlashMessage<'_>>,
) -> RawHtml<String> {
    RawHtml(admin_ui::settings_page(pool, &admin_slug.0, notice_of(&flash)))
}

#[post("/settings", data = "<form>")]
pub fn settings_save(
    _admin: AdminUser,
    pool: &State<DbPool>,
    admin_slug: &State<AdminSlug>,
    form: Form<HashMap<String, String>>,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let data = form.into_inner();
    let settings_path = format!("/{}/settings", admin_slug.0);

    let mut errors: Vec<String> = Vec::new();
    if data.get("site_name").map(|v| v.trim().is_empty()).unwrap_or(true) {
        errors.push("Site name is required".to_string());
    }
    if let Some(ppp) = data.get("posts_per_page") {
        if ppp.trim().parse::<i64>().map(|n| n < 1).unwrap_or(true) {
            errors.push("Posts per page must be a positive number".to_string());
        }
    }
    if let Some(slug) = data.get("admin_slug") {
        let slug = slug.trim();
        if slug.is_empty() {
            errors.push("Admin slug cannot be empty".to_string());
        } else if RESERVED_SLUGS.contains(&slug) {
            errors.push(format!("'{}' is reserved and cannot be the admin slug", slug));
        } else if !slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            errors.push("Admin slug may only contain letters, numbers and hyphens".to_string());
        }
    }

    if !errors.is_empty() {
        return Err(Flash::error(Redirect::to(settings_path), errors.join(" | ")));
    }

    // Checkboxes don't submit a value when unchecked, so reset the known
    // boolean keys before applying the form data.
    for key in [inject::ENABLE_FOR_POSTS, inject::ENABLE_FOR_PAGES] {
        let _ = Setting::set(pool, key, "false");
    }

    let slug_changed = data
        .get("admin_slug")
        .map(|s| s.trim() != admin_slug.0)
        .unwrap_or(false);

    if let Err(e) = Setting::set_many(pool, &data) {
        return Err(Flash::error(Redirect::to(settings_path), e));
    }

    let message = if slug_changed {
        "Settings saved. The new admin slug takes effect after a restart."
    } else {
        "Settings saved successfully"
    };
    Ok(Flash::success(Redirect::to(settings_path), message))
}

#[derive(Debug, FromForm)]
pub struct ChangePasswordForm {
    pub new_password: String,
    pub confirm_password: String,
}

#[post("/settings/password", data = "<form>")]
pub fn change_password(
    _admin: AdminUser,
    pool: &State<DbPool>,
    admin_slug: &State<AdminSlug>,
    form: Form<ChangePasswordForm>,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let form = form.into_inner();
    let settings_path = format!("/{}/settings", admin_slug.0);

    if form.new_password.len() < 8 {
        return Err(Flash::error(
            Redirect::to(settings_path),
            "Password must be at least 8 characters.",
        ));
    }
    if form.new_password != form.confirm_password {
        return Err(Flash::error(
            Redirect::to(settings_path),
            "Passwords do not match.",
        ));
    }

    let hash = match auth::hash_password(&form.new_password) {
        Ok(h) => h,
        Err(_) => {
            return Err(Flash::error(
                Redirect::to(settings_path),
                "Failed to hash password.",
            ))
        }
    };
    if let Err(e) = Setting::set(pool, "admin_password_hash", &hash) {
        return Err(Flash::error(Redirect::to(settings_path), e));
    }
    Ok(Flash::success(
        Redirect::to(settings_path),
        "Password updated successfully",
    ))
}

// ── Tools ──────────────────────────────────────────────

#[get("/tools")]
pub fn tools_page(
    admin: AdminUser,
    pool: &State<DbPool>,
    admin_slug: &State<AdminSlug>,
    key: &State<NonceKey>,
) -> RawHtml<String> {
    // Tokens are bound to this admin's session and rotate with the tick
    let migration_nonce = nonce::issue(key, Action::Migration, &admin.session_id);
    let data_tools_nonce = nonce::issue(key, Action::DataTools, &admin.session_id);
    RawHtml(admin_ui::tools_page(
        pool,
        &admin_slug.0,
        &migration_nonce,
        &data_tools_nonce,
    ))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        dashboard,
        posts_list,
        pages_list,
        item_new,
        item_create,
        item_edit,
        item_update,
        item_delete,
        settings_page,
        settings_save,
        change_password,
        tools_page,
    ]
}
