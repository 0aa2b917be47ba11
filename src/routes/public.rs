use rocket::response::content::RawHtml;
use rocket::State;

use crate::db::DbPool;
use crate::models::item::ContentItem;
use crate::models::settings::Setting;
use crate::render;

#[get("/")]
pub fn homepage(pool: &State<DbPool>) -> RawHtml<String> {
    let per_page = Setting::get_i64(pool, "posts_per_page").max(1);
    let posts = ContentItem::published(pool, "post", per_page, 0);
    RawHtml(render::home_page(pool, &posts))
}

#[get("/posts/<slug>")]
pub fn post_single(pool: &State<DbPool>, slug: &str) -> Option<RawHtml<String>> {
    let post = ContentItem::find_by_slug(pool, "post", slug)?;
    if post.status != "published" {
        return None;
    }
    Some(RawHtml(render::item_page(pool, &post)))
}

/// Pages live at the site root. Low rank so fixed routes win.
#[get("/<slug>", rank = 5)]
pub fn page_single(pool: &State<DbPool>, slug: &str) -> Option<RawHtml<String>> {
    let page = ContentItem::find_by_slug(pool, "page", slug)?;
    if page.status != "published" {
        return None;
    }
    Some(RawHtml(render::item_page(pool, &page)))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![homepage, post_single, page_single]
}
