use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::response::content::RawHtml;
use rocket::response::Redirect;
use rocket::State;
use serde::Deserialize;
use std::sync::Arc;

use crate::admin_ui;
use crate::db::DbPool;
use crate::models::settings::Setting;
use crate::rate_limit::RateLimiter;
use crate::security::auth::{self, ClientIp};
use crate::AdminSlug;

#[derive(Debug, FromForm, Deserialize)]
pub struct LoginForm {
    pub password: String,
}

#[get("/login")]
pub fn login_page(pool: &State<DbPool>, admin_slug: &State<AdminSlug>) -> RawHtml<String> {
    RawHtml(admin_ui::login_page(pool, &admin_slug.0, None))
}

#[post("/login", data = "<form>")]
pub fn login_submit(
    form: Form<LoginForm>,
    pool: &State<DbPool>,
    admin_slug: &State<AdminSlug>,
    limiter: &State<Arc<RateLimiter>>,
    ip: ClientIp,
    cookies: &CookieJar<'_>,
) -> Result<Redirect, RawHtml<String>> {
    let ip_hash = auth::hash_ip(&ip.0);
    let rate_key = format!("login:{}", ip_hash);
    let max_attempts = Setting::get_i64(pool, "login_rate_limit").max(1) as u64;
    let window = std::time::Duration::from_secs(15 * 60);

    // Check rate limit before touching the password hash
    if !limiter.check_and_record(&rate_key, max_attempts, window) {
        return Err(RawHtml(admin_ui::login_page(
            pool,
            &admin_slug.0,
            Some("Too many login attempts. Please try again in 15 minutes."),
        )));
    }

    let stored_hash = Setting::get(pool, "admin_password_hash").unwrap_or_default();
    if !auth::verify_password(&form.password, &stored_hash) {
        return Err(RawHtml(admin_ui::login_page(
            pool,
            &admin_slug.0,
            Some("Invalid credentials"),
        )));
    }

    match auth::create_session(pool, Some(&ip_hash), None) {
        Ok(session_id) => {
            auth::set_session_cookie(cookies, &session_id);
            Ok(Redirect::to(format!("/{}", admin_slug.0)))
        }
        Err(_) => Err(RawHtml(admin_ui::login_page(
            pool,
            &admin_slug.0,
            Some("Session creation failed"),
        ))),
    }
}

#[get("/logout")]
pub fn logout(
    pool: &State<DbPool>,
    admin_slug: &State<AdminSlug>,
    cookies: &CookieJar<'_>,
) -> Redirect {
    if let Some(session_id) = auth::session_cookie(cookies) {
        let _ = auth::destroy_session(pool, &session_id);
    }
    auth::clear_session_cookie(cookies);
    Redirect::to(format!("/{}/login", admin_slug.0))
}

/// Catch-all for any /<admin_slug>/* route that failed the AdminUser guard.
/// This fires when the guard returns Forward(Unauthorized).
#[get("/<_path..>", rank = 99)]
pub fn admin_redirect_to_login(
    _path: std::path::PathBuf,
    admin_slug: &State<AdminSlug>,
) -> Redirect {
    Redirect::to(format!("/{}/login", admin_slug.0))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![login_page, login_submit, logout, admin_redirect_to_login]
}
