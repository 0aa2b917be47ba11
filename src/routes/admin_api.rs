use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::data_tools;
use crate::db::DbPool;
use crate::migration::{self, Scope};
use crate::models::item::ItemType;
use crate::security::auth::AdminUser;
use crate::security::nonce::{self, Action, NonceKey};

#[derive(Debug, Deserialize)]
pub struct ScopedRequest {
    #[serde(rename = "type")]
    kind: String,
    nonce: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(rename = "type")]
    kind: String,
    offset: i64,
    limit: i64,
    nonce: String,
}

#[derive(Debug, Deserialize)]
pub struct GlobalRequest {
    nonce: String,
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({"success": true, "data": data}))
}

fn fail(message: &str) -> Json<Value> {
    Json(json!({"success": false, "message": message}))
}

#[post("/detect-legacy", format = "json", data = "<body>")]
pub fn detect_legacy(
    admin: AdminUser,
    pool: &State<DbPool>,
    key: &State<NonceKey>,
    body: Json<ScopedRequest>,
) -> Json<Value> {
    if !nonce::verify(key, Action::Migration, &admin.session_id, &body.nonce) {
        return fail("Invalid security token");
    }
    let scope = match Scope::parse(&body.kind) {
        Some(s) => s,
        None => return fail("Invalid type"),
    };
    match migration::detect(pool, scope) {
        Ok(data) => ok(data),
        Err(msg) => fail(&msg),
    }
}

#[post("/migrate-legacy", format = "json", data = "<body>")]
pub fn migrate_legacy(
    admin: AdminUser,
    pool: &State<DbPool>,
    key: &State<NonceKey>,
    body: Json<ScopedRequest>,
) -> Json<Value> {
    if !nonce::verify(key, Action::Migration, &admin.session_id, &body.nonce) {
        return fail("Invalid security token");
    }
    let scope = match Scope::parse(&body.kind) {
        Some(s) => s,
        None => return fail("Invalid type"),
    };
    match migration::migrate(pool, scope) {
        Ok(data) => ok(data),
        Err(msg) => fail(&msg),
    }
}

#[post("/usage-report", format = "json", data = "<body>")]
pub fn usage_report(
    admin: AdminUser,
    pool: &State<DbPool>,
    key: &State<NonceKey>,
    body: Json<ScopedRequest>,
) -> Json<Value> {
    if !nonce::verify(key, Action::DataTools, &admin.session_id, &body.nonce) {
        return fail("Invalid security token");
    }
    let item_type = match ItemType::parse(&body.kind) {
        Some(t) => t,
        None => return fail("Invalid type"),
    };
    ok(data_tools::usage_report(pool, item_type))
}

#[post("/delete-count", format = "json", data = "<body>")]
pub fn delete_count(
    admin: AdminUser,
    pool: &State<DbPool>,
    key: &State<NonceKey>,
    body: Json<ScopedRequest>,
) -> Json<Value> {
    if !nonce::verify(key, Action::DataTools, &admin.session_id, &body.nonce) {
        return fail("Invalid security token");
    }
    let item_type = match ItemType::parse(&body.kind) {
        Some(t) => t,
        None => return fail("Invalid type"),
    };
    ok(json!({"count": data_tools::count(pool, item_type)}))
}

#[post("/delete-batch", format = "json", data = "<body>")]
pub fn delete_batch(
    admin: AdminUser,
    pool: &State<DbPool>,
    key: &State<NonceKey>,
    body: Json<BatchRequest>,
) -> Json<Value> {
    if !nonce::verify(key, Action::DataTools, &admin.session_id, &body.nonce) {
        return fail("Invalid security token");
    }
    let item_type = match ItemType::parse(&body.kind) {
        Some(t) => t,
        None => return fail("Invalid type"),
    };
    match data_tools::delete_batch(pool, item_type, body.limit, body.offset) {
        Ok(deleted) => ok(json!({"deleted": deleted})),
        Err(msg) => fail(&msg),
    }
}

#[post("/delete-global", format = "json", data = "<body>")]
pub fn delete_global(
    admin: AdminUser,
    pool: &State<DbPool>,
    key: &State<NonceKey>,
    body: Json<GlobalRequest>,
) -> Json<Value> {
    if !nonce::verify(key, Action::DataTools, &admin.session_id, &body.nonce) {
        return fail("Invalid security token");
    }
    match data_tools::delete_global(pool) {
        Ok(data) => ok(data),
        Err(msg) => fail(&msg),
    }
}

// Fires when the AdminUser guard forwards, so unauthenticated API calls
// get a JSON envelope instead of the HTML login redirect.
#[catch(401)]
pub fn unauthorized() -> Json<Value> {
    Json(json!({"success": false, "message": "Insufficient permissions"}))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        detect_legacy,
        migrate_legacy,
        usage_report,
        delete_count,
        delete_batch,
        delete_global,
    ]
}
