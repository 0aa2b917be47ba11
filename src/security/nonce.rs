use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::DbPool;
use crate::models::settings::Setting;

type HmacSha256 = Hmac<Sha256>;

/// Tokens rotate every 12 hours and the previous window stays valid, so a
/// freshly issued token is accepted for at least 12 and at most 24 hours.
const TICK_SECS: u64 = 12 * 60 * 60;

/// HMAC key for the admin API anti-forgery tokens, loaded once at startup
/// so verification never touches the database.
pub struct NonceKey(pub String);

impl NonceKey {
    pub fn load(pool: &DbPool) -> NonceKey {
        NonceKey(Setting::get_or(pool, "nonce_secret", ""))
    }
}

/// Which tool a token authorizes. A token for one action never validates
/// for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Migration,
    DataTools,
}

impl Action {
    fn scope(self) -> &'static str {
        match self {
            Action::Migration => "inject_migration",
            Action::DataTools => "inject_data_tools",
        }
    }
}

pub(crate) fn current_tick() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
        / TICK_SECS
}

pub(crate) fn sign(key: &NonceKey, tick: u64, action: Action, session_id: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(key.0.as_bytes()).expect("HMAC can take key of any size");
    mac.update(format!("{}|{}|{}", tick, action.scope(), session_id).as_bytes());
    let result = mac.finalize().into_bytes();
    // First 8 bytes (16 hex chars) for a compact but secure token
    hex::encode(&result[..8])
}

/// Issues a token bound to the given action and session for the current tick.
pub fn issue(key: &NonceKey, action: Action, session_id: &str) -> String {
    sign(key, current_tick(), action, session_id)
}

/// Accepts tokens signed in the current or the previous tick.
pub fn verify(key: &NonceKey, action: Action, session_id: &str, token: &str) -> bool {
    let tick = current_tick();
    for t in [tick, tick.saturating_sub(1)] {
        let expected = sign(key, t, action, session_id);
        if token.len() == expected.len()
            && super::constant_time_eq(token.as_bytes(), expected.as_bytes())
        {
            return true;
        }
    }
    false
}
