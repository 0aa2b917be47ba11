use rocket::fairing::{Fairing, Info, Kind};
use rocket::tokio;
use rocket::{Orbit, Rocket};
use std::sync::Arc;
use std::time::Duration;

use crate::db::DbPool;
use crate::models::settings::Setting;
use crate::rate_limit::RateLimiter;
use crate::security::auth;

pub struct BackgroundTasks;

#[rocket::async_trait]
impl Fairing for BackgroundTasks {
    fn info(&self) -> Info {
        Info {
            name: "Background Tasks",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let pool = rocket
            .state::<DbPool>()
            .expect("DbPool not found in managed state")
            .clone();
        let limiter = rocket
            .state::<Arc<RateLimiter>>()
            .expect("RateLimiter not found in managed state")
            .clone();

        // Session cleanup task
        let p = pool.clone();
        tokio::spawn(async move {
            loop {
                let interval = get_interval(&p, "task_session_cleanup_interval", 30);
                tokio::time::sleep(Duration::from_secs(interval * 60)).await;
                match auth::cleanup_expired_sessions(&p) {
                    Ok(count) => {
                        if count > 0 {
                            log::info!("[task] Cleaned up {} expired sessions", count);
                        }
                    }
                    Err(e) => log::error!("[task] Session cleanup failed: {}", e),
                }
            }
        });

        // Rate limiter sweep, hourly
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(60 * 60)).await;
                limiter.cleanup(Duration::from_secs(60 * 60));
            }
        });

        log::info!("[task] Background tasks started");
    }
}

fn get_interval(pool: &DbPool, key: &str, default: u64) -> u64 {
    let v = Setting::get_i64(pool, key);
    let minutes = if v <= 0 { default } else { v as u64 };
    minutes.max(1)
}
