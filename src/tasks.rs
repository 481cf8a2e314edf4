use rocket::fairing::{Fairing, Info, Kind};
use rocket::tokio;
use rocket::{Orbit, Rocket};
use std::sync::Arc;
use std::time::Duration;

use crate::store::Store;

/// Periodic housekeeping started once the server is up.
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
        let store = match rocket.state::<Arc<dyn Store>>() {
            Some(s) => s.clone(),
            None => {
                log::error!("[task] Store not found in managed state, tasks not started");
                return;
            }
        };

        // Expired session cleanup
        let s = Arc::clone(&store);
        tokio::spawn(async move {
            loop {
                let interval = get_interval(&*s, "task_session_cleanup_interval", 30);
                tokio::time::sleep(period(interval)).await;
                let count = crate::security::auth::cleanup_expired_sessions(&*s);
                if count > 0 {
                    log::info!("[task] Cleaned up {} expired sessions", count);
                }
            }
        });

        // Used/expired signup code cleanup
        let s = Arc::clone(&store);
        tokio::spawn(async move {
            loop {
                let interval = get_interval(&*s, "task_otp_cleanup_interval", 60);
                tokio::time::sleep(period(interval)).await;
                match s.otp_cleanup() {
                    Ok(count) => {
                        if count > 0 {
                            log::info!("[task] Cleaned up {} signup codes", count);
                        }
                    }
                    Err(e) => log::error!("[task] Signup code cleanup failed: {}", e),
                }
            }
        });

        log::info!("[task] Background tasks started");
    }
}

fn get_interval(store: &dyn Store, key: &str, default: u64) -> u64 {
    store
        .setting_get_or(key, &default.to_string())
        .parse::<u64>()
        .unwrap_or(default)
        .max(1)
}

/// Sleep between runs for an interval given in minutes.
fn period(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_is_minutes() {
        assert_eq!(period(30), Duration::from_secs(1800));
    }

    #[test]
    fn huge_interval_saturates() {
        assert_eq!(period(u64::MAX), Duration::from_secs(u64::MAX));
    }
}
