use std::collections::HashMap;

use crate::models::comment::{Comment, CommentForm};
use crate::models::otp::EmailOtp;
use crate::models::reciter::{Reciter, ReciterForm};
use crate::models::request::{ReciterRequest, RequestForm};
use crate::models::user::User;
use crate::ranking::FavoriteTally;

pub mod sqlite;

/// Unified data-access trait. Every database operation goes through here.
/// Implementation: `SqliteStore` (wraps rusqlite/r2d2).
pub trait Store: Send + Sync {
    // ── Lifecycle ───────────────────────────────────────────────────
    fn run_migrations(&self) -> Result<(), String>;
    fn seed_defaults(&self) -> Result<(), String>;

    // ── Settings ────────────────────────────────────────────────────
    fn setting_get(&self, key: &str) -> Option<String>;
    fn setting_get_or(&self, key: &str, default: &str) -> String {
        self.setting_get(key).unwrap_or_else(|| default.to_string())
    }
    fn setting_get_bool(&self, key: &str) -> bool {
        self.setting_get(key)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false)
    }
    fn setting_get_i64(&self, key: &str) -> i64 {
        self.setting_get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
    fn setting_set(&self, key: &str, value: &str) -> Result<(), String>;
    fn setting_all(&self) -> HashMap<String, String>;

    // ── Users ───────────────────────────────────────────────────────
    fn user_get_by_id(&self, id: i64) -> Option<User>;
    fn user_get_by_email(&self, email: &str) -> Option<User>;
    fn user_count(&self) -> i64;
    fn user_create(
        &self,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<i64, String>;
    fn user_update_names(&self, id: i64, first_name: &str, last_name: &str) -> Result<(), String>;
    fn user_update_avatar(&self, id: i64, avatar_url: &str) -> Result<(), String>;
    fn user_delete(&self, id: i64) -> Result<(), String>;

    // ── Sessions ────────────────────────────────────────────────────
    fn session_create(&self, user_id: i64, token: &str, expires_at: &str) -> Result<(), String>;
    /// The user behind a live session, resolved in one query.
    fn session_get_user(&self, token: &str) -> Option<User>;
    fn session_delete(&self, token: &str) -> Result<(), String>;
    fn session_cleanup_expired(&self) -> usize;

    // ── Signup codes ────────────────────────────────────────────────
    fn otp_create(
        &self,
        email: &str,
        otp: &str,
        first_name: &str,
        last_name: &str,
        ttl_minutes: i64,
    ) -> Result<i64, String>;
    fn otp_consume(&self, email: &str, otp: &str) -> Option<EmailOtp>;
    fn otp_cleanup(&self) -> Result<usize, String>;

    // ── Reciters ────────────────────────────────────────────────────
    fn reader_find_by_id(&self, id: i64) -> Option<Reciter>;
    fn reader_list(&self, limit: i64, offset: i64) -> Vec<Reciter>;
    fn reader_latest(&self, n: i64) -> Vec<Reciter>;
    fn reader_search(&self, term: &str) -> Vec<Reciter>;
    fn reader_count(&self) -> i64;
    fn reader_count_since_days(&self, days: i64) -> i64;
    fn reader_create(&self, form: &ReciterForm) -> Result<i64, String>;
    fn reader_update(&self, id: i64, form: &ReciterForm) -> Result<(), String>;
    fn reader_delete(&self, id: i64) -> Result<bool, String>;

    // ── Favorites ───────────────────────────────────────────────────
    fn favorite_ids_for_user(&self, user_id: i64) -> Vec<i64>;
    fn favorite_exists(&self, user_id: i64, reader_id: i64) -> bool;
    fn favorite_toggle(&self, user_id: i64, reader_id: i64) -> Result<bool, String>;
    fn favorite_count(&self) -> i64;
    fn favorite_tallies(&self) -> Vec<FavoriteTally>;

    // ── Requests ────────────────────────────────────────────────────
    fn request_find_by_id(&self, id: i64) -> Option<ReciterRequest>;
    fn request_list(&self) -> Vec<ReciterRequest>;
    fn request_count(&self) -> i64;
    fn request_create(&self, form: &RequestForm) -> Result<i64, String>;
    fn request_delete(&self, id: i64) -> Result<bool, String>;
    /// `Ok(Some(reader_id))` on approval, `Ok(None)` when the request is gone.
    fn request_approve(&self, id: i64, default_image: &str) -> Result<Option<i64>, String>;

    // ── Comments ────────────────────────────────────────────────────
    fn comment_find_by_id(&self, id: i64) -> Option<Comment>;
    fn comment_list(&self, limit: i64, offset: i64) -> Vec<Comment>;
    fn comment_latest(&self, n: i64) -> Vec<Comment>;
    fn comment_count(&self) -> i64;
    fn comment_create(&self, user_id: Option<i64>, form: &CommentForm) -> Result<i64, String>;
    fn comment_delete(&self, id: i64) -> Result<(), String>;
}
