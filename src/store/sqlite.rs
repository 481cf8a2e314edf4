use std::collections::HashMap;

use rusqlite::params;

use crate::db::DbPool;
use crate::models::comment::{Comment, CommentForm};
use crate::models::favorite::Favorite;
use crate::models::otp::EmailOtp;
use crate::models::reciter::{Reciter, ReciterForm};
use crate::models::request::{ReciterRequest, RequestForm};
use crate::models::settings::Setting;
use crate::models::user::User;
use crate::ranking::FavoriteTally;

use super::Store;

/// SQLite-backed implementation of the Store trait.
/// Wraps the r2d2 connection pool and delegates to model methods.
pub struct SqliteStore {
    pub pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn new_at(path: &str) -> Result<Self, String> {
        let pool = crate::db::init_pool_at(path).map_err(|e| e.to_string())?;
        Ok(Self { pool })
    }
}

impl Store for SqliteStore {
    // ── Lifecycle ───────────────────────────────────────────────────

    fn run_migrations(&self) -> Result<(), String> {
        crate::db::run_migrations(&self.pool).map_err(|e| e.to_string())
    }

    fn seed_defaults(&self) -> Result<(), String> {
        crate::db::seed_defaults(&self.pool).map_err(|e| e.to_string())
    }

    // ── Settings ────────────────────────────────────────────────────

    fn setting_get(&self, key: &str) -> Option<String> {
        Setting::get(&self.pool, key)
    }

    fn setting_set(&self, key: &str, value: &str) -> Result<(), String> {
        Setting::set(&self.pool, key, value)
    }

    fn setting_all(&self) -> HashMap<String, String> {
        Setting::all(&self.pool)
    }

    // ── Users ───────────────────────────────────────────────────────

    fn user_get_by_id(&self, id: i64) -> Option<User> {
        User::get_by_id(&self.pool, id)
    }

    fn user_get_by_email(&self, email: &str) -> Option<User> {
        User::get_by_email(&self.pool, email)
    }

    fn user_count(&self) -> i64 {
        User::count(&self.pool)
    }

    fn user_create(
        &self,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<i64, String> {
        User::create(&self.pool, email, password_hash, first_name, last_name)
    }

    fn user_update_names(&self, id: i64, first_name: &str, last_name: &str) -> Result<(), String> {
        User::update_names(&self.pool, id, first_name, last_name)
    }

    fn user_update_avatar(&self, id: i64, avatar_url: &str) -> Result<(), String> {
        User::update_avatar(&self.pool, id, avatar_url)
    }

    fn user_delete(&self, id: i64) -> Result<(), String> {
        User::delete(&self.pool, id)
    }

    // ── Sessions ────────────────────────────────────────────────────

    fn session_create(&self, user_id: i64, token: &str, expires_at: &str) -> Result<(), String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES (?1, ?2, datetime('now'), ?3)",
            params![token, user_id, expires_at],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn session_get_user(&self, token: &str) -> Option<User> {
        let conn = self.pool.get().ok()?;
        let cols = User::SELECT_COLS
            .split(", ")
            .map(|c| format!("p.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        conn.query_row(
            &format!(
                "SELECT {} FROM sessions s JOIN profiles p ON p.id = s.user_id
                 WHERE s.id = ?1 AND s.expires_at > datetime('now')",
                cols
            ),
            params![token],
            User::from_row,
        )
        .ok()
    }

    fn session_delete(&self, token: &str) -> Result<(), String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![token])
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn session_cleanup_expired(&self) -> usize {
        match self.pool.get() {
            Ok(conn) => conn
                .execute("DELETE FROM sessions WHERE expires_at <= datetime('now')", [])
                .unwrap_or(0),
            Err(_) => 0,
        }
    }

    // ── Signup codes ────────────────────────────────────────────────

    fn otp_create(
        &self,
        email: &str,
        otp: &str,
        first_name: &str,
        last_name: &str,
        ttl_minutes: i64,
    ) -> Result<i64, String> {
        EmailOtp::create(&self.pool, email, otp, first_name, last_name, ttl_minutes)
    }

    fn otp_consume(&self, email: &str, otp: &str) -> Option<EmailOtp> {
        EmailOtp::consume(&self.pool, email, otp)
    }

    fn otp_cleanup(&self) -> Result<usize, String> {
        EmailOtp::cleanup(&self.pool)
    }

    // ── Reciters ────────────────────────────────────────────────────

    fn reader_find_by_id(&self, id: i64) -> Option<Reciter> {
        Reciter::find_by_id(&self.pool, id)
    }

    fn reader_list(&self, limit: i64, offset: i64) -> Vec<Reciter> {
        Reciter::list(&self.pool, limit, offset)
    }

    fn reader_latest(&self, n: i64) -> Vec<Reciter> {
        Reciter::latest(&self.pool, n)
    }

    fn reader_search(&self, term: &str) -> Vec<Reciter> {
        Reciter::search(&self.pool, term)
    }

    fn reader_count(&self) -> i64 {
        Reciter::count(&self.pool)
    }

    fn reader_count_since_days(&self, days: i64) -> i64 {
        Reciter::count_since_days(&self.pool, days)
    }

    fn reader_create(&self, form: &ReciterForm) -> Result<i64, String> {
        Reciter::create(&self.pool, form)
    }

    fn reader_update(&self, id: i64, form: &ReciterForm) -> Result<(), String> {
        Reciter::update(&self.pool, id, form)
    }

    fn reader_delete(&self, id: i64) -> Result<bool, String> {
        Reciter::delete(&self.pool, id)
    }

    // ── Favorites ───────────────────────────────────────────────────

    fn favorite_ids_for_user(&self, user_id: i64) -> Vec<i64> {
        Favorite::ids_for_user(&self.pool, user_id)
    }

    fn favorite_exists(&self, user_id: i64, reader_id: i64) -> bool {
        Favorite::exists(&self.pool, user_id, reader_id)
    }

    fn favorite_toggle(&self, user_id: i64, reader_id: i64) -> Result<bool, String> {
        Favorite::toggle(&self.pool, user_id, reader_id)
    }

    fn favorite_count(&self) -> i64 {
        Favorite::count(&self.pool)
    }

    fn favorite_tallies(&self) -> Vec<FavoriteTally> {
        Favorite::tallies(&self.pool)
    }

    // ── Requests ────────────────────────────────────────────────────

    fn request_find_by_id(&self, id: i64) -> Option<ReciterRequest> {
        ReciterRequest::find_by_id(&self.pool, id)
    }

    fn request_list(&self) -> Vec<ReciterRequest> {
        ReciterRequest::list(&self.pool)
    }

    fn request_count(&self) -> i64 {
        ReciterRequest::count(&self.pool)
    }

    fn request_create(&self, form: &RequestForm) -> Result<i64, String> {
        ReciterRequest::create(&self.pool, form)
    }

    fn request_delete(&self, id: i64) -> Result<bool, String> {
        ReciterRequest::delete(&self.pool, id)
    }

    fn request_approve(&self, id: i64, default_image: &str) -> Result<Option<i64>, String> {
        ReciterRequest::approve(&self.pool, id, default_image)
    }

    // ── Comments ────────────────────────────────────────────────────

    fn comment_find_by_id(&self, id: i64) -> Option<Comment> {
        Comment::find_by_id(&self.pool, id)
    }

    fn comment_list(&self, limit: i64, offset: i64) -> Vec<Comment> {
        Comment::list(&self.pool, limit, offset)
    }

    fn comment_latest(&self, n: i64) -> Vec<Comment> {
        Comment::latest(&self.pool, n)
    }

    fn comment_count(&self) -> i64 {
        Comment::count(&self.pool)
    }

    fn comment_create(&self, user_id: Option<i64>, form: &CommentForm) -> Result<i64, String> {
        Comment::create(&self.pool, user_id, form)
    }

    fn comment_delete(&self, id: i64) -> Result<(), String> {
        Comment::delete(&self.pool, id)
    }
}
