use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

/// An account profile. `role` is the only authorization signal.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub role: String, // admin, user
    pub created_at: String,
}

impl User {
    pub(crate) fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            avatar_url: row.get(5)?,
            role: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    pub(crate) const SELECT_COLS: &'static str =
        "id, email, password_hash, first_name, last_name, avatar_url, role, created_at";

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }

    /// Template-safe view of the user.
    pub fn safe_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "email": self.email,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "display_name": self.display_name(),
            "avatar_url": self.avatar_url,
            "role": self.role,
            "is_admin": self.is_admin(),
        })
    }

    // ── Lookups ──

    pub fn get_by_id(pool: &DbPool, id: i64) -> Option<User> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} FROM profiles WHERE id = ?1", Self::SELECT_COLS),
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn get_by_email(pool: &DbPool, email: &str) -> Option<User> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} FROM profiles WHERE email = ?1", Self::SELECT_COLS),
            params![email.trim().to_lowercase()],
            Self::from_row,
        )
        .ok()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))
            .unwrap_or(0)
    }

    // ── Create ──

    /// Creates an account. The very first account becomes the admin.
    pub fn create(
        pool: &DbPool,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO profiles (email, password_hash, first_name, last_name, role)
             VALUES (?1, ?2, ?3, ?4,
                     CASE WHEN EXISTS (SELECT 1 FROM profiles) THEN 'user' ELSE 'admin' END)",
            params![
                email.trim().to_lowercase(),
                password_hash,
                first_name.trim(),
                last_name.trim()
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    // ── Update ──

    pub fn update_names(pool: &DbPool, id: i64, first_name: &str, last_name: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE profiles SET first_name = ?1, last_name = ?2 WHERE id = ?3",
            params![first_name.trim(), last_name.trim(), id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn update_avatar(pool: &DbPool, id: i64, avatar_url: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE profiles SET avatar_url = ?1 WHERE id = ?2",
            params![avatar_url, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    // ── Delete ──

    /// Deletes the profile with its sessions and favorites; authored
    /// comments stay, detached from the account.
    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let mut conn = pool.get().map_err(|e| e.to_string())?;
        let tx = conn.transaction().map_err(|e| e.to_string())?;
        tx.execute("DELETE FROM sessions WHERE user_id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        tx.execute("DELETE FROM favorites WHERE user_id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        tx.execute("UPDATE comments SET user_id = NULL WHERE user_id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        tx.execute("DELETE FROM profiles WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        tx.commit().map_err(|e| e.to_string())?;
        Ok(())
    }
}
