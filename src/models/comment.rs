use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::validation::{self, FormErrors};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Comment {
    pub id: i64,
    pub user_id: Option<i64>,
    pub author_name: String,
    pub body: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromForm)]
pub struct CommentForm {
    pub author_name: String,
    pub body: String,
    /// Hidden field; bots fill it in.
    pub honeypot: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();

        if validation::is_blank(&self.author_name) {
            errors.add("author_name", "err_author_required");
        } else if !validation::length_between(&self.author_name, 1, 50) {
            errors.add("author_name", "err_author_length");
        }

        if validation::is_blank(&self.body) {
            errors.add("body", "err_body_required");
        } else if !validation::length_between(&self.body, 2, 500) {
            errors.add("body", "err_body_length");
        }

        errors.into_result()
    }
}

impl Comment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Comment {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            author_name: row.get("author_name")?,
            body: row.get("body")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM comments WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM comments ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![limit, offset], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn latest(pool: &DbPool, n: i64) -> Vec<Self> {
        Self::list(pool, n, 0)
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn create(pool: &DbPool, user_id: Option<i64>, form: &CommentForm) -> Result<i64, String> {
        // Honeypot check: if filled, it's a bot
        if !form.honeypot.trim().is_empty() {
            return Err("Spam detected".to_string());
        }

        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO comments (user_id, author_name, body) VALUES (?1, ?2, ?3)",
            params![user_id, form.author_name.trim(), form.body.trim()],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM comments WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_length_is_bounded() {
        let mut form = CommentForm {
            author_name: "سارة".to_string(),
            body: "ممتاز".to_string(),
            honeypot: String::new(),
        };
        assert!(form.validate().is_ok());

        form.body = "x".repeat(501);
        assert_eq!(form.validate().unwrap_err().get("body"), Some("err_body_length"));

        form.body = "  ".to_string();
        assert_eq!(form.validate().unwrap_err().get("body"), Some("err_body_required"));
    }
}
