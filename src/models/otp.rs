use chrono::{Duration, Utc};
use rand::Rng;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::db::DbPool;

/// A pending signup: the code mailed to `email` plus the names entered on
/// the signup form.
#[derive(Debug, Clone, Serialize)]
pub struct EmailOtp {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl EmailOtp {
    /// Six random digits.
    pub fn generate_code() -> String {
        let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
        format!("{:06}", n)
    }

    pub fn create(
        pool: &DbPool,
        email: &str,
        otp: &str,
        first_name: &str,
        last_name: &str,
        ttl_minutes: i64,
    ) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let expires_at = (Utc::now() + Duration::minutes(ttl_minutes.max(1)))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        conn.execute(
            "INSERT INTO email_otps (email, otp, first_name, last_name, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                email.trim().to_lowercase(),
                otp,
                first_name.trim(),
                last_name.trim(),
                expires_at
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    /// Marks the newest matching, unused, unexpired code as used and returns
    /// it. Wrong, reused and expired codes all yield `None`.
    pub fn consume(pool: &DbPool, email: &str, otp: &str) -> Option<EmailOtp> {
        let conn = pool.get().ok()?;
        let found = conn
            .query_row(
                "SELECT id, email, first_name, last_name FROM email_otps
                 WHERE email = ?1 AND otp = ?2 AND used = 0 AND expires_at > datetime('now')
                 ORDER BY id DESC LIMIT 1",
                params![email.trim().to_lowercase(), otp.trim()],
                |row| {
                    Ok(EmailOtp {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        first_name: row.get(2)?,
                        last_name: row.get(3)?,
                    })
                },
            )
            .optional()
            .ok()??;

        let marked = conn
            .execute(
                "UPDATE email_otps SET used = 1 WHERE id = ?1 AND used = 0",
                params![found.id],
            )
            .ok()?;
        if marked == 0 {
            return None;
        }
        Some(found)
    }

    /// Drops used and expired codes. Returns how many were removed.
    pub fn cleanup(pool: &DbPool) -> Result<usize, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM email_otps WHERE used = 1 OR expires_at <= datetime('now')",
            [],
        )
        .map_err(|e| e.to_string())
    }
}
