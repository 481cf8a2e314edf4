use rusqlite::{params, OptionalExtension};

use crate::db::DbPool;
use crate::models::reciter::Reciter;
use crate::ranking::FavoriteTally;

pub struct Favorite;

impl Favorite {
    /// Reciter ids the user has favorited.
    pub fn ids_for_user(pool: &DbPool, user_id: i64) -> Vec<i64> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT reader_id FROM favorites WHERE user_id = ?1") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![user_id], |row| row.get(0))
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn exists(pool: &DbPool, user_id: i64, reader_id: i64) -> bool {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return false,
        };
        conn.query_row(
            "SELECT 1 FROM favorites WHERE user_id = ?1 AND reader_id = ?2",
            params![user_id, reader_id],
            |_| Ok(()),
        )
        .optional()
        .ok()
        .flatten()
        .is_some()
    }

    /// Flips membership and returns whether the reciter is now a favorite.
    pub fn toggle(pool: &DbPool, user_id: i64, reader_id: i64) -> Result<bool, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let removed = conn
            .execute(
                "DELETE FROM favorites WHERE user_id = ?1 AND reader_id = ?2",
                params![user_id, reader_id],
            )
            .map_err(|e| e.to_string())?;
        if removed > 0 {
            return Ok(false);
        }
        conn.execute(
            "INSERT OR IGNORE INTO favorites (user_id, reader_id) VALUES (?1, ?2)",
            params![user_id, reader_id],
        )
        .map_err(|e| e.to_string())?;
        Ok(true)
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM favorites", [], |row| row.get(0))
            .unwrap_or(0)
    }

    /// Favorite count per favorited reciter.
    pub fn tallies(pool: &DbPool) -> Vec<FavoriteTally> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT r.id, r.name, r.image, r.district, r.sample_link, r.mosque_link, r.created_at,
                    COUNT(f.id) AS favorites
             FROM favorites f
             JOIN readers r ON r.id = f.reader_id
             GROUP BY r.id
             ORDER BY favorites DESC, r.id ASC",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], |row| {
            Ok(FavoriteTally {
                reciter: Reciter {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    image: row.get(2)?,
                    district: row.get(3)?,
                    sample_link: row.get(4)?,
                    mosque_link: row.get(5)?,
                    created_at: row.get(6)?,
                },
                count: row.get(7)?,
            })
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }
}
