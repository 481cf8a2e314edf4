use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::validation::{self, FormErrors};

/// A visitor's suggestion waiting for admin approval.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReciterRequest {
    pub id: i64,
    pub name: String,
    pub sample_link: String,
    pub district: String,
    pub mosque_link: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromForm)]
pub struct RequestForm {
    pub name: String,
    pub sample_link: String,
    pub district: String,
    pub mosque_link: String,
}

impl RequestForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();

        if validation::is_blank(&self.name) {
            errors.add("name", "err_name_required");
        } else if !validation::length_between(&self.name, 2, 50) {
            errors.add("name", "err_name_length");
        }

        validation::check_required_url(
            &mut errors,
            "sample_link",
            &self.sample_link,
            "err_sample_required",
        );

        if validation::is_blank(&self.district) {
            errors.add("district", "err_district_required");
        } else if !validation::length_between(&self.district, 2, 50) {
            errors.add("district", "err_district_length");
        }

        validation::check_required_url(
            &mut errors,
            "mosque_link",
            &self.mosque_link,
            "err_mosque_required",
        );

        errors.into_result()
    }
}

impl ReciterRequest {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ReciterRequest {
            id: row.get("id")?,
            name: row.get("name")?,
            sample_link: row.get("sample_link")?,
            district: row.get("district")?,
            mosque_link: row.get("mosque_link")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM requests WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    /// Pending requests, newest first.
    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt =
            match conn.prepare("SELECT * FROM requests ORDER BY created_at DESC, id DESC") {
                Ok(s) => s,
                Err(_) => return vec![],
            };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM requests", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn create(pool: &DbPool, form: &RequestForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO requests (name, sample_link, district, mosque_link) VALUES (?1, ?2, ?3, ?4)",
            params![
                form.name.trim(),
                form.sample_link.trim(),
                form.district.trim(),
                form.mosque_link.trim()
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    /// Returns false when there was nothing to delete.
    pub fn delete(pool: &DbPool, id: i64) -> Result<bool, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let changed = conn
            .execute("DELETE FROM requests WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(changed > 0)
    }

    /// Turns a request into a reciter. The insert and the delete commit
    /// together; a request that no longer exists yields `Ok(None)` and
    /// leaves the reciter table untouched.
    pub fn approve(pool: &DbPool, id: i64, default_image: &str) -> Result<Option<i64>, String> {
        let mut conn = pool.get().map_err(|e| e.to_string())?;
        let tx = conn.transaction().map_err(|e| e.to_string())?;

        let request = tx
            .query_row(
                "SELECT * FROM requests WHERE id = ?1",
                params![id],
                Self::from_row,
            )
            .optional()
            .map_err(|e| e.to_string())?;
        let request = match request {
            Some(r) => r,
            None => return Ok(None),
        };

        let image = if default_image.trim().is_empty() {
            None
        } else {
            Some(default_image.trim())
        };
        tx.execute(
            "INSERT INTO readers (name, image, district, sample_link, mosque_link)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                request.name,
                image,
                request.district,
                request.sample_link,
                request.mosque_link
            ],
        )
        .map_err(|e| e.to_string())?;
        let reader_id = tx.last_insert_rowid();

        tx.execute("DELETE FROM requests WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        tx.commit().map_err(|e| e.to_string())?;

        Ok(Some(reader_id))
    }
}
