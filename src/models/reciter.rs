use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::validation::{self, FormErrors};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Reciter {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub district: String,
    pub sample_link: String,
    pub mosque_link: String,
    pub created_at: NaiveDateTime,
}

/// Add/edit form shared by the admin dialogs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromForm)]
pub struct ReciterForm {
    pub name: String,
    pub district: String,
    pub sample_link: String,
    pub mosque_link: String,
    pub image: String,
}

impl ReciterForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();

        if validation::is_blank(&self.name) {
            errors.add("name", "err_name_required");
        } else if !validation::length_between(&self.name, 2, 50) {
            errors.add("name", "err_name_length");
        }

        if validation::is_blank(&self.district) {
            errors.add("district", "err_district_required");
        } else if !validation::length_between(&self.district, 2, 50) {
            errors.add("district", "err_district_length");
        }

        validation::check_required_url(
            &mut errors,
            "sample_link",
            &self.sample_link,
            "err_sample_required",
        );
        validation::check_required_url(
            &mut errors,
            "mosque_link",
            &self.mosque_link,
            "err_mosque_required",
        );

        if !validation::is_blank(&self.image) && !validation::is_http_url(&self.image) {
            errors.add("image", "err_url");
        }

        errors.into_result()
    }

    /// Empty image field means "no image".
    pub fn image_opt(&self) -> Option<String> {
        let trimmed = self.image.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn from_reciter(r: &Reciter) -> Self {
        ReciterForm {
            name: r.name.clone(),
            district: r.district.clone(),
            sample_link: r.sample_link.clone(),
            mosque_link: r.mosque_link.clone(),
            image: r.image.clone().unwrap_or_default(),
        }
    }
}

impl Reciter {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Reciter {
            id: row.get("id")?,
            name: row.get("name")?,
            image: row.get("image")?,
            district: row.get("district")?,
            sample_link: row.get("sample_link")?,
            mosque_link: row.get("mosque_link")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM readers WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    /// Newest first.
    pub fn list(pool: &DbPool, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM readers ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
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

    /// Case-insensitive substring match on name or district. An empty term
    /// returns every reciter.
    pub fn search(pool: &DbPool, term: &str) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let pattern = like_pattern(term);
        let mut stmt = match conn.prepare(
            "SELECT * FROM readers
             WHERE lower(name) LIKE ?1 ESCAPE '\\' OR lower(district) LIKE ?1 ESCAPE '\\'
             ORDER BY created_at DESC, id DESC",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![pattern], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM readers", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn count_since_days(pool: &DbPool, days: i64) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row(
            "SELECT COUNT(*) FROM readers WHERE created_at >= datetime('now', ?1)",
            params![format!("-{} days", days)],
            |row| row.get(0),
        )
        .unwrap_or(0)
    }

    pub fn create(pool: &DbPool, form: &ReciterForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO readers (name, image, district, sample_link, mosque_link)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                form.name.trim(),
                form.image_opt(),
                form.district.trim(),
                form.sample_link.trim(),
                form.mosque_link.trim()
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, form: &ReciterForm) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let changed = conn
            .execute(
                "UPDATE readers SET name = ?1, image = ?2, district = ?3, sample_link = ?4, mosque_link = ?5
                 WHERE id = ?6",
                params![
                    form.name.trim(),
                    form.image_opt(),
                    form.district.trim(),
                    form.sample_link.trim(),
                    form.mosque_link.trim(),
                    id
                ],
            )
            .map_err(|e| e.to_string())?;
        if changed == 0 {
            return Err("Reciter not found".to_string());
        }
        Ok(())
    }

    /// Removes the reciter and its favorites together.
    /// Deletes the reciter with its favorites. `Ok(false)` when no such
    /// reciter exists.
    pub fn delete(pool: &DbPool, id: i64) -> Result<bool, String> {
        let mut conn = pool.get().map_err(|e| e.to_string())?;
        let tx = conn.transaction().map_err(|e| e.to_string())?;
        tx.execute("DELETE FROM favorites WHERE reader_id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        let changed = tx
            .execute("DELETE FROM readers WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        if changed == 0 {
            return Ok(false);
        }
        tx.commit().map_err(|e| e.to_string())?;
        Ok(true)
    }
}

/// `%term%` with LIKE wildcards escaped. SQLite's `lower()` only folds
/// ASCII, so the term is folded the same way.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c.to_ascii_lowercase());
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ReciterForm {
        ReciterForm {
            name: "عبدالله الجهني".to_string(),
            district: "الروضة".to_string(),
            sample_link: "https://www.youtube.com/watch?v=abc".to_string(),
            mosque_link: "https://maps.google.com/?q=mosque".to_string(),
            image: String::new(),
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(valid_form().validate().is_ok());
        assert_eq!(valid_form().image_opt(), None);
    }

    #[test]
    fn each_field_reports_its_own_error() {
        let form = ReciterForm {
            name: "ا".to_string(),
            district: String::new(),
            sample_link: "youtube".to_string(),
            mosque_link: String::new(),
            image: "not-a-link".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("name"), Some("err_name_length"));
        assert_eq!(errors.get("district"), Some("err_district_required"));
        assert_eq!(errors.get("sample_link"), Some("err_url"));
        assert_eq!(errors.get("mosque_link"), Some("err_mosque_required"));
        assert_eq!(errors.get("image"), Some("err_url"));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" Abdul "), "%abdul%");
        assert_eq!(like_pattern("50%_x"), "%50\\%\\_x%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
        assert_eq!(like_pattern("Émile"), "%Émile%");
    }
}
