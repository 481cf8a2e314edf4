use std::collections::BTreeMap;

use serde::Serialize;

use crate::i18n::{self, Lang};

/// Field-level validation failures: field name -> i18n message key.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct FormErrors(BTreeMap<&'static str, &'static str>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. The first error recorded for a field wins.
    pub fn add(&mut self, field: &'static str, message_key: &'static str) {
        self.0.entry(field).or_insert(message_key);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Resolve message keys into display strings for the template context.
    pub fn localized(&self, lang: Lang) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(field, key)| (field.to_string(), i18n::t(lang, key).to_string()))
            .collect()
    }

    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Length check in characters, not bytes (Arabic names are multi-byte).
pub fn length_between(value: &str, min: usize, max: usize) -> bool {
    let n = value.trim().chars().count();
    n >= min && n <= max
}

/// Absolute http(s) URL with a host.
pub fn is_http_url(value: &str) -> bool {
    match url::Url::parse(value.trim()) {
        Ok(u) => matches!(u.scheme(), "http" | "https") && u.host_str().is_some(),
        Err(_) => false,
    }
}

pub fn is_email(value: &str) -> bool {
    value.trim().parse::<lettre::Address>().is_ok()
}

/// Validates a required URL field, recording `required_key` when empty and
/// `err_url` when malformed.
pub fn check_required_url(
    errors: &mut FormErrors,
    field: &'static str,
    value: &str,
    required_key: &'static str,
) {
    if is_blank(value) {
        errors.add(field, required_key);
    } else if !is_http_url(value) {
        errors.add(field, "err_url");
    }
}
