use std::collections::HashMap;

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::i18n::{self, Lang};

/// SMTP settings pulled from the settings table.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl SmtpConfig {
    /// `None` when host, username or sender are missing.
    pub fn from_settings(settings: &HashMap<String, String>) -> Option<Self> {
        let get = |k: &str| settings.get(k).cloned().unwrap_or_default();
        let host = get("email_smtp_host");
        let username = get("email_smtp_username");
        let from = Some(get("email_from_address"))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| username.clone());
        if host.is_empty() || username.is_empty() || from.is_empty() {
            return None;
        }
        Some(SmtpConfig {
            host,
            port: settings
                .get("email_smtp_port")
                .and_then(|v| v.parse().ok())
                .unwrap_or(587),
            username,
            password: get("email_smtp_password"),
            from,
        })
    }
}

pub fn otp_subject(lang: Lang, site_name: &str) -> String {
    format!("{}: {}", site_name, i18n::t(lang, "otp_title"))
}

pub fn otp_body(lang: Lang, site_name: &str, code: &str, ttl_minutes: i64) -> String {
    match lang {
        Lang::Ar => format!(
            "رمز التحقق الخاص بك هو: {}\n\nينتهي الرمز خلال {} دقائق.\n\n{}\n",
            code, ttl_minutes, site_name
        ),
        Lang::En => format!(
            "Your verification code is: {}\n\nThe code expires in {} minutes.\n\n{}\n",
            code, ttl_minutes, site_name
        ),
    }
}

/// Mails a signup code. Blocking; call from `spawn_blocking`.
pub fn send_otp_email(
    settings: &HashMap<String, String>,
    lang: Lang,
    to: &str,
    code: &str,
    ttl_minutes: i64,
) -> Result<(), String> {
    let config = SmtpConfig::from_settings(settings).ok_or("SMTP is not configured")?;
    let site_name = settings
        .get("site_name")
        .cloned()
        .unwrap_or_else(|| "Qurra".to_string());

    send_smtp(
        &config,
        to,
        &otp_subject(lang, &site_name),
        &otp_body(lang, &site_name, code, ttl_minutes),
    )?;
    log::info!("OTP email sent to {}", to);
    Ok(())
}

pub fn send_smtp(config: &SmtpConfig, to: &str, subject: &str, body: &str) -> Result<(), String> {
    let email = Message::builder()
        .from(config.from.parse().map_err(|e| format!("Invalid from address: {}", e))?)
        .to(to.parse().map_err(|e| format!("Invalid to address: {}", e))?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| format!("Failed to build email: {}", e))?;

    let creds = Credentials::new(config.username.clone(), config.password.clone());

    let mailer = SmtpTransport::starttls_relay(&config.host)
        .map_err(|e| format!("SMTP relay error: {}", e))?
        .port(config.port)
        .credentials(creds)
        .build();

    mailer.send(&email).map_err(|e| format!("SMTP send error: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_smtp_is_none() {
        let mut settings = HashMap::new();
        settings.insert("email_smtp_host".to_string(), String::new());
        assert!(SmtpConfig::from_settings(&settings).is_none());
    }

    #[test]
    fn sender_falls_back_to_username() {
        let mut settings = HashMap::new();
        settings.insert("email_smtp_host".to_string(), "smtp.example.com".to_string());
        settings.insert("email_smtp_username".to_string(), "noreply@example.com".to_string());
        settings.insert("email_smtp_port".to_string(), "2525".to_string());
        let config = SmtpConfig::from_settings(&settings).unwrap();
        assert_eq!(config.from, "noreply@example.com");
        assert_eq!(config.port, 2525);
    }

    #[test]
    fn body_contains_code() {
        assert!(otp_body(Lang::En, "Qurra", "123456", 10).contains("123456"));
        assert!(otp_body(Lang::Ar, "قرّاء", "654321", 10).contains("654321"));
    }
}
