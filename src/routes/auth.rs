use std::sync::Arc;

use rocket::form::Form;
use rocket::http::{CookieJar, Status};
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::email;
use crate::i18n::{self, Lang};
use crate::render;
use crate::security::auth::{self, Viewer};
use crate::store::Store;
use crate::validation::{self, FormErrors};

#[derive(Debug, FromForm, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, FromForm, Serialize, Deserialize)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub confirm_password: String,
}

impl SignupForm {
    /// Field checks only; whether the address is taken is checked against
    /// the store separately.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();

        if validation::is_blank(&self.first_name) {
            errors.add("first_name", "err_first_name_required");
        }
        if validation::is_blank(&self.last_name) {
            errors.add("last_name", "err_last_name_required");
        }
        check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);

        if self.confirm_password.is_empty() {
            errors.add("confirm_password", "err_confirm_required");
        } else if self.confirm_password != self.password {
            errors.add("confirm_password", "err_password_mismatch");
        }

        errors.into_result()
    }
}

#[derive(Debug, Clone, FromForm, Serialize, Deserialize)]
pub struct VerifyOtpForm {
    pub email: String,
    pub otp: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl VerifyOtpForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        check_email(&mut errors, &self.email);
        if validation::is_blank(&self.otp) {
            errors.add("otp", "err_otp_required");
        }
        check_password(&mut errors, &self.password);
        errors.into_result()
    }
}

fn check_email(errors: &mut FormErrors, email: &str) {
    if validation::is_blank(email) {
        errors.add("email", "err_email_required");
    } else if !validation::is_email(email) {
        errors.add("email", "err_email");
    }
}

fn check_password(errors: &mut FormErrors, password: &str) {
    if password.is_empty() {
        errors.add("password", "err_password_required");
    } else if password.chars().count() < 6 {
        errors.add("password", "err_password_length");
    }
}

fn login_context(
    store: &dyn Store,
    lang: Lang,
    mode: &str,
    errors: serde_json::Value,
    form: serde_json::Value,
    flash: Option<FlashMessage<'_>>,
) -> serde_json::Value {
    let mut context = render::base_context(store, lang, None, flash);
    render::merge(
        &mut context,
        json!({
            "page": "login",
            "mode": if mode == "signup" { "signup" } else { "login" },
            "errors": errors,
            "form": form,
        }),
    );
    context
}

// ── Login ──────────────────────────────────────────────

#[get("/login?<mode>")]
pub fn login_page(
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    viewer: Viewer,
    flash: Option<FlashMessage<'_>>,
    mode: Option<String>,
) -> Result<Template, Redirect> {
    if viewer.0.is_some() {
        return Err(Redirect::to("/"));
    }
    let mode = mode.unwrap_or_default();
    let context = login_context(&***store, lang, &mode, json!({}), json!({}), flash);
    Ok(Template::render("login", &context))
}

#[post("/login", data = "<form>")]
pub fn login_submit(
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    cookies: &CookieJar<'_>,
    form: Form<LoginForm>,
) -> Result<Flash<Redirect>, (Status, Template)> {
    let store: &dyn Store = &***store;
    let user = store
        .user_get_by_email(&form.email)
        .filter(|u| auth::verify_password(&form.password, &u.password_hash));

    let user = match user {
        Some(u) => u,
        None => {
            let context = login_context(
                store,
                lang,
                "login",
                json!({ "email": i18n::t(lang, "invalid_credentials") }),
                json!({ "email": form.email }),
                None,
            );
            return Err((Status::Unauthorized, Template::render("login", &context)));
        }
    };

    match auth::login(store, cookies, user.id) {
        Ok(()) => {
            log::info!("User {} logged in", user.id);
            let target = if user.is_admin() { "/admin" } else { "/" };
            Ok(Flash::success(Redirect::to(target), i18n::t(lang, "welcome_back")))
        }
        Err(e) => {
            log::error!("Session creation failed for user {}: {}", user.id, e);
            let context = login_context(store, lang, "login", json!({}), json!({}), None);
            Err((Status::InternalServerError, Template::render("login", &context)))
        }
    }
}

// ── Signup ─────────────────────────────────────────────

#[post("/signup", data = "<form>")]
pub async fn signup_submit(
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    cookies: &CookieJar<'_>,
    form: Form<SignupForm>,
) -> Result<Flash<Redirect>, (Status, Template)> {
    let form = form.into_inner();
    let store: Arc<dyn Store> = store.inner().clone();

    let rerender = |status: Status, errors: serde_json::Value| {
        let context = login_context(&*store, lang, "signup", errors, json!(form), None);
        (status, Template::render("login", &context))
    };

    let mut errors = match form.validate() {
        Ok(()) => FormErrors::new(),
        Err(e) => e,
    };
    if !errors.has("email") && store.user_get_by_email(&form.email).is_some() {
        errors.add("email", "err_email_taken");
    }
    if !errors.is_empty() {
        return Err(rerender(
            Status::UnprocessableEntity,
            json!(errors.localized(lang)),
        ));
    }

    let email_addr = form.email.trim().to_lowercase();

    if !store.setting_get_bool("signup_require_otp") {
        let hash = match auth::hash_password(&form.password) {
            Ok(h) => h,
            Err(e) => {
                log::error!("Password hashing failed: {}", e);
                return Err(rerender(Status::InternalServerError, json!({})));
            }
        };
        return match store.user_create(&email_addr, &hash, &form.first_name, &form.last_name) {
            Ok(id) => {
                log::info!("Account {} created", id);
                if let Err(e) = auth::login(&*store, cookies, id) {
                    log::error!("Session creation failed for new user {}: {}", id, e);
                }
                Ok(Flash::success(Redirect::to("/"), i18n::t(lang, "account_created")))
            }
            Err(e) => {
                log::error!("Account creation failed: {}", e);
                Err(rerender(Status::InternalServerError, json!({})))
            }
        };
    }

    // Verified signup: store a code, mail it, then ask for it
    let ttl = store.setting_get_i64("otp_expiry_minutes").max(1);
    let code = crate::models::otp::EmailOtp::generate_code();
    if let Err(e) = store.otp_create(&email_addr, &code, &form.first_name, &form.last_name, ttl) {
        log::error!("Failed to store signup code: {}", e);
        return Err(rerender(Status::InternalServerError, json!({})));
    }

    let settings = store.setting_all();
    let to = email_addr.clone();
    let mail_code = code.clone();
    let sent = rocket::tokio::task::spawn_blocking(move || {
        email::send_otp_email(&settings, lang, &to, &mail_code, ttl)
    })
    .await
    .map_err(|e| e.to_string())
    .and_then(|r| r);

    if let Err(e) = sent {
        log::warn!("Could not email signup code to {}: {}", email_addr, e);
        if cfg!(debug_assertions) {
            log::info!("Signup code for {}: {}", email_addr, code);
        }
    }

    Ok(Flash::success(
        Redirect::to(format!("/verify-otp?email={}", urlencode(&email_addr))),
        i18n::t(lang, "otp_sent"),
    ))
}

fn urlencode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

// ── OTP verification ───────────────────────────────────

#[get("/verify-otp?<email>")]
pub fn verify_otp_page(
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    flash: Option<FlashMessage<'_>>,
    email: Option<String>,
) -> Template {
    let mut context = render::base_context(&***store, lang, None, flash);
    render::merge(
        &mut context,
        json!({ "page": "login", "form": { "email": email.unwrap_or_default() } }),
    );
    Template::render("verify_otp", &context)
}

#[post("/verify-otp", data = "<form>")]
pub fn verify_otp_submit(
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    cookies: &CookieJar<'_>,
    form: Form<VerifyOtpForm>,
) -> Result<Flash<Redirect>, (Status, Template)> {
    let store: &dyn Store = &***store;
    let form = form.into_inner();

    let rerender = |status: Status, errors: serde_json::Value| {
        let mut context = render::base_context(store, lang, None, None);
        render::merge(
            &mut context,
            json!({ "page": "login", "errors": errors, "form": form }),
        );
        (status, Template::render("verify_otp", &context))
    };

    if let Err(errors) = form.validate() {
        return Err(rerender(
            Status::UnprocessableEntity,
            json!(errors.localized(lang)),
        ));
    }

    if store.user_get_by_email(&form.email).is_some() {
        return Err(rerender(
            Status::UnprocessableEntity,
            json!({ "email": i18n::t(lang, "err_email_taken") }),
        ));
    }

    let pending = match store.otp_consume(&form.email, &form.otp) {
        Some(p) => p,
        None => {
            return Err(rerender(
                Status::UnprocessableEntity,
                json!({ "otp": i18n::t(lang, "otp_invalid") }),
            ))
        }
    };

    let created = auth::hash_password(&form.password).and_then(|hash| {
        store.user_create(&pending.email, &hash, &pending.first_name, &pending.last_name)
    });
    match created {
        Ok(id) => {
            log::info!("Account {} created after email verification", id);
            if let Err(e) = auth::login(store, cookies, id) {
                log::error!("Session creation failed for new user {}: {}", id, e);
            }
            Ok(Flash::success(Redirect::to("/"), i18n::t(lang, "account_created")))
        }
        Err(e) => {
            log::error!("Account creation after verification failed: {}", e);
            Err(rerender(Status::InternalServerError, json!({})))
        }
    }
}

// ── Logout ─────────────────────────────────────────────

#[get("/logout")]
pub fn logout(
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    cookies: &CookieJar<'_>,
) -> Flash<Redirect> {
    auth::logout(&***store, cookies);
    Flash::success(Redirect::to("/"), i18n::t(lang, "logged_out"))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        login_page,
        login_submit,
        signup_submit,
        verify_otp_page,
        verify_otp_submit,
        logout,
    ]
}
