use chrono::{Duration, Utc};
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use std::sync::Arc;

use crate::models::user::User;
use crate::store::Store;

pub const SESSION_COOKIE: &str = "qurra_session";

// ── Optional viewer (never fails) ──

/// Whoever is browsing: `Some` for a logged-in visitor, `None` otherwise.
pub struct Viewer(pub Option<User>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Viewer {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(Viewer(session_user(request).await))
    }
}

// ── Authenticated user guard (any user with a valid session) ──

pub struct AuthenticatedUser {
    pub user: User,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match session_user(request).await {
            Some(user) => Outcome::Success(AuthenticatedUser { user }),
            None => Outcome::Forward(Status::Unauthorized),
        }
    }
}

// ── Admin guard ──

/// Guard: requires role = admin. Failing requests fall through to the
/// admin fallback route, which redirects per `guard::admin_access`.
pub struct AdminUser {
    pub user: User,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match session_user(request).await {
            Some(user) if user.is_admin() => Outcome::Success(AdminUser { user }),
            Some(_) => Outcome::Forward(Status::Forbidden),
            None => Outcome::Forward(Status::Unauthorized),
        }
    }
}

// ── Shared session resolution ──

struct CachedSessionUser(Option<User>);

/// Resolves the session user once per request; later guards reuse it.
pub async fn session_user(request: &Request<'_>) -> Option<User> {
    let cached = request
        .local_cache_async(async { CachedSessionUser(resolve_session_user(request).await) })
        .await;
    cached.0.clone()
}

async fn resolve_session_user(request: &Request<'_>) -> Option<User> {
    let store = request
        .guard::<&State<Arc<dyn Store>>>()
        .await
        .succeeded()?;
    let cookies = request.cookies();
    let session_id = cookies.get_private(SESSION_COOKIE)?.value().to_string();

    match store.session_get_user(&session_id) {
        Some(user) => Some(user),
        None => {
            cookies.remove_private(Cookie::from(SESSION_COOKIE));
            None
        }
    }
}

// ── Password utilities ──

pub fn hash_password(password: &str) -> Result<String, String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| e.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

// ── Session management ──

pub fn create_session(store: &dyn Store, user_id: i64) -> Result<String, String> {
    let expiry_hours = store.setting_get_i64("session_expiry_hours").max(1);
    let session_id = uuid::Uuid::new_v4().to_string();
    let expires = Utc::now().naive_utc() + Duration::hours(expiry_hours);
    let expires_str = expires.format("%Y-%m-%d %H:%M:%S").to_string();

    store.session_create(user_id, &session_id, &expires_str)?;

    Ok(session_id)
}

pub fn destroy_session(store: &dyn Store, session_id: &str) -> Result<(), String> {
    store.session_delete(session_id)
}

/// Set the session cookie. `Secure` follows the scheme of `site_url`.
pub fn set_session_cookie(cookies: &CookieJar<'_>, session_id: &str, store: &dyn Store) {
    let is_secure = store.setting_get_or("site_url", "").starts_with("https://");

    let mut cookie = Cookie::new(SESSION_COOKIE, session_id.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    if is_secure {
        cookie.set_secure(true);
    }
    cookies.add_private(cookie);
}

pub fn clear_session_cookie(cookies: &CookieJar<'_>) {
    cookies.remove_private(Cookie::from(SESSION_COOKIE));
}

/// Creates a session for `user_id` and stores it in the cookie jar.
pub fn login(store: &dyn Store, cookies: &CookieJar<'_>, user_id: i64) -> Result<(), String> {
    let session_id = create_session(store, user_id)?;
    set_session_cookie(cookies, &session_id, store);
    Ok(())
}

/// Ends the current session, if any.
pub fn logout(store: &dyn Store, cookies: &CookieJar<'_>) {
    if let Some(cookie) = cookies.get_private(SESSION_COOKIE) {
        if let Err(e) = destroy_session(store, cookie.value()) {
            log::warn!("Failed to delete session: {}", e);
        }
    }
    clear_session_cookie(cookies);
}

pub fn cleanup_expired_sessions(store: &dyn Store) -> usize {
    store.session_cleanup_expired()
}
