#![cfg(test)]

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rocket::http::{ContentType, Status};
use rocket::local::blocking::{Client, LocalResponse};

use crate::db::{run_migrations, seed_defaults, DbPool};
use crate::i18n::{self, Lang};
use crate::models::comment::CommentForm;
use crate::models::reciter::ReciterForm;
use crate::models::request::RequestForm;
use crate::pagination::{Pagination, READERS_PER_PAGE};
use crate::ranking::top_reciters;
use crate::store::sqlite::SqliteStore;
use crate::store::Store;

/// Atomic counter for unique shared-cache DB names so parallel tests don't collide.
static TEST_DB_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Fresh in-memory SQLite pool with migrations and default settings applied.
/// Uses a named shared-cache DB so every pooled connection sees the same data.
fn test_pool() -> DbPool {
    let id = TEST_DB_COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let uri = format!("file:qurra_testdb_{}?mode=memory&cache=shared", id);
    let manager = SqliteConnectionManager::file(uri);
    let pool = Pool::builder()
        .max_size(2)
        .build(manager)
        .expect("Failed to create test pool");
    {
        let conn = pool.get().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    }
    run_migrations(&pool).expect("Failed to run migrations");
    seed_defaults(&pool).expect("Failed to seed defaults");
    pool
}

fn test_store() -> SqliteStore {
    SqliteStore::new(test_pool())
}

/// Fast bcrypt hash for tests (cost=4 instead of DEFAULT_COST=12).
fn fast_hash(password: &str) -> String {
    bcrypt::hash(password, 4).unwrap()
}

fn reader_form(name: &str) -> ReciterForm {
    ReciterForm {
        name: name.to_string(),
        district: "Al Malqa".to_string(),
        sample_link: "https://youtube.com/watch?v=abc".to_string(),
        mosque_link: "https://maps.google.com/?q=mosque".to_string(),
        image: String::new(),
    }
}

fn request_form(name: &str) -> RequestForm {
    RequestForm {
        name: name.to_string(),
        sample_link: "https://soundcloud.com/sample".to_string(),
        district: "Al Olaya".to_string(),
        mosque_link: "https://maps.google.com/?q=olaya".to_string(),
    }
}

fn add_user(store: &dyn Store, email: &str, password: &str) -> i64 {
    store
        .user_create(email, &fast_hash(password), "Test", "User")
        .unwrap()
}

// ═══════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════

#[test]
fn settings_defaults_seeded() {
    let store = test_store();
    assert_eq!(store.setting_get_or("site_name", ""), "قرّاء");
    assert!(!store.setting_get_bool("signup_require_otp"));
    assert_eq!(store.setting_get_i64("otp_expiry_minutes"), 10);
}

#[test]
fn settings_seed_does_not_overwrite() {
    let store = test_store();
    store.setting_set("site_name", "Custom").unwrap();
    store.seed_defaults().unwrap();
    assert_eq!(store.setting_get("site_name"), Some("Custom".to_string()));
}

// ═══════════════════════════════════════════════════════════
// Users & sessions
// ═══════════════════════════════════════════════════════════

#[test]
fn first_user_becomes_admin() {
    let store = test_store();
    let first = add_user(&store, "first@example.com", "secret1");
    let second = add_user(&store, "second@example.com", "secret2");

    assert!(store.user_get_by_id(first).unwrap().is_admin());
    assert!(!store.user_get_by_id(second).unwrap().is_admin());
    assert_eq!(store.user_count(), 2);
}

#[test]
fn user_email_is_case_insensitive() {
    let store = test_store();
    add_user(&store, "Mixed@Example.com", "secret1");
    let user = store.user_get_by_email("mixed@example.COM").unwrap();
    assert_eq!(user.email, "mixed@example.com");
}

#[test]
fn duplicate_email_rejected() {
    let store = test_store();
    add_user(&store, "dup@example.com", "secret1");
    assert!(store
        .user_create("dup@example.com", &fast_hash("x"), "A", "B")
        .is_err());
}

#[test]
fn session_resolves_user_until_deleted() {
    let store = test_store();
    let uid = add_user(&store, "s@example.com", "secret1");
    let token = crate::security::auth::create_session(&store, uid).unwrap();

    let user = store.session_get_user(&token).unwrap();
    assert_eq!(user.id, uid);

    store.session_delete(&token).unwrap();
    assert!(store.session_get_user(&token).is_none());
}

#[test]
fn expired_session_ignored_and_cleaned() {
    let store = test_store();
    let uid = add_user(&store, "old@example.com", "secret1");
    store
        .session_create(uid, "stale-token", "2000-01-01 00:00:00")
        .unwrap();

    assert!(store.session_get_user("stale-token").is_none());
    assert_eq!(store.session_cleanup_expired(), 1);
}

#[test]
fn user_delete_keeps_comments_anonymous() {
    let store = test_store();
    let uid = add_user(&store, "gone@example.com", "secret1");
    let rid = store.reader_create(&reader_form("Reader One")).unwrap();
    store.favorite_toggle(uid, rid).unwrap();
    let form = CommentForm {
        author_name: "Gone".to_string(),
        body: "Beautiful recitation".to_string(),
        honeypot: String::new(),
    };
    let cid = store.comment_create(Some(uid), &form).unwrap();

    store.user_delete(uid).unwrap();

    assert!(store.user_get_by_id(uid).is_none());
    assert_eq!(store.favorite_count(), 0);
    let comment = store.comment_find_by_id(cid).unwrap();
    assert_eq!(comment.user_id, None);
    assert_eq!(comment.author_name, "Gone");
}

#[test]
fn password_hash_roundtrip() {
    let hash = fast_hash("correct horse");
    assert!(crate::security::auth::verify_password("correct horse", &hash));
    assert!(!crate::security::auth::verify_password("wrong", &hash));
    assert!(!crate::security::auth::verify_password("x", "not-a-hash"));
}

// ═══════════════════════════════════════════════════════════
// Signup codes
// ═══════════════════════════════════════════════════════════

#[test]
fn otp_consumed_only_once() {
    let store = test_store();
    store
        .otp_create("new@example.com", "123456", "New", "User", 10)
        .unwrap();

    assert!(store.otp_consume("new@example.com", "000000").is_none());
    let pending = store.otp_consume("new@example.com", "123456").unwrap();
    assert_eq!(pending.first_name, "New");
    assert!(store.otp_consume("new@example.com", "123456").is_none());
}

#[test]
fn expired_otp_rejected() {
    let store = test_store();
    store
        .otp_create("late@example.com", "654321", "Late", "User", -1)
        .unwrap();
    assert!(store.otp_consume("late@example.com", "654321").is_none());
    assert_eq!(store.otp_cleanup().unwrap(), 1);
}

// ═══════════════════════════════════════════════════════════
// Reciters & favorites
// ═══════════════════════════════════════════════════════════

#[test]
fn reader_pages_hold_six() {
    let store = test_store();
    for i in 0..8 {
        store.reader_create(&reader_form(&format!("Reader {}", i))).unwrap();
    }

    let first = Pagination::new(store.reader_count(), READERS_PER_PAGE, Some(1));
    assert_eq!(first.total_pages, 2);
    assert_eq!(store.reader_list(first.per_page, first.offset()).len(), 6);

    let second = Pagination::new(store.reader_count(), READERS_PER_PAGE, Some(2));
    assert_eq!(store.reader_list(second.per_page, second.offset()).len(), 2);

    let clamped = Pagination::new(store.reader_count(), READERS_PER_PAGE, Some(40));
    assert_eq!(clamped.page, 2);
}

#[test]
fn reader_search_matches_name_or_district() {
    let store = test_store();
    store.reader_create(&reader_form("Abdullah")).unwrap();
    let mut other = reader_form("Saad");
    other.district = "Hittin".to_string();
    store.reader_create(&other).unwrap();

    assert_eq!(store.reader_search("abdul").len(), 1);
    assert_eq!(store.reader_search("hittin").len(), 1);
    assert_eq!(store.reader_search("").len(), 2);
}

#[test]
fn reader_search_treats_wildcards_literally() {
    let store = test_store();
    store.reader_create(&reader_form("Abdullah")).unwrap();
    store.reader_create(&reader_form("Saad_Ghamdi")).unwrap();

    let hits = store.reader_search("_");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Saad_Ghamdi");
    assert!(store.reader_search("%").is_empty());
    assert_eq!(store.reader_search("ABDUL").len(), 1);
}

#[test]
fn reader_update_missing_is_error() {
    let store = test_store();
    assert!(store.reader_update(999, &reader_form("Nobody")).is_err());
}

#[test]
fn favorite_toggle_twice_restores_state() {
    let store = test_store();
    let uid = add_user(&store, "fav@example.com", "secret1");
    let rid = store.reader_create(&reader_form("Reader")).unwrap();

    assert!(store.favorite_toggle(uid, rid).unwrap());
    assert!(store.favorite_exists(uid, rid));
    assert_eq!(store.favorite_ids_for_user(uid), vec![rid]);

    assert!(!store.favorite_toggle(uid, rid).unwrap());
    assert!(!store.favorite_exists(uid, rid));
    assert_eq!(store.favorite_count(), 0);
}

#[test]
fn reader_delete_removes_its_favorites() {
    let store = test_store();
    let uid = add_user(&store, "a@example.com", "secret1");
    let rid = store.reader_create(&reader_form("Reader")).unwrap();
    store.favorite_toggle(uid, rid).unwrap();

    assert!(store.reader_delete(rid).unwrap());

    assert!(store.reader_find_by_id(rid).is_none());
    assert_eq!(store.favorite_count(), 0);
    assert!(!store.reader_delete(rid).unwrap());
}

#[test]
fn ranking_orders_by_favorites() {
    let store = test_store();
    let a = store.reader_create(&reader_form("A")).unwrap();
    let b = store.reader_create(&reader_form("B")).unwrap();
    let c = store.reader_create(&reader_form("C")).unwrap();
    store.reader_create(&reader_form("D")).unwrap();

    let users: Vec<i64> = (0..3)
        .map(|i| add_user(&store, &format!("u{}@example.com", i), "secret1"))
        .collect();
    for u in &users {
        store.favorite_toggle(*u, a).unwrap();
    }
    store.favorite_toggle(users[0], b).unwrap();
    store.favorite_toggle(users[0], c).unwrap();
    store.favorite_toggle(users[1], c).unwrap();

    let top = top_reciters(store.favorite_tallies(), store.reader_latest(10), 3);
    let ids: Vec<i64> = top.iter().map(|t| t.reciter.id).collect();
    assert_eq!(ids, vec![a, c, b]);
    assert_eq!(top[0].count, 3);
}

#[test]
fn ranking_backfills_without_favorites() {
    let store = test_store();
    store.reader_create(&reader_form("Only")).unwrap();
    let top = top_reciters(store.favorite_tallies(), store.reader_latest(10), 3);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].count, 0);
}

// ═══════════════════════════════════════════════════════════
// Requests
// ═══════════════════════════════════════════════════════════

#[test]
fn approve_moves_request_exactly_once() {
    let store = test_store();
    let req = store.request_create(&request_form("Candidate")).unwrap();

    let reader_id = store
        .request_approve(req, "https://avatar.iran.liara.run/public/50")
        .unwrap()
        .unwrap();

    let reader = store.reader_find_by_id(reader_id).unwrap();
    assert_eq!(reader.name, "Candidate");
    assert_eq!(reader.district, "Al Olaya");
    assert_eq!(
        reader.image.as_deref(),
        Some("https://avatar.iran.liara.run/public/50")
    );
    assert!(store.request_find_by_id(req).is_none());

    assert_eq!(store.request_approve(req, "").unwrap(), None);
    assert_eq!(store.reader_count(), 1);
    assert_eq!(store.request_count(), 0);
}

#[test]
fn request_delete_reports_missing() {
    let store = test_store();
    let req = store.request_create(&request_form("Someone")).unwrap();
    assert!(store.request_delete(req).unwrap());
    assert!(!store.request_delete(req).unwrap());
}

// ═══════════════════════════════════════════════════════════
// Comments
// ═══════════════════════════════════════════════════════════

#[test]
fn comment_honeypot_blocks_insert() {
    let store = test_store();
    let form = CommentForm {
        author_name: "Bot".to_string(),
        body: "Buy now".to_string(),
        honeypot: "http://spam.example".to_string(),
    };
    assert!(store.comment_create(None, &form).is_err());
    assert_eq!(store.comment_count(), 0);
}

#[test]
fn comments_listed_newest_first() {
    let store = test_store();
    for body in ["first comment", "second comment"] {
        let form = CommentForm {
            author_name: "Visitor".to_string(),
            body: body.to_string(),
            honeypot: String::new(),
        };
        store.comment_create(None, &form).unwrap();
    }
    let latest = store.comment_latest(1);
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].body, "second comment");
}

#[test]
fn dashboard_stats_counts() {
    let store = test_store();
    let uid = add_user(&store, "s@example.com", "secret1");
    let rid = store.reader_create(&reader_form("Loved")).unwrap();
    store.reader_create(&reader_form("Other")).unwrap();
    store.favorite_toggle(uid, rid).unwrap();
    store.request_create(&request_form("Pending")).unwrap();

    let stats = crate::models::stats::DashboardStats::gather(&store);
    assert_eq!(stats.total_reciters, 2);
    assert_eq!(stats.total_favorites, 1);
    assert_eq!(stats.recent_reciters, 2);
    assert_eq!(stats.most_favorited.as_deref(), Some("Loved"));
    assert_eq!(stats.pending_requests, 1);
}

// ═══════════════════════════════════════════════════════════
// Routes
// ═══════════════════════════════════════════════════════════

fn client_with(pool: &DbPool) -> Client {
    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(pool.clone()));
    Client::tracked(crate::build_rocket(store)).expect("valid rocket instance")
}

fn log_in(client: &Client, email: &str, password: &str) -> Status {
    client
        .post("/login")
        .header(ContentType::Form)
        .body(format!("email={}&password={}", email, password))
        .dispatch()
        .status()
}

fn location(response: &LocalResponse<'_>) -> Option<String> {
    response.headers().get_one("Location").map(|s| s.to_string())
}

#[test]
fn anonymous_admin_request_redirects_to_login() {
    let pool = test_pool();
    let client = client_with(&pool);

    let response = client.get("/admin/requests").dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response).as_deref(), Some("/login"));
}

#[test]
fn non_admin_is_sent_home() {
    let pool = test_pool();
    let store = SqliteStore::new(pool.clone());
    add_user(&store, "admin@example.com", "adminpw");
    add_user(&store, "user@example.com", "userpw1");
    let client = client_with(&pool);

    assert_eq!(log_in(&client, "user@example.com", "userpw1"), Status::SeeOther);

    let response = client.get("/admin/requests").dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response).as_deref(), Some("/"));
}

#[test]
fn admin_sees_requests_page() {
    let pool = test_pool();
    let store = SqliteStore::new(pool.clone());
    add_user(&store, "admin@example.com", "adminpw");
    store.request_create(&request_form("Waiting Reader")).unwrap();
    let client = client_with(&pool);

    assert_eq!(log_in(&client, "admin@example.com", "adminpw"), Status::SeeOther);

    let response = client.get("/admin/requests").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body = response.into_string().unwrap_or_default();
    assert!(body.contains("Waiting Reader"));
}

#[test]
fn wrong_password_rerenders_login() {
    let pool = test_pool();
    let store = SqliteStore::new(pool.clone());
    add_user(&store, "admin@example.com", "adminpw");
    let client = client_with(&pool);

    assert_eq!(log_in(&client, "admin@example.com", "nope"), Status::Unauthorized);
}

#[test]
fn invalid_request_form_is_rejected() {
    let pool = test_pool();
    let client = client_with(&pool);

    let response = client
        .post("/pages/add-readers")
        .header(ContentType::Form)
        .body("name=Ali+Hassan&sample_link=not-a-url&district=Riyadh&mosque_link=https://maps.google.com/?q=x")
        .dispatch();
    assert_eq!(response.status(), Status::UnprocessableEntity);

    let store = SqliteStore::new(pool.clone());
    assert_eq!(store.request_count(), 0);
}

#[test]
fn valid_request_form_is_stored() {
    let pool = test_pool();
    let client = client_with(&pool);

    let response = client
        .post("/pages/add-readers")
        .header(ContentType::Form)
        .body("name=Ali+Hassan&sample_link=https://youtube.com/x&district=Riyadh&mosque_link=https://maps.google.com/x")
        .dispatch();
    assert_eq!(response.status(), Status::SeeOther);

    let store = SqliteStore::new(pool.clone());
    assert_eq!(store.request_count(), 1);
}

#[test]
fn anonymous_favorite_goes_to_login() {
    let pool = test_pool();
    let store = SqliteStore::new(pool.clone());
    let rid = store.reader_create(&reader_form("Reader")).unwrap();
    let client = client_with(&pool);

    let response = client
        .post(format!("/pages/readers/{}/favorite", rid))
        .dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response).as_deref(), Some("/login"));
    assert_eq!(store.favorite_count(), 0);
}

#[test]
fn public_pages_render() {
    let pool = test_pool();
    let store = SqliteStore::new(pool.clone());
    for i in 0..7 {
        store.reader_create(&reader_form(&format!("Reader {}", i))).unwrap();
    }
    let client = client_with(&pool);

    for uri in ["/", "/pages/readers", "/pages/readers?page=9", "/comments", "/login"] {
        let response = client.get(uri).dispatch();
        assert_eq!(response.status(), Status::Ok, "GET {}", uri);
    }
    assert_eq!(client.get("/pages/readers/9999").dispatch().status(), Status::NotFound);
}

fn admin_client(pool: &DbPool) -> Client {
    let store = SqliteStore::new(pool.clone());
    add_user(&store, "admin@example.com", "adminpw");
    let client = client_with(pool);
    assert_eq!(log_in(&client, "admin@example.com", "adminpw"), Status::SeeOther);
    client
}

fn post_form<'c>(client: &'c Client, uri: String, body: &str) -> LocalResponse<'c> {
    client
        .post(uri)
        .header(ContentType::Form)
        .body(body.to_string())
        .dispatch()
}

fn ar(key: &str) -> &str {
    i18n::t(Lang::Ar, key)
}

// ── Admin reciter form ──

#[test]
fn admin_reader_form_rejects_bad_input() {
    let pool = test_pool();
    let client = admin_client(&pool);
    let store = SqliteStore::new(pool.clone());

    let response = post_form(
        &client,
        "/admin/readers".to_string(),
        "name=Ali+Hassan&district=Riyadh&sample_link=nope&mosque_link=https://maps.google.com/x&image=",
    );
    assert_eq!(response.status(), Status::UnprocessableEntity);
    assert!(response.into_string().unwrap_or_default().contains(ar("err_url")));
    assert_eq!(store.reader_count(), 0);

    let response = post_form(
        &client,
        "/admin/readers".to_string(),
        "name=Ali+Hassan&district=Riyadh&sample_link=https://youtube.com/x&mosque_link=https://maps.google.com/x&image=",
    );
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(store.reader_count(), 1);

    let id = store.reader_latest(1)[0].id;
    let response = post_form(
        &client,
        format!("/admin/readers/{}", id),
        "name=A&district=Riyadh&sample_link=https://youtube.com/x&mosque_link=https://maps.google.com/x&image=",
    );
    assert_eq!(response.status(), Status::UnprocessableEntity);
    assert!(response.into_string().unwrap_or_default().contains(ar("err_name_length")));
    assert_eq!(store.reader_find_by_id(id).unwrap().name, "Ali Hassan");
}

#[test]
fn admin_delete_of_missing_reader_reports_not_found() {
    let pool = test_pool();
    let client = admin_client(&pool);

    let response = client.post("/admin/readers/4242/delete").dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response).as_deref(), Some("/admin"));

    let body = client.get("/admin").dispatch().into_string().unwrap_or_default();
    assert!(body.contains(ar("reader_not_found")));
}

// ── Request approval over HTTP ──

#[test]
fn approving_twice_creates_one_reader() {
    let pool = test_pool();
    let client = admin_client(&pool);
    let store = SqliteStore::new(pool.clone());
    let req = store.request_create(&request_form("Pending Reader")).unwrap();

    let response = client.post(format!("/admin/requests/{}/approve", req)).dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response).as_deref(), Some("/admin/requests"));
    assert_eq!(store.reader_count(), 1);
    assert_eq!(store.request_count(), 0);
    client.get("/admin/requests").dispatch();

    let response = client.post(format!("/admin/requests/{}/approve", req)).dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(store.reader_count(), 1);

    let body = client.get("/admin/requests").dispatch().into_string().unwrap_or_default();
    assert!(body.contains(ar("request_not_found")));
}

// ── Admin guard on POST ──

#[test]
fn admin_posts_redirect_by_role() {
    let pool = test_pool();
    let store = SqliteStore::new(pool.clone());
    add_user(&store, "admin@example.com", "adminpw");
    add_user(&store, "user@example.com", "userpw1");
    let rid = store.reader_create(&reader_form("Kept")).unwrap();

    let anonymous = client_with(&pool);
    let response = anonymous.post(format!("/admin/readers/{}/delete", rid)).dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response).as_deref(), Some("/login"));

    let client = client_with(&pool);
    assert_eq!(log_in(&client, "user@example.com", "userpw1"), Status::SeeOther);
    let response = client.post(format!("/admin/readers/{}/delete", rid)).dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response).as_deref(), Some("/"));

    assert!(store.reader_find_by_id(rid).is_some());
}

// ── Signup and codes ──

#[test]
fn signup_with_taken_email_is_rejected() {
    let pool = test_pool();
    let store = SqliteStore::new(pool.clone());
    add_user(&store, "taken@example.com", "secret1");
    let client = client_with(&pool);

    let response = post_form(
        &client,
        "/signup".to_string(),
        "first_name=Amal&last_name=Saleh&email=Taken@Example.com&password=secret1&confirm_password=secret1",
    );
    assert_eq!(response.status(), Status::UnprocessableEntity);
    assert!(response.into_string().unwrap_or_default().contains(ar("err_email_taken")));
    assert_eq!(store.user_count(), 1);
}

#[test]
fn signup_with_code_sends_to_verification() {
    let pool = test_pool();
    let store = SqliteStore::new(pool.clone());
    store.setting_set("signup_require_otp", "true").unwrap();
    let client = client_with(&pool);

    let response = post_form(
        &client,
        "/signup".to_string(),
        "first_name=Amal&last_name=Saleh&email=amal@example.com&password=secret1&confirm_password=secret1",
    );
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(
        location(&response).as_deref(),
        Some("/verify-otp?email=amal%40example.com")
    );
    assert!(store.user_get_by_email("amal@example.com").is_none());
}

#[test]
fn verify_code_rejects_wrong_expired_and_used() {
    let pool = test_pool();
    let store = SqliteStore::new(pool.clone());
    store.otp_create("wrong@example.com", "111111", "W", "R", 10).unwrap();
    store.otp_create("late@example.com", "222222", "L", "T", 10).unwrap();
    pool.get()
        .unwrap()
        .execute(
            "UPDATE email_otps SET expires_at = '2000-01-01 00:00:00' WHERE email = ?1",
            ["late@example.com"],
        )
        .unwrap();
    store.otp_create("used@example.com", "333333", "U", "S", 10).unwrap();
    assert!(store.otp_consume("used@example.com", "333333").is_some());
    let client = client_with(&pool);

    for (email, code) in [
        ("wrong@example.com", "999999"),
        ("late@example.com", "222222"),
        ("used@example.com", "333333"),
    ] {
        let response = post_form(
            &client,
            "/verify-otp".to_string(),
            &format!("email={}&otp={}&password=secret1", email, code),
        );
        assert_eq!(response.status(), Status::UnprocessableEntity, "{}", email);
        assert!(response.into_string().unwrap_or_default().contains(ar("otp_invalid")));
        assert!(store.user_get_by_email(email).is_none());
    }
}

#[test]
fn verify_code_creates_and_logs_in() {
    let pool = test_pool();
    let store = SqliteStore::new(pool.clone());
    store.otp_create("new@example.com", "123456", "Nour", "Hadi", 10).unwrap();
    let client = client_with(&pool);

    let response = post_form(
        &client,
        "/verify-otp".to_string(),
        "email=new@example.com&otp=123456&password=secret1",
    );
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response).as_deref(), Some("/"));

    let user = store.user_get_by_email("new@example.com").unwrap();
    assert_eq!(user.first_name, "Nour");
    assert_eq!(client.get("/profile").dispatch().status(), Status::Ok);

    // The code is spent
    assert!(store.otp_consume("new@example.com", "123456").is_none());
}

// ── Profile ──

const BOUNDARY: &str = "qurra-test-boundary";

fn upload_avatar<'c>(client: &'c Client, content_type: &str, bytes: &[u8]) -> LocalResponse<'c> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"avatar.bin\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    client
        .post("/profile/avatar")
        .header(ContentType::new("multipart", "form-data").with_params(("boundary", BOUNDARY)))
        .body(body)
        .dispatch()
}

#[test]
fn avatar_rejects_non_images() {
    let pool = test_pool();
    let client = admin_client(&pool);
    let store = SqliteStore::new(pool.clone());

    let response = upload_avatar(&client, "text/plain", b"not an image");
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response).as_deref(), Some("/profile"));

    let body = client.get("/profile").dispatch().into_string().unwrap_or_default();
    assert!(body.contains(ar("avatar_invalid_type")));
    assert!(store.user_get_by_email("admin@example.com").unwrap().avatar_url.is_none());
}

#[test]
fn avatar_rejects_oversize_uploads() {
    let pool = test_pool();
    let client = admin_client(&pool);
    let store = SqliteStore::new(pool.clone());
    store.setting_set("avatar_max_upload_mb", "1").unwrap();

    let big = vec![0u8; 1024 * 1024 + 512 * 1024];
    let response = upload_avatar(&client, "image/png", &big);
    assert_eq!(response.status(), Status::SeeOther);

    let body = client.get("/profile").dispatch().into_string().unwrap_or_default();
    assert!(body.contains(ar("avatar_too_large")));
    assert!(store.user_get_by_email("admin@example.com").unwrap().avatar_url.is_none());
}

#[test]
fn profile_delete_signs_out_after_removal() {
    let pool = test_pool();
    let client = admin_client(&pool);
    let store = SqliteStore::new(pool.clone());

    let response = client.post("/profile/delete").dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response).as_deref(), Some("/"));
    assert!(store.user_get_by_email("admin@example.com").is_none());

    let response = client.get("/profile").dispatch();
    assert_eq!(location(&response).as_deref(), Some("/login"));
}

#[test]
fn failed_profile_delete_keeps_session() {
    let pool = test_pool();
    let client = admin_client(&pool);
    let store = SqliteStore::new(pool.clone());
    pool.get().unwrap().execute_batch("DROP TABLE favorites;").unwrap();

    let response = client.post("/profile/delete").dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response).as_deref(), Some("/profile"));
    assert!(store.user_get_by_email("admin@example.com").is_some());

    assert_eq!(client.get("/profile").dispatch().status(), Status::Ok);
}
