#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::Header;
use rocket::{Build, Request, Rocket};
use rocket_dyn_templates::Template;
use serde_json::json;

mod boot;
mod db;
mod email;
mod events;
mod i18n;
mod images;
mod models;
mod pagination;
mod ranking;
mod render;
mod routes;
mod security;
mod store;
mod tasks;
mod validation;

#[cfg(test)]
mod tests;

use events::ChangeFeed;
use i18n::Lang;
use store::sqlite::SqliteStore;
use store::Store;

/// Keeps browsers from caching pages that depend on the session.
pub struct NoCachePrivate;

#[rocket::async_trait]
impl Fairing for NoCachePrivate {
    fn info(&self) -> Info {
        Info { name: "No-Cache Private Pages", kind: Kind::Response }
    }

    async fn on_response<'r>(&self, req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        let path = req.uri().path();
        if path.starts_with("/admin") || path.starts_with("/profile") {
            res.set_header(Header::new("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0"));
            res.set_header(Header::new("Pragma", "no-cache"));
        }
    }
}

fn error_page(req: &Request<'_>, code: u16, title_key: &str) -> Template {
    let lang = req
        .cookies()
        .get(i18n::LANG_COOKIE)
        .and_then(|c| Lang::from_code(c.value()))
        .unwrap_or_default();
    let site_name = req
        .rocket()
        .state::<Arc<dyn Store>>()
        .map(|s| s.setting_get_or("site_name", "قرّاء"))
        .unwrap_or_else(|| "قرّاء".to_string());

    let context = json!({
        "t": i18n::texts(lang),
        "lang": lang.code(),
        "dir": lang.dir(),
        "other_lang": lang.other().code(),
        "site_name": site_name,
        "viewer": null,
        "page": "error",
        "code": code,
        "title": i18n::t(lang, title_key),
    });
    Template::render("error", &context)
}

#[catch(404)]
fn not_found(req: &Request<'_>) -> Template {
    error_page(req, 404, "not_found_title")
}

#[catch(500)]
fn server_error(req: &Request<'_>) -> Template {
    error_page(req, 500, "server_error_title")
}

/// Assembles the application around an already-migrated store.
pub fn build_rocket(store: Arc<dyn Store>) -> Rocket<Build> {
    rocket::build()
        .manage(store)
        .manage(ChangeFeed::default())
        .attach(Template::fairing())
        .attach(NoCachePrivate)
        .attach(tasks::BackgroundTasks)
        .mount("/static", FileServer::from("website/static"))
        .mount("/uploads", FileServer::from("website/uploads"))
        .mount("/", routes::public::routes())
        .mount("/", routes::auth::routes())
        .mount("/", routes::profile::routes())
        .mount("/admin", routes::admin::routes())
        .register("/", catchers![not_found, server_error])
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    // Boot check: verify/create directories, validate critical files
    boot::run();

    let db_path = db::db_path();
    let store = match SqliteStore::new_at(&db_path) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Failed to open database at {}: {}", db_path, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = store.run_migrations().and_then(|_| store.seed_defaults()) {
        log::error!("Failed to prepare database: {}", e);
        std::process::exit(1);
    }
    log::info!("Database ready at {}", db_path);

    build_rocket(Arc::new(store))
}
