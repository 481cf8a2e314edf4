use std::sync::Arc;

use rocket::form::Form;
use rocket::http::Status;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::admin_context;
use crate::events::{ChangeAction, ChangeEvent, ChangeFeed};
use crate::i18n::{self, Lang};
use crate::models::reciter::ReciterForm;
use crate::models::stats::DashboardStats;
use crate::render;
use crate::security::auth::AdminUser;
use crate::store::Store;

// ── Dashboard ──────────────────────────────────────────

#[get("/?<q>")]
pub fn dashboard(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    flash: Option<FlashMessage<'_>>,
    q: Option<String>,
) -> Template {
    let store: &dyn Store = &***store;
    let query = q.unwrap_or_default();
    let readers = store.reader_search(&query);

    let mut context = admin_context(store, lang, &admin, flash, "dashboard");
    render::merge(
        &mut context,
        json!({
            "stats": DashboardStats::gather(store),
            "readers": render::reciter_cards(store, &readers, &[]),
            "q": query,
        }),
    );
    Template::render("admin/dashboard", &context)
}

// ── Reciter add / edit ─────────────────────────────────

fn form_page(
    store: &dyn Store,
    lang: Lang,
    admin: &AdminUser,
    editing: Option<i64>,
    form: &ReciterForm,
    errors: serde_json::Value,
) -> Template {
    let mut context = admin_context(store, lang, admin, None, "dashboard");
    let action = match editing {
        Some(id) => format!("/admin/readers/{}", id),
        None => "/admin/readers".to_string(),
    };
    render::merge(
        &mut context,
        json!({
            "editing": editing,
            "action": action,
            "form": form,
            "errors": errors,
        }),
    );
    Template::render("admin/reader_form", &context)
}

#[get("/readers/new")]
pub fn reader_new(admin: AdminUser, store: &State<Arc<dyn Store>>, lang: Lang) -> Template {
    form_page(&***store, lang, &admin, None, &ReciterForm::default(), json!({}))
}

#[post("/readers", data = "<form>")]
pub fn reader_create(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    feed: &State<ChangeFeed>,
    lang: Lang,
    form: Form<ReciterForm>,
) -> Result<Flash<Redirect>, (Status, Template)> {
    let store: &dyn Store = &***store;
    let form = form.into_inner();

    if let Err(errors) = form.validate() {
        return Err((
            Status::UnprocessableEntity,
            form_page(store, lang, &admin, None, &form, json!(errors.localized(lang))),
        ));
    }

    match store.reader_create(&form) {
        Ok(id) => {
            log::info!("Admin {} added reciter {}", admin.user.id, id);
            feed.publish(ChangeEvent::new("readers", ChangeAction::Insert, id));
            Ok(Flash::success(Redirect::to("/admin"), i18n::t(lang, "reader_added")))
        }
        Err(e) => {
            log::error!("Failed to add reciter: {}", e);
            Ok(Flash::error(Redirect::to("/admin"), i18n::t(lang, "generic_error")))
        }
    }
}

#[get("/readers/<id>/edit")]
pub fn reader_edit(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    id: i64,
) -> Option<Template> {
    let reader = store.reader_find_by_id(id)?;
    Some(form_page(
        &***store,
        lang,
        &admin,
        Some(id),
        &ReciterForm::from_reciter(&reader),
        json!({}),
    ))
}

#[post("/readers/<id>", data = "<form>")]
pub fn reader_update(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    feed: &State<ChangeFeed>,
    lang: Lang,
    id: i64,
    form: Form<ReciterForm>,
) -> Result<Flash<Redirect>, (Status, Template)> {
    let store: &dyn Store = &***store;
    let form = form.into_inner();

    if let Err(errors) = form.validate() {
        return Err((
            Status::UnprocessableEntity,
            form_page(store, lang, &admin, Some(id), &form, json!(errors.localized(lang))),
        ));
    }

    match store.reader_update(id, &form) {
        Ok(()) => {
            log::info!("Admin {} updated reciter {}", admin.user.id, id);
            feed.publish(ChangeEvent::new("readers", ChangeAction::Update, id));
            Ok(Flash::success(Redirect::to("/admin"), i18n::t(lang, "reader_updated")))
        }
        Err(e) => {
            log::error!("Failed to update reciter {}: {}", id, e);
            Ok(Flash::error(Redirect::to("/admin"), i18n::t(lang, "generic_error")))
        }
    }
}

#[post("/readers/<id>/delete")]
pub fn reader_delete(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    feed: &State<ChangeFeed>,
    lang: Lang,
    id: i64,
) -> Flash<Redirect> {
    match store.reader_delete(id) {
        Ok(true) => {
            log::info!("Admin {} deleted reciter {}", admin.user.id, id);
            feed.publish(ChangeEvent::new("readers", ChangeAction::Delete, id));
            Flash::success(Redirect::to("/admin"), i18n::t(lang, "reader_deleted"))
        }
        Ok(false) => Flash::error(Redirect::to("/admin"), i18n::t(lang, "reader_not_found")),
        Err(e) => {
            log::error!("Failed to delete reciter {}: {}", id, e);
            Flash::error(Redirect::to("/admin"), i18n::t(lang, "generic_error"))
        }
    }
}
