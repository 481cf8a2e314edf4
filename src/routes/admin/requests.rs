use std::sync::Arc;

use rocket::request::FlashMessage;
use rocket::response::stream::{Event, EventStream};
use rocket::response::{Flash, Redirect};
use rocket::tokio::select;
use rocket::tokio::sync::broadcast::error::RecvError;
use rocket::{Shutdown, State};
use rocket_dyn_templates::Template;
use serde_json::json;

use super::admin_context;
use crate::events::{ChangeAction, ChangeEvent, ChangeFeed};
use crate::i18n::{self, Lang};
use crate::render;
use crate::security::auth::AdminUser;
use crate::store::Store;

// ── Pending requests ───────────────────────────────────

#[get("/requests")]
pub fn requests_list(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let store: &dyn Store = &***store;
    let requests: Vec<serde_json::Value> = store
        .request_list()
        .iter()
        .map(|r| {
            json!({
                "id": r.id,
                "name": r.name,
                "district": r.district,
                "sample_link": r.sample_link,
                "mosque_link": r.mosque_link,
                "created_at": r.created_at.format("%Y-%m-%d").to_string(),
            })
        })
        .collect();

    let mut context = admin_context(store, lang, &admin, flash, "requests");
    render::merge(&mut context, json!({ "requests": requests }));
    Template::render("admin/requests", &context)
}

#[post("/requests/<id>/approve")]
pub fn request_approve(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    feed: &State<ChangeFeed>,
    lang: Lang,
    id: i64,
) -> Flash<Redirect> {
    let back = Redirect::to("/admin/requests");
    let default_image = store.setting_get_or("default_reciter_image", "");

    match store.request_approve(id, &default_image) {
        Ok(Some(reader_id)) => {
            log::info!(
                "Admin {} approved request {} as reciter {}",
                admin.user.id,
                id,
                reader_id
            );
            feed.publish(ChangeEvent::new("readers", ChangeAction::Insert, reader_id));
            feed.publish(ChangeEvent::new("requests", ChangeAction::Delete, id));
            Flash::success(back, i18n::t(lang, "request_approved"))
        }
        Ok(None) => Flash::error(back, i18n::t(lang, "request_not_found")),
        Err(e) => {
            log::error!("Approving request {} failed: {}", id, e);
            Flash::error(back, i18n::t(lang, "generic_error"))
        }
    }
}

#[post("/requests/<id>/delete")]
pub fn request_delete(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    feed: &State<ChangeFeed>,
    lang: Lang,
    id: i64,
) -> Flash<Redirect> {
    let back = Redirect::to("/admin/requests");
    match store.request_delete(id) {
        Ok(true) => {
            log::info!("Admin {} deleted request {}", admin.user.id, id);
            feed.publish(ChangeEvent::new("requests", ChangeAction::Delete, id));
            Flash::success(back, i18n::t(lang, "request_deleted"))
        }
        Ok(false) => Flash::error(back, i18n::t(lang, "request_not_found")),
        Err(e) => {
            log::error!("Deleting request {} failed: {}", id, e);
            Flash::error(back, i18n::t(lang, "generic_error"))
        }
    }
}

/// Server-Sent Events for changes to the requests table. The list page
/// reloads itself on each `change` event.
#[get("/requests/events")]
pub async fn request_events(
    _admin: AdminUser,
    feed: &State<ChangeFeed>,
    mut end: Shutdown,
) -> EventStream![] {
    let mut rx = feed.subscribe();
    EventStream! {
        loop {
            let event = select! {
                msg = rx.recv() => match msg {
                    Ok(event) => event,
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        log::debug!("SSE subscriber lagged, skipped {} events", skipped);
                        continue;
                    }
                },
                _ = &mut end => break,
            };
            if event.table == "requests" {
                yield Event::json(&event).event("change");
            }
        }
    }
}
