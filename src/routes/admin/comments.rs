use std::sync::Arc;

use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::admin_context;
use crate::events::{ChangeAction, ChangeEvent, ChangeFeed};
use crate::i18n::{self, Lang};
use crate::pagination::Pagination;
use crate::render;
use crate::security::auth::AdminUser;
use crate::store::Store;

// ── Comments ───────────────────────────────────────────

#[get("/comments?<page>")]
pub fn comments_list(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    flash: Option<FlashMessage<'_>>,
    page: Option<i64>,
) -> Template {
    let store: &dyn Store = &***store;
    let pagination = Pagination::new(store.comment_count(), 20, page);
    let comments = store.comment_list(pagination.per_page, pagination.offset());

    let mut context = admin_context(store, lang, &admin, flash, "comments");
    render::merge(
        &mut context,
        json!({
            "comments": render::comment_views(&comments),
            "pagination": pagination,
            "has_prev": pagination.has_prev(),
            "has_next": pagination.has_next(),
        }),
    );
    Template::render("admin/comments", &context)
}

#[post("/comments/<id>/delete")]
pub fn comment_delete(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    feed: &State<ChangeFeed>,
    lang: Lang,
    id: i64,
) -> Flash<Redirect> {
    let back = Redirect::to("/admin/comments");
    if store.comment_find_by_id(id).is_none() {
        return Flash::error(back, i18n::t(lang, "generic_error"));
    }
    match store.comment_delete(id) {
        Ok(()) => {
            log::info!("Admin {} deleted comment {}", admin.user.id, id);
            feed.publish(ChangeEvent::new("comments", ChangeAction::Delete, id));
            Flash::success(back, i18n::t(lang, "comment_deleted"))
        }
        Err(e) => {
            log::error!("Deleting comment {} failed: {}", id, e);
            Flash::error(back, i18n::t(lang, "generic_error"))
        }
    }
}
