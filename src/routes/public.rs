use std::sync::Arc;

use rocket::form::Form;
use rocket::http::{CookieJar, Status};
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::events::{ChangeAction, ChangeEvent, ChangeFeed};
use crate::i18n::{self, Lang};
use crate::models::comment::CommentForm;
use crate::models::request::RequestForm;
use crate::pagination::{Pagination, READERS_PER_PAGE};
use crate::ranking;
use crate::render;
use crate::security::auth::Viewer;
use crate::store::Store;

const COMMENTS_PER_PAGE: i64 = 20;

/// Only same-site relative paths are followed after a redirect.
pub(crate) fn safe_back(back: Option<String>, default: &str) -> String {
    match back {
        Some(b) if b.starts_with('/') && !b.starts_with("//") => b,
        _ => default.to_string(),
    }
}

// ── Home ───────────────────────────────────────────────

#[get("/")]
pub fn home(
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    viewer: Viewer,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let store: &dyn Store = &***store;
    let top = ranking::top_reciters(store.favorite_tallies(), store.reader_latest(10), 3);
    let latest = store.reader_latest(8);
    let favorite_ids = viewer
        .0
        .as_ref()
        .map(|u| store.favorite_ids_for_user(u.id))
        .unwrap_or_default();

    let mut context = render::base_context(store, lang, viewer.0.as_ref(), flash);
    render::merge(
        &mut context,
        json!({
            "page": "home",
            "top_reciters": render::ranked_cards(store, &top),
            "latest_reciters": render::reciter_cards(store, &latest, &favorite_ids),
            "latest_comments": render::comment_views(&store.comment_latest(3)),
        }),
    );
    Template::render("home", &context)
}

// ── Reciters ───────────────────────────────────────────

#[get("/pages/readers?<page>")]
pub fn readers_list(
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    viewer: Viewer,
    flash: Option<FlashMessage<'_>>,
    page: Option<i64>,
) -> Template {
    let store: &dyn Store = &***store;
    let pagination = Pagination::new(store.reader_count(), READERS_PER_PAGE, page);
    let readers = store.reader_list(pagination.per_page, pagination.offset());
    let favorite_ids = viewer
        .0
        .as_ref()
        .map(|u| store.favorite_ids_for_user(u.id))
        .unwrap_or_default();

    let mut context = render::base_context(store, lang, viewer.0.as_ref(), flash);
    render::merge(
        &mut context,
        json!({
            "page": "readers",
            "readers": render::reciter_cards(store, &readers, &favorite_ids),
            "pagination": pagination,
            "has_prev": pagination.has_prev(),
            "has_next": pagination.has_next(),
        }),
    );
    Template::render("readers", &context)
}

#[get("/pages/readers/<id>")]
pub fn reader_detail(
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    viewer: Viewer,
    flash: Option<FlashMessage<'_>>,
    id: i64,
) -> Option<Template> {
    let store: &dyn Store = &***store;
    let reader = store.reader_find_by_id(id)?;
    let is_favorite = viewer
        .0
        .as_ref()
        .map(|u| store.favorite_exists(u.id, id))
        .unwrap_or(false);

    let mut context = render::base_context(store, lang, viewer.0.as_ref(), flash);
    let card = render::reciter_cards(store, std::slice::from_ref(&reader), &[])
        .into_iter()
        .next();
    render::merge(
        &mut context,
        json!({
            "page": "readers",
            "reader": card,
            "is_favorite": is_favorite,
        }),
    );
    Some(Template::render("reader", &context))
}

#[post("/pages/readers/<id>/favorite?<back>")]
pub fn favorite_toggle(
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    viewer: Viewer,
    id: i64,
    back: Option<String>,
) -> Flash<Redirect> {
    let back = safe_back(back, "/pages/readers");
    let user = match viewer.0 {
        Some(u) => u,
        None => {
            return Flash::error(
                Redirect::to("/login"),
                i18n::t(lang, "favorite_login_required"),
            )
        }
    };

    if store.reader_find_by_id(id).is_none() {
        return Flash::error(Redirect::to(back), i18n::t(lang, "reader_not_found"));
    }

    match store.favorite_toggle(user.id, id) {
        Ok(true) => Flash::success(Redirect::to(back), i18n::t(lang, "favorite_added")),
        Ok(false) => Flash::success(Redirect::to(back), i18n::t(lang, "favorite_removed")),
        Err(e) => {
            log::error!("Favorite toggle failed for user {} reader {}: {}", user.id, id, e);
            Flash::error(Redirect::to(back), i18n::t(lang, "generic_error"))
        }
    }
}

// ── Reciter requests ───────────────────────────────────

#[get("/pages/add-readers")]
pub fn add_reader_page(
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    viewer: Viewer,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let mut context = render::base_context(&***store, lang, viewer.0.as_ref(), flash);
    context["page"] = json!("add_reader");
    Template::render("add_reader", &context)
}

#[post("/pages/add-readers", data = "<form>")]
pub fn add_reader_submit(
    store: &State<Arc<dyn Store>>,
    feed: &State<ChangeFeed>,
    lang: Lang,
    viewer: Viewer,
    form: Form<RequestForm>,
) -> Result<Flash<Redirect>, (Status, Template)> {
    let form = form.into_inner();
    let rerender = |errors: serde_json::Value, flash_msg: Option<&str>| {
        let mut context = render::base_context(&***store, lang, viewer.0.as_ref(), None);
        render::merge(
            &mut context,
            json!({ "page": "add_reader", "errors": errors, "form": form }),
        );
        if let Some(msg) = flash_msg {
            context["flash_kind"] = json!("error");
            context["flash_msg"] = json!(msg);
        }
        Template::render("add_reader", &context)
    };

    if let Err(errors) = form.validate() {
        return Err((
            Status::UnprocessableEntity,
            rerender(json!(errors.localized(lang)), None),
        ));
    }

    match store.request_create(&form) {
        Ok(id) => {
            feed.publish(ChangeEvent::new("requests", ChangeAction::Insert, id));
            Ok(Flash::success(
                Redirect::to("/pages/add-readers"),
                i18n::t(lang, "request_sent"),
            ))
        }
        Err(e) => {
            log::error!("Failed to save reciter request: {}", e);
            Err((
                Status::InternalServerError,
                rerender(json!({}), Some(i18n::t(lang, "generic_error"))),
            ))
        }
    }
}

// ── Comments ───────────────────────────────────────────

#[get("/comments?<page>")]
pub fn comments_wall(
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    viewer: Viewer,
    flash: Option<FlashMessage<'_>>,
    page: Option<i64>,
) -> Template {
    let store: &dyn Store = &***store;
    let pagination = Pagination::new(store.comment_count(), COMMENTS_PER_PAGE, page);
    let comments = store.comment_list(pagination.per_page, pagination.offset());

    let mut context = render::base_context(store, lang, viewer.0.as_ref(), flash);
    render::merge(
        &mut context,
        json!({
            "page": "comments",
            "comments": render::comment_views(&comments),
            "pagination": pagination,
            "has_prev": pagination.has_prev(),
            "has_next": pagination.has_next(),
        }),
    );
    Template::render("comments", &context)
}

#[get("/comments/new")]
pub fn comment_new_page(
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    viewer: Viewer,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let mut context = render::base_context(&***store, lang, viewer.0.as_ref(), flash);
    let author = viewer
        .0
        .as_ref()
        .map(|u| u.display_name())
        .unwrap_or_default();
    render::merge(
        &mut context,
        json!({ "page": "comments", "form": { "author_name": author } }),
    );
    Template::render("comment_new", &context)
}

#[post("/comments/new", data = "<form>")]
pub fn comment_new_submit(
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    viewer: Viewer,
    form: Form<CommentForm>,
) -> Result<Flash<Redirect>, (Status, Template)> {
    let form = form.into_inner();

    if let Err(errors) = form.validate() {
        let mut context = render::base_context(&***store, lang, viewer.0.as_ref(), None);
        render::merge(
            &mut context,
            json!({
                "page": "comments",
                "errors": errors.localized(lang),
                "form": { "author_name": form.author_name, "body": form.body },
            }),
        );
        return Err((Status::UnprocessableEntity, Template::render("comment_new", &context)));
    }

    let user_id = viewer.0.as_ref().map(|u| u.id);
    match store.comment_create(user_id, &form) {
        Ok(_) => Ok(Flash::success(
            Redirect::to("/comments"),
            i18n::t(lang, "comment_saved"),
        )),
        Err(e) => {
            // Honeypot hits land here too; answer them like any failure
            log::warn!("Comment rejected: {}", e);
            Ok(Flash::error(
                Redirect::to("/comments/new"),
                i18n::t(lang, "generic_error"),
            ))
        }
    }
}

// ── Language switch ────────────────────────────────────

#[get("/lang/<code>?<back>")]
pub fn switch_lang(cookies: &CookieJar<'_>, code: &str, back: Option<String>) -> Redirect {
    if let Some(lang) = Lang::from_code(code) {
        i18n::set_lang_cookie(cookies, lang);
    }
    Redirect::to(safe_back(back, "/"))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        home,
        readers_list,
        reader_detail,
        favorite_toggle,
        add_reader_page,
        add_reader_submit,
        comments_wall,
        comment_new_page,
        comment_new_submit,
        switch_lang,
    ]
}

#[cfg(test)]
mod tests {
    use super::safe_back;

    #[test]
    fn back_links_stay_on_site() {
        assert_eq!(safe_back(Some("/pages/readers?page=2".into()), "/"), "/pages/readers?page=2");
        assert_eq!(safe_back(Some("//evil.example".into()), "/"), "/");
        assert_eq!(safe_back(Some("https://evil.example".into()), "/x"), "/x");
        assert_eq!(safe_back(None, "/"), "/");
    }
}
