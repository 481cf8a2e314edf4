use std::path::PathBuf;

use rocket::request::FlashMessage;
use rocket::response::Redirect;
use serde_json::{json, Value};

use crate::i18n::Lang;
use crate::render;
use crate::security::auth::{AdminUser, Viewer};
use crate::security::guard::admin_access;
use crate::store::Store;

pub mod comments;
pub mod dashboard;
pub mod requests;

/// Base context for admin pages, with the active tab.
pub(crate) fn admin_context(
    store: &dyn Store,
    lang: Lang,
    admin: &AdminUser,
    flash: Option<FlashMessage<'_>>,
    tab: &str,
) -> Value {
    let mut context = render::base_context(store, lang, Some(&admin.user), flash);
    render::merge(
        &mut context,
        json!({
            "page": "admin",
            "admin_tab": tab,
            "pending_requests": store.request_count(),
        }),
    );
    context
}

/// Catch-all for any /admin/* route that failed the AdminUser guard.
/// Anonymous visitors go to the login page, other users go home.
#[get("/<_path..>", rank = 99)]
pub fn admin_fallback_get(_path: PathBuf, viewer: Viewer) -> Option<Redirect> {
    admin_access(viewer.0.as_ref())
        .redirect_target()
        .map(Redirect::to)
}

#[post("/<_path..>", rank = 99)]
pub fn admin_fallback_post(_path: PathBuf, viewer: Viewer) -> Option<Redirect> {
    admin_access(viewer.0.as_ref())
        .redirect_target()
        .map(Redirect::to)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        dashboard::dashboard,
        dashboard::reader_new,
        dashboard::reader_create,
        dashboard::reader_edit,
        dashboard::reader_update,
        dashboard::reader_delete,
        requests::requests_list,
        requests::request_approve,
        requests::request_delete,
        requests::request_events,
        comments::comments_list,
        comments::comment_delete,
        admin_fallback_get,
        admin_fallback_post,
    ]
}
