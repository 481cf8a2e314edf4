use rocket::request::FlashMessage;
use serde_json::{json, Value};

use crate::i18n::{self, Lang};
use crate::images;
use crate::models::comment::Comment;
use crate::models::reciter::Reciter;
use crate::models::user::User;
use crate::ranking::FavoriteTally;
use crate::store::Store;

/// Context every page template starts from: UI strings, language and
/// direction, the current viewer and any pending toast.
pub fn base_context(
    store: &dyn Store,
    lang: Lang,
    viewer: Option<&User>,
    flash: Option<FlashMessage<'_>>,
) -> Value {
    let allowed = images::allowed_hosts(&store.setting_get_or("image_domains", ""));
    let viewer_json = viewer.map(|u| {
        let mut v = u.safe_json();
        v["avatar"] = json!(images::display_url(u.avatar_url.as_deref(), u.id, &allowed));
        v
    });

    let mut context = json!({
        "t": i18n::texts(lang),
        "lang": lang.code(),
        "dir": lang.dir(),
        "other_lang": lang.other().code(),
        "site_name": store.setting_get_or("site_name", "قرّاء"),
        "viewer": viewer_json,
        "errors": {},
        "form": {},
    });

    if let Some(f) = flash {
        context["flash_kind"] = json!(f.kind());
        context["flash_msg"] = json!(f.message());
    }

    context
}

/// Shallow-merges the keys of `extra` into `base`.
pub fn merge(base: &mut Value, extra: Value) {
    if let (Some(target), Value::Object(source)) = (base.as_object_mut(), extra) {
        for (k, v) in source {
            target.insert(k, v);
        }
    }
}

/// Template view of a reciter card.
pub fn reciter_card(r: &Reciter, allowed: &[String], favorite: bool) -> Value {
    json!({
        "id": r.id,
        "name": r.name,
        "district": r.district,
        "sample_link": r.sample_link,
        "mosque_link": r.mosque_link,
        "image": images::display_url(r.image.as_deref(), r.id, allowed),
        "raw_image": r.image,
        "created_at": r.created_at.format("%Y-%m-%d").to_string(),
        "is_favorite": favorite,
    })
}

pub fn reciter_cards(store: &dyn Store, reciters: &[Reciter], favorite_ids: &[i64]) -> Vec<Value> {
    let allowed = images::allowed_hosts(&store.setting_get_or("image_domains", ""));
    reciters
        .iter()
        .map(|r| reciter_card(r, &allowed, favorite_ids.contains(&r.id)))
        .collect()
}

pub fn ranked_cards(store: &dyn Store, ranked: &[FavoriteTally]) -> Vec<Value> {
    let allowed = images::allowed_hosts(&store.setting_get_or("image_domains", ""));
    ranked
        .iter()
        .map(|t| {
            let mut card = reciter_card(&t.reciter, &allowed, false);
            card["favorites"] = json!(t.count);
            card
        })
        .collect()
}

pub fn comment_views(comments: &[Comment]) -> Vec<Value> {
    comments
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "author_name": c.author_name,
                "body": c.body,
                "created_at": c.created_at.format("%Y-%m-%d").to_string(),
            })
        })
        .collect()
}
