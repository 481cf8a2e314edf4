use std::path::PathBuf;
use std::sync::Arc;

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::http::{CookieJar, Status};
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::i18n::{self, Lang};
use crate::images;
use crate::render;
use crate::security::auth::{self, AuthenticatedUser};
use crate::store::Store;
use crate::validation::{self, FormErrors};

#[derive(Debug, FromForm)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if validation::is_blank(&self.first_name) {
            errors.add("first_name", "err_first_name_required");
        }
        if validation::is_blank(&self.last_name) {
            errors.add("last_name", "err_last_name_required");
        }
        errors.into_result()
    }
}

#[derive(FromForm)]
pub struct AvatarUpload<'r> {
    pub avatar: TempFile<'r>,
}

#[get("/profile")]
pub fn profile_page(
    current: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let user = &current.user;
    let mut context = render::base_context(&***store, lang, Some(user), flash);
    render::merge(
        &mut context,
        json!({
            "page": "profile",
            "form": { "first_name": user.first_name, "last_name": user.last_name },
            "max_upload_mb": store.setting_get_i64("avatar_max_upload_mb").max(1),
        }),
    );
    Template::render("profile", &context)
}

#[post("/profile", data = "<form>")]
pub fn profile_update(
    current: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    form: Form<ProfileForm>,
) -> Result<Flash<Redirect>, (Status, Template)> {
    let user = &current.user;

    if let Err(errors) = form.validate() {
        let mut context = render::base_context(&***store, lang, Some(user), None);
        render::merge(
            &mut context,
            json!({
                "page": "profile",
                "errors": errors.localized(lang),
                "form": { "first_name": form.first_name, "last_name": form.last_name },
                "max_upload_mb": store.setting_get_i64("avatar_max_upload_mb").max(1),
            }),
        );
        return Err((Status::UnprocessableEntity, Template::render("profile", &context)));
    }

    match store.user_update_names(user.id, &form.first_name, &form.last_name) {
        Ok(()) => Ok(Flash::success(
            Redirect::to("/profile"),
            i18n::t(lang, "profile_updated"),
        )),
        Err(e) => {
            log::error!("Profile update failed for user {}: {}", user.id, e);
            Ok(Flash::error(Redirect::to("/profile"), i18n::t(lang, "generic_error")))
        }
    }
}

#[post("/profile/avatar", data = "<upload>")]
pub async fn avatar_upload(
    current: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    upload: Form<AvatarUpload<'_>>,
) -> Flash<Redirect> {
    let user = current.user;
    let back = Redirect::to("/profile");
    let mut upload = upload.into_inner();

    let content_type = upload.avatar.content_type().map(|ct| ct.to_string());
    if !images::is_image_type(content_type.as_deref()) {
        return Flash::error(back, i18n::t(lang, "avatar_invalid_type"));
    }

    let max_mb = store.setting_get_i64("avatar_max_upload_mb");
    if !images::check_file_size(max_mb, upload.avatar.len()) {
        return Flash::error(back, i18n::t(lang, "avatar_too_large"));
    }

    // Small uploads may only live in memory, so give the decoder a real file
    let tmp = std::env::temp_dir().join(format!("qurra-upload-{}", uuid::Uuid::new_v4()));
    if let Err(e) = upload.avatar.copy_to(&tmp).await {
        log::warn!("Could not stage avatar upload for user {}: {}", user.id, e);
        return Flash::error(back, i18n::t(lang, "avatar_failed"));
    }
    let size = store.setting_get_i64("avatar_size").clamp(32, 1024) as u32;

    let src = tmp.clone();
    let processed = rocket::tokio::task::spawn_blocking(move || {
        images::process_avatar(&src, images::AVATAR_DIR, size)
    })
    .await
    .map_err(|e| e.to_string())
    .and_then(|r| r);
    let _ = rocket::tokio::fs::remove_file(&tmp).await;

    let file_name = match processed {
        Ok(name) => name,
        Err(e) => {
            log::warn!("Avatar processing failed for user {}: {}", user.id, e);
            return Flash::error(back, i18n::t(lang, "avatar_failed"));
        }
    };

    let public_url = format!("/uploads/avatars/{}", file_name);
    match store.user_update_avatar(user.id, &public_url) {
        Ok(()) => {
            if let Some(old) = user.avatar_url.as_deref() {
                images::delete_avatar(old);
            }
            Flash::success(back, i18n::t(lang, "avatar_updated"))
        }
        Err(e) => {
            log::error!("Saving avatar for user {} failed: {}", user.id, e);
            images::delete_avatar(&public_url);
            Flash::error(back, i18n::t(lang, "avatar_failed"))
        }
    }
}

#[post("/profile/delete")]
pub fn profile_delete(
    current: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
    lang: Lang,
    cookies: &CookieJar<'_>,
) -> Flash<Redirect> {
    let user = current.user;
    match store.user_delete(user.id) {
        Ok(()) => {
            auth::logout(&***store, cookies);
            if let Some(avatar) = user.avatar_url.as_deref() {
                images::delete_avatar(avatar);
            }
            log::info!("Account {} deleted", user.id);
            Flash::success(Redirect::to("/"), i18n::t(lang, "account_deleted"))
        }
        Err(e) => {
            log::error!("Account deletion failed for user {}: {}", user.id, e);
            Flash::error(Redirect::to("/profile"), i18n::t(lang, "generic_error"))
        }
    }
}

/// Anonymous visitors hitting any profile page are sent to log in.
#[get("/profile", rank = 2)]
pub fn profile_login_redirect() -> Redirect {
    Redirect::to("/login")
}

#[post("/profile/<_path..>", rank = 2)]
pub fn profile_post_login_redirect(_path: PathBuf) -> Redirect {
    Redirect::to("/login")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        profile_page,
        profile_update,
        avatar_upload,
        profile_delete,
        profile_login_redirect,
        profile_post_login_redirect,
    ]
}
