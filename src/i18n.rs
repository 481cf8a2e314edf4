use std::collections::BTreeMap;

use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::request::{FromRequest, Outcome, Request};
use serde::Serialize;

pub const LANG_COOKIE: &str = "lang";

/// UI language. Arabic is the default and renders right-to-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Ar,
    En,
}

impl Lang {
    pub fn from_code(code: &str) -> Option<Lang> {
        match code.trim().to_ascii_lowercase().as_str() {
            "ar" => Some(Lang::Ar),
            "en" => Some(Lang::En),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Lang::Ar => "ar",
            Lang::En => "en",
        }
    }

    pub fn dir(self) -> &'static str {
        match self {
            Lang::Ar => "rtl",
            Lang::En => "ltr",
        }
    }

    /// The language offered by the switcher.
    pub fn other(self) -> Lang {
        match self {
            Lang::Ar => Lang::En,
            Lang::En => Lang::Ar,
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Lang {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let lang = request
            .cookies()
            .get(LANG_COOKIE)
            .and_then(|c| Lang::from_code(c.value()))
            .unwrap_or_default();
        Outcome::Success(lang)
    }
}

pub fn set_lang_cookie(cookies: &CookieJar<'_>, lang: Lang) {
    let mut cookie = Cookie::new(LANG_COOKIE, lang.code());
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    cookies.add(cookie);
}

/// (key, arabic, english)
const TEXTS: &[(&str, &str, &str)] = &[
    // Navigation
    ("nav_home", "الرئيسية", "Home"),
    ("nav_readers", "القراء", "Reciters"),
    ("nav_add_reader", "اقترح قارئاً", "Suggest a reciter"),
    ("nav_comments", "التعليقات", "Comments"),
    ("nav_login", "تسجيل الدخول", "Log in"),
    ("nav_logout", "تسجيل الخروج", "Log out"),
    ("nav_profile", "الملف الشخصي", "Profile"),
    ("nav_admin", "لوحة التحكم", "Dashboard"),
    ("lang_switch", "English", "العربية"),
    ("footer_rights", "جميع الحقوق محفوظة", "All rights reserved"),
    ("footer_links", "روابط سريعة", "Quick links"),
    // Home sections
    ("hero_title", "اكتشف قرّاء القرآن الكريم في حيّك", "Discover Quran reciters in your neighbourhood"),
    ("hero_subtitle", "استمع إلى نماذج التلاوة وتعرّف على مساجد القرّاء", "Listen to recitation samples and find where each reciter leads prayer"),
    ("hero_cta", "تصفح القراء", "Browse reciters"),
    ("about_title", "عن المنصة", "About"),
    ("about_body", "منصة مجتمعية تجمع قرّاء الأحياء في مكان واحد ليسهل الوصول إليهم.", "A community directory that gathers neighbourhood reciters in one place."),
    ("services_title", "خدماتنا", "What you can do"),
    ("service_listen_title", "استمع", "Listen"),
    ("service_listen_body", "نماذج تلاوة لكل قارئ", "A recitation sample for every reciter"),
    ("service_locate_title", "اعثر على المسجد", "Find the mosque"),
    ("service_locate_body", "رابط مباشر لموقع المسجد", "A direct link to the mosque location"),
    ("service_suggest_title", "اقترح قارئاً", "Suggest a reciter"),
    ("service_suggest_body", "أرسل طلباً لإضافة قارئ جديد", "Send a request to add a new reciter"),
    ("top_reciters", "أبرز القراء", "Top reciters"),
    ("latest_reciters", "أحدث القراء", "Latest reciters"),
    ("latest_comments", "أحدث التعليقات", "Latest comments"),
    ("favorites_count", "إعجاب", "favorites"),
    // Reciters
    ("readers_title", "قائمة القراء", "Reciters"),
    ("district", "الحي", "District"),
    ("mosque", "المسجد", "Mosque"),
    ("open_map", "افتح الخريطة", "Open map"),
    ("sample", "نموذج التلاوة", "Recitation sample"),
    ("listen_here", "استمع هنا", "Listen here"),
    ("details", "التفاصيل", "Details"),
    ("back", "رجوع", "Back"),
    ("prev", "السابق", "Previous"),
    ("next", "التالي", "Next"),
    ("page_label", "الصفحة", "Page"),
    ("of_label", "من", "of"),
    ("no_readers", "لا يوجد قراء", "No reciters yet"),
    ("favorite_add", "أضف إلى المفضلة", "Add to favorites"),
    ("favorite_remove", "أزل من المفضلة", "Remove from favorites"),
    ("favorite_login_required", "يجب تسجيل الدخول لإضافة المفضلة", "Log in to add favorites"),
    ("favorite_added", "تمت الإضافة إلى المفضلة", "Added to favorites"),
    ("favorite_removed", "تمت الإزالة من المفضلة", "Removed from favorites"),
    ("reader_not_found", "القارئ غير موجود", "Reciter not found"),
    // Request form
    ("request_title", "تقديم طلب إضافة قارئ", "Request a new reciter"),
    ("field_name", "اسم القارئ", "Reciter name"),
    ("field_sample_link", "رابط نموذج التلاوة", "Recitation sample link"),
    ("field_district", "اسم الحي", "District"),
    ("field_mosque_link", "رابط موقع المسجد", "Mosque location link"),
    ("field_image", "رابط الصورة (اختياري)", "Image link (optional)"),
    ("submit_request", "إرسال الطلب", "Send request"),
    ("request_sent", "تم إرسال الطلب بنجاح", "Your request was sent"),
    // Comments
    ("comments_title", "التعليقات", "Comments"),
    ("comment_new_title", "أضف تعليقاً", "Leave a comment"),
    ("field_author", "الاسم", "Name"),
    ("field_body", "التعليق", "Comment"),
    ("submit_comment", "إرسال", "Send"),
    ("comment_saved", "تم نشر تعليقك", "Your comment was posted"),
    ("no_comments", "لا توجد تعليقات بعد", "No comments yet"),
    // Auth
    ("login_title", "تسجيل الدخول", "Log in"),
    ("signup_title", "إنشاء حساب", "Create account"),
    ("field_first_name", "الاسم الأول", "First name"),
    ("field_last_name", "الاسم الأخير", "Last name"),
    ("field_email", "البريد الإلكتروني", "Email"),
    ("field_password", "كلمة المرور", "Password"),
    ("field_confirm_password", "تأكيد كلمة المرور", "Confirm password"),
    ("login_submit", "دخول", "Log in"),
    ("signup_submit", "تسجيل", "Sign up"),
    ("no_account", "ليس لديك حساب؟", "No account?"),
    ("have_account", "لديك حساب؟", "Have an account?"),
    ("register_here", "سجل هنا", "Sign up here"),
    ("login_here", "سجّل الدخول", "Log in"),
    ("invalid_credentials", "البريد الإلكتروني أو كلمة المرور غير صحيحة", "Invalid email or password"),
    ("logged_out", "تم تسجيل الخروج", "You have been logged out"),
    ("welcome_back", "مرحباً بعودتك", "Welcome back"),
    ("otp_title", "تحقق من بريدك الإلكتروني", "Verify your email"),
    ("otp_hint", "أرسلنا رمز التحقق إلى", "We sent a verification code to"),
    ("field_otp", "رمز التحقق", "Verification code"),
    ("field_new_password", "كلمة المرور لإنشاء الحساب", "Password for the new account"),
    ("otp_submit", "إنشاء الحساب", "Create account"),
    ("otp_sent", "تم إرسال رمز التحقق إلى بريدك", "A verification code was sent to your email"),
    ("otp_invalid", "رمز التحقق غير صحيح أو انتهت صلاحيته", "The code is wrong or has expired"),
    ("account_created", "تم إنشاء الحساب بنجاح", "Your account was created"),
    // Profile
    ("profile_title", "تعديل الملف الشخصي", "Edit profile"),
    ("field_avatar", "صورة الملف الشخصي", "Profile picture"),
    ("avatar_upload", "رفع الصورة", "Upload picture"),
    ("profile_update", "تحديث الملف الشخصي", "Update profile"),
    ("profile_updated", "تم تحديث الملف الشخصي", "Profile updated"),
    ("delete_account", "حذف الحساب", "Delete account"),
    ("confirm_delete_account", "هل أنت متأكد من حذف حسابك؟", "Are you sure you want to delete your account?"),
    ("account_deleted", "تم حذف الحساب", "Your account was deleted"),
    ("avatar_updated", "تم تحديث الصورة", "Picture updated"),
    ("avatar_too_large", "الملف كبير جداً، الحد الأقصى 2 ميجابايت", "File too large, the maximum is 2 MB"),
    ("avatar_invalid_type", "يُقبل الصور فقط", "Only images are accepted"),
    ("avatar_failed", "فشل في رفع الصورة", "Upload failed"),
    // Admin
    ("admin_title", "لوحة تحكم الإدارة", "Admin dashboard"),
    ("admin_subtitle", "إدارة قائمة القراء والإحصائيات", "Manage reciters and statistics"),
    ("admin_requests", "طلبات إضافة قارئ", "Reciter requests"),
    ("admin_comments", "إدارة التعليقات", "Manage comments"),
    ("stat_total_reciters", "إجمالي القراء", "Total reciters"),
    ("stat_total_favorites", "إجمالي المفضلات", "Total favorites"),
    ("stat_recent", "قراء جدد هذا الشهر", "New reciters this month"),
    ("stat_most_favorited", "الأكثر إعجاباً", "Most favorited"),
    ("stat_pending_requests", "طلبات معلقة", "Pending requests"),
    ("none", "لا يوجد", "None"),
    ("add_reader", "إضافة قارئ جديد", "Add reciter"),
    ("edit_reader", "تحديث بيانات القارئ", "Edit reciter"),
    ("search_placeholder", "البحث في القراء...", "Search reciters..."),
    ("search", "بحث", "Search"),
    ("col_name", "الاسم", "Name"),
    ("col_district", "الحي", "District"),
    ("col_created", "تاريخ الإضافة", "Added"),
    ("col_actions", "الإجراءات", "Actions"),
    ("col_comment", "التعليق", "Comment"),
    ("no_results", "لا توجد نتائج للبحث", "No matching reciters"),
    ("save_add", "إضافة", "Add"),
    ("save_update", "تحديث", "Update"),
    ("cancel", "إلغاء", "Cancel"),
    ("edit", "تعديل", "Edit"),
    ("delete", "حذف", "Delete"),
    ("confirm_delete_reader", "هل أنت متأكد من حذف هذا القارئ؟", "Delete this reciter?"),
    ("confirm_delete_comment", "هل أنت متأكد من حذف هذا التعليق؟", "Delete this comment?"),
    ("reader_added", "تم إضافة القارئ بنجاح", "Reciter added"),
    ("reader_updated", "تم تحديث القارئ بنجاح", "Reciter updated"),
    ("reader_deleted", "تم حذف القارئ بنجاح", "Reciter deleted"),
    ("no_requests", "لا توجد طلبات بعد.", "No requests yet."),
    ("approve", "إضافة للقائمة", "Add to list"),
    ("request_approved", "تمت الإضافة بنجاح", "Request approved"),
    ("request_deleted", "تم حذف الطلب", "Request deleted"),
    ("request_not_found", "الطلب غير موجود", "Request not found"),
    ("comment_deleted", "تم حذف التعليق", "Comment deleted"),
    ("live_updates", "يتم تحديث القائمة تلقائياً", "This list updates automatically"),
    // Errors
    ("generic_error", "حدث خطأ، حاول مرة أخرى", "Something went wrong, please try again"),
    ("not_found_title", "الصفحة غير موجودة", "Page not found"),
    ("server_error_title", "خطأ في الخادم", "Server error"),
    ("err_name_required", "الاسم مطلوب", "Name is required"),
    ("err_name_length", "الاسم يجب أن يكون بين حرفين و50 حرفاً", "Name must be 2 to 50 characters"),
    ("err_district_required", "اسم الحي مطلوب", "District is required"),
    ("err_district_length", "اسم الحي يجب أن يكون بين حرفين و50 حرفاً", "District must be 2 to 50 characters"),
    ("err_url", "يجب إدخال رابط صحيح", "Enter a valid link"),
    ("err_sample_required", "رابط نموذج التلاوة مطلوب", "Recitation sample link is required"),
    ("err_mosque_required", "رابط موقع المسجد مطلوب", "Mosque location link is required"),
    ("err_email_required", "البريد الإلكتروني مطلوب", "Email is required"),
    ("err_email", "البريد الإلكتروني غير صالح", "Email is not valid"),
    ("err_email_taken", "البريد الإلكتروني مستخدم بالفعل", "This email is already registered"),
    ("err_password_required", "كلمة المرور مطلوبة", "Password is required"),
    ("err_password_length", "كلمة المرور يجب أن تكون 6 أحرف على الأقل", "Password must be at least 6 characters"),
    ("err_password_mismatch", "كلمات المرور غير متطابقة", "Passwords do not match"),
    ("err_confirm_required", "تأكيد كلمة المرور مطلوب", "Please confirm the password"),
    ("err_first_name_required", "الاسم الأول مطلوب", "First name is required"),
    ("err_last_name_required", "الاسم الأخير مطلوب", "Last name is required"),
    ("err_author_required", "الاسم مطلوب", "Name is required"),
    ("err_author_length", "الاسم يجب ألا يتجاوز 50 حرفاً", "Name must be at most 50 characters"),
    ("err_body_required", "التعليق مطلوب", "Comment is required"),
    ("err_body_length", "التعليق يجب أن يكون بين حرفين و500 حرف", "Comment must be 2 to 500 characters"),
    ("err_otp_required", "رمز التحقق مطلوب", "Verification code is required"),
];

/// Look up a UI string. Unknown keys render as the key itself.
pub fn t(lang: Lang, key: &str) -> &str {
    TEXTS
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, ar, en)| match lang {
            Lang::Ar => *ar,
            Lang::En => *en,
        })
        .unwrap_or(key)
}

/// Whole table for one language, handed to templates as `t`.
pub fn texts(lang: Lang) -> BTreeMap<&'static str, &'static str> {
    TEXTS
        .iter()
        .map(|(k, ar, en)| {
            let v = match lang {
                Lang::Ar => *ar,
                Lang::En => *en,
            };
            (*k, v)
        })
        .collect()
}
