use crate::models::user::User;

/// Outcome of the admin area check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// No session: send to `/login`.
    Login,
    /// Logged in without the admin role: send home.
    Home,
}

impl Access {
    pub fn redirect_target(self) -> Option<&'static str> {
        match self {
            Access::Granted => None,
            Access::Login => Some("/login"),
            Access::Home => Some("/"),
        }
    }
}

/// Decides access to `/admin/*` from the session user alone.
pub fn admin_access(user: Option<&User>) -> Access {
    match user {
        None => Access::Login,
        Some(u) if u.is_admin() => Access::Granted,
        Some(_) => Access::Home,
    }
}
