mod claims;
pub mod extractors;
pub mod keys;

pub use extractors::{AdminSession, CurrentUser};
pub use keys::SessionKeys;

pub const SESSION_COOKIE: &str = "questionnaire_session";

/// What the current request is allowed to do, decoded from the session cookie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: Option<i64>,
    pub is_admin: bool,
}

impl SessionContext {
    pub fn with_user(self, user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..self
        }
    }

    pub fn with_admin(self) -> Self {
        Self {
            is_admin: true,
            ..self
        }
    }
}
