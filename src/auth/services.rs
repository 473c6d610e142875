use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::dto::{LoginForm, RegisterForm};
use super::password::{hash_password_blocking, verify_password_blocking};
use super::repo_types::User;
use crate::error::AppError;
use crate::session::{SessionContext, SessionKeys};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create a user from the registration form.
pub async fn register(db: &SqlitePool, form: &RegisterForm) -> Result<User, AppError> {
    let email = normalize_email(&form.email);
    let phone = form.phone.trim();

    if email.is_empty() || form.password.trim().is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let hash = hash_password_blocking(form.password.clone()).await?;
    let phone = (!phone.is_empty()).then_some(phone);

    match User::create(db, &email, phone, &hash).await {
        Ok(user) => {
            info!(user_id = user.id, email = %user.email, "user registered");
            Ok(user)
        }
        Err(AppError::DuplicateIdentity) => {
            warn!(email = %email, "email already registered");
            Err(AppError::DuplicateIdentity)
        }
        Err(e) => Err(e),
    }
}

/// Check credentials and issue a session token bound to the user.
///
/// The admin flag of the incoming session is kept.
pub async fn login(
    db: &SqlitePool,
    keys: &SessionKeys,
    current: SessionContext,
    form: &LoginForm,
) -> Result<(User, String), AppError> {
    let email = normalize_email(&form.email);
    if email.is_empty() || form.password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }

    let user = User::find_by_email(db, &email).await?;
    let ok = verify_password_blocking(
        form.password.clone(),
        user.as_ref().map(|u| u.password_hash.clone()),
    )
    .await?;

    let user = match (user, ok) {
        (Some(user), true) => user,
        (Some(user), false) => {
            warn!(email = %email, user_id = user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }
        (None, _) => {
            warn!(email = %email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    let token = keys.sign(current.with_user(user.id))?;
    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok((user, token))
}
