use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use super::{SessionContext, SessionKeys, SESSION_COOKIE};
use crate::error::AppError;

/// Session token from the request cookies, with RFC 6265 quotes removed.
fn session_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value_trimmed().to_owned())
        .filter(|t| !t.is_empty())
}

fn read_session(parts: &Parts, keys: &SessionKeys) -> SessionContext {
    let Some(token) = session_token(&parts.headers) else {
        return SessionContext::default();
    };
    match keys.verify(&token) {
        Ok(ctx) => ctx,
        Err(e) => {
            debug!(error = %e, "ignoring invalid session cookie");
            SessionContext::default()
        }
    }
}

/// Any request has a session context; a bad or missing cookie is anonymous.
#[async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(read_session(parts, &SessionKeys::from_ref(state)))
    }
}

/// A logged-in user; anonymous requests are sent to the login page.
pub struct CurrentUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        read_session(parts, &SessionKeys::from_ref(state))
            .user_id
            .map(CurrentUser)
            .ok_or(AppError::Unauthenticated)
    }
}

/// A session that passed the admin gate; others are sent back to the gate.
pub struct AdminSession(pub SessionContext);

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = read_session(parts, &SessionKeys::from_ref(state));
        if ctx.is_admin {
            Ok(AdminSession(ctx))
        } else {
            Err(AppError::Unauthorized)
        }
    }
}
