use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::CookieJar;
use tracing::instrument;

use super::{
    dto::{LoginForm, RegisterForm},
    services,
};
use crate::{
    error::AppError,
    pages::{render, IndexPage, LoginPage, Notice, NoticeQuery, RegisterPage},
    session::{SessionContext, SessionKeys},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}

pub async fn index(session: SessionContext, Query(q): Query<NoticeQuery>) -> Response {
    render(
        StatusCode::OK,
        &IndexPage {
            logged_in: session.user_id.is_some(),
            is_admin: session.is_admin,
            notice: q.message(),
        },
    )
}

pub async fn register_form() -> Response {
    render(StatusCode::OK, &RegisterPage::default())
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    match services::register(&state.db, &form).await {
        Ok(_) => Ok(Redirect::to(&Notice::Registered.location("/login")).into_response()),
        Err(e) if e.is_user_correctable() => Ok(render(
            e.status(),
            &RegisterPage {
                error: Some(e.to_string()),
                email: form.email,
                phone: form.phone,
            },
        )),
        Err(e) => Err(e),
    }
}

pub async fn login_form(Query(q): Query<NoticeQuery>) -> Response {
    render(
        StatusCode::OK,
        &LoginPage {
            notice: q.message(),
            ..LoginPage::default()
        },
    )
}

#[instrument(skip(state, session, jar, form))]
pub async fn login(
    State(state): State<AppState>,
    session: SessionContext,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let keys = SessionKeys::from_ref(&state);
    match services::login(&state.db, &keys, session, &form).await {
        Ok((_, token)) => {
            Ok((jar.add(keys.cookie(token)), Redirect::to("/survey")).into_response())
        }
        Err(e) if e.is_user_correctable() => Ok(render(
            e.status(),
            &LoginPage {
                error: Some(e.to_string()),
                notice: None,
                email: form.email,
            },
        )),
        Err(e) => Err(e),
    }
}

/// Drops both the user and the admin part of the session.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let keys = SessionKeys::from_ref(&state);
    (
        jar.add(keys.removal_cookie()),
        Redirect::to(&Notice::LoggedOut.location("/")),
    )
        .into_response()
}
