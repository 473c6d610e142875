use axum::{
    extract::{FromRef, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tracing::instrument;

use super::{
    export::{format_timestamp, CSV_FILENAME},
    repo::Entry,
    services,
};
use crate::{
    error::AppError,
    pages::{render, AdminGatePage, AdminPage, EntryView},
    session::{AdminSession, SessionContext, SessionKeys},
    state::AppState,
    survey::questions::QUESTIONS,
};

#[derive(Debug, Default, Deserialize)]
pub struct AdminLoginForm {
    #[serde(default)]
    pub admin_pass: String,
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_page).post(admin_login))
        .route("/admin/export", get(export))
}

/// The listing for admins, the password gate for everyone else.
#[instrument(skip(state))]
pub async fn admin_page(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Response, AppError> {
    if !session.is_admin {
        return Ok(render(StatusCode::OK, &AdminGatePage::default()));
    }

    let entries = services::list_entries(&state.db)
        .await?
        .into_iter()
        .map(entry_view)
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(render(
        StatusCode::OK,
        &AdminPage {
            questions: &QUESTIONS,
            entries,
        },
    ))
}

#[instrument(skip(state, session, jar, form))]
pub async fn admin_login(
    State(state): State<AppState>,
    session: SessionContext,
    jar: CookieJar,
    Form(form): Form<AdminLoginForm>,
) -> Result<Response, AppError> {
    match state.admin.authenticate_admin(&form.admin_pass).await {
        Ok(()) => {
            let cookie = SessionKeys::from_ref(&state).issue(session.with_admin())?;
            Ok((jar.add(cookie), Redirect::to("/admin")).into_response())
        }
        Err(AppError::InvalidCredentials) => Ok(render(
            StatusCode::UNAUTHORIZED,
            &AdminGatePage {
                error: Some("Invalid administrator password".into()),
            },
        )),
        Err(e) if e.is_user_correctable() => Ok(render(
            e.status(),
            &AdminGatePage {
                error: Some(e.to_string()),
            },
        )),
        Err(e) => Err(e),
    }
}

#[instrument(skip_all)]
pub async fn export(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Response, AppError> {
    let body = services::export_csv(&state.db).await?;
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{CSV_FILENAME}\""),
            ),
        ],
        body,
    )
        .into_response())
}

fn entry_view(e: Entry) -> anyhow::Result<EntryView> {
    Ok(EntryView {
        response_id: e.response_id.map(|id| id.to_string()).unwrap_or_default(),
        user_id: e.user_id,
        email: e.email,
        phone: e.phone.unwrap_or_default(),
        submitted_at: format_timestamp(e.submitted_at)?,
        answers: e.answers,
    })
}
