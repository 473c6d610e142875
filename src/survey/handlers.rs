use std::collections::HashMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    routing::get,
    Form, Router,
};
use tracing::instrument;

use super::{
    questions::{answers_from_form, QUESTIONS},
    services,
};
use crate::{
    auth::User,
    error::AppError,
    pages::{render, QuestionView, SurveyPage, ThanksPage},
    session::CurrentUser,
    state::AppState,
};

pub fn survey_routes() -> Router<AppState> {
    Router::new()
        .route("/survey", get(show_survey).post(submit_survey))
        .route("/questions", get(show_survey).post(submit_survey))
}

#[instrument(skip(state))]
pub async fn show_survey(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Response, AppError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AppError::Unauthenticated)?;
    let mut answers = services::get_answers(&state.db, user_id).await?.into_iter();

    let questions = QUESTIONS
        .iter()
        .enumerate()
        .map(|(i, text)| QuestionView {
            number: i + 1,
            text,
            answer: answers.next().unwrap_or_default(),
        })
        .collect();

    Ok(render(
        StatusCode::OK,
        &SurveyPage {
            email: user.email,
            questions,
        },
    ))
}

#[instrument(skip(state, form))]
pub async fn submit_survey(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let saved = services::submit_answers(&state.db, user_id, answers_from_form(&form)).await?;
    Ok(render(
        StatusCode::OK,
        &ThanksPage {
            updated: !saved.created,
        },
    ))
}
