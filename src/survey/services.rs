use sqlx::SqlitePool;
use tracing::{info, warn};

use super::questions::normalize_answers;
use super::repo::{self, Saved};
use crate::auth::User;
use crate::error::AppError;

/// Answers to pre-fill the survey with; empty when nothing was submitted yet.
pub async fn get_answers(db: &SqlitePool, user_id: i64) -> Result<Vec<String>, AppError> {
    repo::find_answers(db, user_id).await
}

/// Store `answers` as the user's one and only response.
///
/// Resubmitting replaces the previous answers in place.
pub async fn submit_answers(
    db: &SqlitePool,
    user_id: i64,
    answers: Vec<String>,
) -> Result<Saved, AppError> {
    if User::find_by_id(db, user_id).await?.is_none() {
        warn!(user_id, "survey submitted for a user that no longer exists");
        return Err(AppError::Unauthenticated);
    }

    let answers = normalize_answers(answers);
    let saved = repo::upsert_answers(db, user_id, &answers).await?;
    info!(
        user_id,
        response_id = saved.response_id,
        created = saved.created,
        "survey answers saved"
    );
    Ok(saved)
}
