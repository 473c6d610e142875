use sqlx::SqlitePool;
use time::OffsetDateTime;

use super::questions::QUESTION_COUNT;
use crate::error::AppError;

/// Whether an upsert created the user's response or replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Saved {
    pub response_id: i64,
    pub created: bool,
}

/// Stored answers for `user_id` in question order, or empty if none were submitted.
pub async fn find_answers(db: &SqlitePool, user_id: i64) -> Result<Vec<String>, AppError> {
    let rows = sqlx::query_as::<_, (i64, String)>(
        r#"
        SELECT a.position, a.answer
          FROM answers a
          JOIN responses r ON r.id = a.response_id
         WHERE r.user_id = ?1
         ORDER BY a.position
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }
    Ok(place_by_position(rows))
}

/// Lay `(position, answer)` pairs out as a full answer list.
pub(crate) fn place_by_position(rows: Vec<(i64, String)>) -> Vec<String> {
    let mut answers = vec![String::new(); QUESTION_COUNT];
    for (position, answer) in rows {
        if let Some(slot) = usize::try_from(position)
            .ok()
            .and_then(|p| p.checked_sub(1))
            .and_then(|i| answers.get_mut(i))
        {
            *slot = answer;
        }
    }
    answers
}

/// Insert or overwrite the single response of `user_id`.
///
/// `answers` must already be normalized to the question count.
pub async fn upsert_answers(
    db: &SqlitePool,
    user_id: i64,
    answers: &[String],
) -> Result<Saved, AppError> {
    let now = OffsetDateTime::now_utc();
    let mut tx = db.begin().await?;

    // a write first, so the transaction holds the write lock from the start
    let existing: Option<i64> = sqlx::query_scalar(
        "UPDATE responses SET updated_at = ?1 WHERE user_id = ?2 RETURNING id",
    )
    .bind(now)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let saved = match existing {
        Some(response_id) => Saved {
            response_id,
            created: false,
        },
        None => {
            let response_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO responses (user_id, created_at, updated_at)
                VALUES (?1, ?2, ?2)
                RETURNING id
                "#,
            )
            .bind(user_id)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            Saved {
                response_id,
                created: true,
            }
        }
    };

    for (idx, answer) in answers.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO answers (response_id, position, answer)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (response_id, position) DO UPDATE SET answer = excluded.answer
            "#,
        )
        .bind(saved.response_id)
        .bind((idx + 1) as i64)
        .bind(answer)
        .execute(&mut *tx)
        .await?;
    }
    sqlx::query("DELETE FROM answers WHERE response_id = ?1 AND position > ?2")
        .bind(saved.response_id)
        .bind(answers.len() as i64)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(saved)
}

#[cfg(test)]
pub async fn count_responses(db: &SqlitePool, user_id: i64) -> Result<i64, AppError> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM responses WHERE user_id = ?1")
        .bind(user_id)
        .fetch_one(db)
        .await?;
    Ok(n)
}
