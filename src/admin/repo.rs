use std::collections::HashMap;

use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::error::AppError;
use crate::survey::repo::place_by_position;

/// One user with their survey response, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub response_id: Option<i64>,
    pub user_id: i64,
    pub email: String,
    pub phone: Option<String>,
    pub submitted_at: Option<OffsetDateTime>,
    /// Empty when the user never submitted, otherwise one per question.
    pub answers: Vec<String>,
}

#[derive(Debug, FromRow)]
struct EntryRow {
    response_id: Option<i64>,
    user_id: i64,
    email: String,
    phone: Option<String>,
    submitted_at: Option<OffsetDateTime>,
}

/// Every user, newest activity first, with their answers attached.
pub async fn list_entries(db: &SqlitePool) -> Result<Vec<Entry>, AppError> {
    let rows = sqlx::query_as::<_, EntryRow>(
        r#"
        SELECT r.id         AS response_id,
               u.id         AS user_id,
               u.email      AS email,
               u.phone      AS phone,
               r.created_at AS submitted_at
          FROM users u
          LEFT JOIN responses r ON r.user_id = u.id
         ORDER BY julianday(COALESCE(r.updated_at, u.created_at)) DESC, u.id DESC
        "#,
    )
    .fetch_all(db)
    .await?;

    let answer_rows = sqlx::query_as::<_, (i64, i64, String)>(
        "SELECT response_id, position, answer FROM answers ORDER BY response_id, position",
    )
    .fetch_all(db)
    .await?;

    let mut by_response: HashMap<i64, Vec<(i64, String)>> = HashMap::new();
    for (response_id, position, answer) in answer_rows {
        by_response
            .entry(response_id)
            .or_default()
            .push((position, answer));
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let answers = row
                .response_id
                .map(|id| place_by_position(by_response.remove(&id).unwrap_or_default()))
                .unwrap_or_default();
            Entry {
                response_id: row.response_id,
                user_id: row.user_id,
                email: row.email,
                phone: row.phone,
                submitted_at: row.submitted_at,
                answers,
            }
        })
        .collect())
}
