use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::auth::repo_types::User;
use crate::error::AppError;

impl User {
    /// Find a user by (already normalized) email.
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, phone, password_hash, created_at
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, phone, password_hash, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password.
    ///
    /// Uniqueness is left to the `UNIQUE` constraint so that racing
    /// registrations of one email resolve to exactly one row.
    pub async fn create(
        db: &SqlitePool,
        email: &str,
        phone: Option<&str>,
        password_hash: &str,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, phone, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, email, phone, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(phone)
        .bind(password_hash)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateIdentity
            }
            other => AppError::Storage(other),
        })
    }

    #[cfg(test)]
    pub async fn count(db: &SqlitePool) -> Result<i64, AppError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await?;
        Ok(n)
    }
}
