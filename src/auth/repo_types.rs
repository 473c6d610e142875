use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,                    // auto-incrementing user ID
    pub email: String,              // identity key, stored lowercased
    pub phone: Option<String>,      // optional contact number
    pub password_hash: String,      // Argon2 PHC string, never plaintext
    pub created_at: OffsetDateTime, // registration time (UTC)
}
