use std::time::{Duration, Instant};

use sqlx::SqlitePool;
use tracing::{info, warn};

use super::export::write_csv;
use super::repo::{self, Entry};
use super::throttle::AdminThrottle;
use crate::auth::password::{hash_password, verify_password_blocking};
use crate::config::AdminConfig;
use crate::error::AppError;

/// The shared admin secret (kept only as a hash) and its failure throttle.
pub struct AdminGate {
    password_hash: String,
    throttle: AdminThrottle,
}

impl AdminGate {
    pub fn new(cfg: &AdminConfig) -> anyhow::Result<Self> {
        Ok(Self {
            password_hash: hash_password(&cfg.password)?,
            throttle: AdminThrottle::new(cfg.max_attempts, Duration::from_secs(cfg.lockout_secs)),
        })
    }

    /// Check the admin password; the caller grants the admin flag on `Ok`.
    pub async fn authenticate_admin(&self, password: &str) -> Result<(), AppError> {
        if let Err(retry_after) = self.throttle.begin_attempt(Instant::now()) {
            warn!(retry_after_secs = retry_after.as_secs(), "admin login throttled");
            return Err(AppError::Throttled { retry_after });
        }

        let ok =
            verify_password_blocking(password.to_string(), Some(self.password_hash.clone()))
                .await?;
        if ok {
            self.throttle.reset();
            info!("admin authenticated");
            Ok(())
        } else {
            warn!("admin login invalid password");
            Err(AppError::InvalidCredentials)
        }
    }
}

pub async fn list_entries(db: &SqlitePool) -> Result<Vec<Entry>, AppError> {
    repo::list_entries(db).await
}

pub async fn export_csv(db: &SqlitePool) -> Result<Vec<u8>, AppError> {
    let entries = repo::list_entries(db).await?;
    let bytes = write_csv(&entries)?;
    info!(rows = entries.len(), "responses exported");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::auth::test_support::register_user;
    use crate::config::AppConfig;
    use crate::state::AppState;
    use crate::survey::questions::QUESTION_COUNT;
    use crate::survey::services::submit_answers;

    #[tokio::test]
    async fn correct_password_passes() {
        let cfg = AppConfig::for_tests().admin;
        let gate = AdminGate::new(&cfg).expect("gate");
        gate.authenticate_admin(&cfg.password).await.expect("admin");
    }

    #[tokio::test]
    async fn wrong_passwords_get_throttled() {
        let cfg = AppConfig::for_tests().admin;
        let gate = AdminGate::new(&cfg).expect("gate");
        for _ in 0..cfg.max_attempts {
            let err = gate.authenticate_admin("nope").await.unwrap_err();
            assert!(matches!(err, AppError::InvalidCredentials));
        }
        // even the right password is refused while locked out
        let err = gate.authenticate_admin(&cfg.password).await.unwrap_err();
        assert!(matches!(err, AppError::Throttled { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_guesses_cannot_outrun_the_throttle() {
        let cfg = AppConfig::for_tests().admin;
        let gate = Arc::new(AdminGate::new(&cfg).expect("gate"));
        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move { gate.authenticate_admin("guess").await })
            })
            .collect();

        let (mut rejected, mut throttled) = (0, 0);
        for task in tasks {
            match task.await.expect("join") {
                Err(AppError::InvalidCredentials) => rejected += 1,
                Err(AppError::Throttled { .. }) => throttled += 1,
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_eq!(rejected, cfg.max_attempts);
        assert_eq!(throttled, 20 - cfg.max_attempts);
    }

    #[tokio::test]
    async fn success_resets_failure_count() {
        let cfg = AppConfig::for_tests().admin;
        let gate = AdminGate::new(&cfg).expect("gate");
        for _ in 0..cfg.max_attempts - 1 {
            assert!(gate.authenticate_admin("nope").await.is_err());
        }
        gate.authenticate_admin(&cfg.password).await.expect("admin");
        for _ in 0..cfg.max_attempts - 1 {
            assert!(matches!(
                gate.authenticate_admin("nope").await,
                Err(AppError::InvalidCredentials)
            ));
        }
    }

    #[tokio::test]
    async fn listing_includes_users_without_answers() {
        let state = AppState::fake().await;
        let quiet = register_user(&state.db, "quiet@example.com").await;
        let chatty = register_user(&state.db, "chatty@example.com").await;
        submit_answers(&state.db, chatty.id, vec!["x".into(); QUESTION_COUNT])
            .await
            .expect("submit");

        let entries = list_entries(&state.db).await.expect("list");
        assert_eq!(entries.len(), 2);

        let quiet_entry = entries.iter().find(|e| e.user_id == quiet.id).expect("quiet listed");
        assert_eq!(quiet_entry.response_id, None);
        assert_eq!(quiet_entry.submitted_at, None);
        assert!(quiet_entry.answers.is_empty());

        let chatty_entry = entries.iter().find(|e| e.user_id == chatty.id).expect("chatty listed");
        assert!(chatty_entry.response_id.is_some());
        assert_eq!(chatty_entry.answers, vec!["x".to_string(); QUESTION_COUNT]);
    }

    #[tokio::test]
    async fn latest_activity_comes_first() {
        let state = AppState::fake().await;
        let first = register_user(&state.db, "first@example.com").await;
        let second = register_user(&state.db, "second@example.com").await;
        // the older user answers last, which bumps them to the top
        submit_answers(&state.db, first.id, vec!["late".into()]).await.expect("submit");

        let entries = list_entries(&state.db).await.expect("list");
        let order: Vec<i64> = entries.iter().map(|e| e.user_id).collect();
        assert_eq!(order, [first.id, second.id]);
    }

    #[tokio::test]
    async fn sub_second_timestamps_order_by_time_not_text() {
        let state = AppState::fake().await;
        // inserted oldest-id-first so the id tie-break cannot mask a wrong order
        for (email, created_at) in [
            ("newer@x.io", "2024-05-01T10:30:00.123Z"),
            ("older@x.io", "2024-05-01T10:30:00.12Z"),
            ("half@x.io", "2024-05-01T10:31:00.5Z"),
            ("whole@x.io", "2024-05-01T10:31:00Z"),
        ] {
            sqlx::query("INSERT INTO users (email, password_hash, created_at) VALUES (?, 'x', ?)")
                .bind(email)
                .bind(created_at)
                .execute(&state.db)
                .await
                .expect("insert");
        }

        let entries = list_entries(&state.db).await.expect("list");
        let order: Vec<&str> = entries.iter().map(|e| e.email.as_str()).collect();
        assert_eq!(order, ["half@x.io", "whole@x.io", "newer@x.io", "older@x.io"]);
    }

    #[tokio::test]
    async fn csv_export_matches_listing() {
        let state = AppState::fake().await;
        let a = register_user(&state.db, "csv-a@example.com").await;
        register_user(&state.db, "csv-b@example.com").await;
        let mut answers: Vec<String> = (1..=QUESTION_COUNT).map(|i| format!("answer {i}")).collect();
        answers[0] = "apples, pears".into();
        answers[1] = "this || that".into();
        answers[2] = "she said \"no\"\nthen left".into();
        submit_answers(&state.db, a.id, answers).await.expect("submit");

        let entries = list_entries(&state.db).await.expect("list");
        let bytes = export_csv(&state.db).await.expect("export");
        let mut reader = csv::Reader::from_reader(bytes.as_slice());

        let header: Vec<String> = reader
            .headers()
            .expect("header")
            .iter()
            .map(String::from)
            .collect();
        assert_eq!(header, crate::admin::export::csv_header());

        let parsed: Vec<(i64, String, Vec<String>)> = reader
            .records()
            .map(|r| {
                let r = r.expect("record");
                (
                    r[1].parse().expect("user id"),
                    r[2].to_string(),
                    r.iter().skip(5).map(String::from).collect(),
                )
            })
            .collect();

        let expected: Vec<(i64, String, Vec<String>)> = entries
            .iter()
            .map(|e| {
                let answers = if e.answers.is_empty() {
                    vec![String::new(); QUESTION_COUNT]
                } else {
                    e.answers.clone()
                };
                (e.user_id, e.email.clone(), answers)
            })
            .collect();
        assert_eq!(parsed, expected);
    }
}
