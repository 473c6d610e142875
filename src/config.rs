use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_SESSION_SECRET: &str = "change-this-secret";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub password: String,
    pub max_attempts: u32,
    pub lockout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub session: SessionConfig,
    pub admin: AdminConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://questionnaire.db".into());
        let database_max_connections = env_parse("DATABASE_MAX_CONNECTIONS").unwrap_or(5);

        let secret = std::env::var("SESSION_SECRET").unwrap_or_else(|_| {
            warn!("SESSION_SECRET not set; using the insecure built-in default");
            DEFAULT_SESSION_SECRET.into()
        });
        let session = SessionConfig {
            secret,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "questionnaire".into()),
            audience: std::env::var("SESSION_AUDIENCE")
                .unwrap_or_else(|_| "questionnaire-web".into()),
            ttl_minutes: env_parse("SESSION_TTL_MINUTES").unwrap_or(60 * 12),
            cookie_secure: env_parse("COOKIE_SECURE").unwrap_or(false),
        };

        let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
            warn!("ADMIN_PASSWORD not set; using the insecure built-in default");
            DEFAULT_ADMIN_PASSWORD.into()
        });
        let admin = AdminConfig {
            password,
            max_attempts: env_parse("ADMIN_MAX_ATTEMPTS").unwrap_or(5),
            lockout_secs: env_parse("ADMIN_LOCKOUT_SECS").unwrap_or(300),
        };

        anyhow::ensure!(!admin.password.is_empty(), "ADMIN_PASSWORD must not be empty");
        anyhow::ensure!(session.ttl_minutes > 0, "SESSION_TTL_MINUTES must be positive");

        Ok(Self {
            database_url,
            database_max_connections,
            session,
            admin,
        })
    }

    /// Settings used by unit tests: in-memory database, fast-expiring throttle.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            database_max_connections: 1,
            session: SessionConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                cookie_secure: false,
            },
            admin: AdminConfig {
                password: "letmein-admin".into(),
                max_attempts: 3,
                lockout_secs: 60,
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
