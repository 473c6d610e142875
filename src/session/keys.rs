use std::time::Duration;

use axum::extract::FromRef;
use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::{claims::Claims, SessionContext, SESSION_COOKIE};
use crate::config::SessionConfig;
use crate::state::AppState;

/// Signing and verification keys for session tokens, with cookie settings.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
    cookie_secure: bool,
}

impl From<&SessionConfig> for SessionKeys {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(cfg.ttl_minutes.max(1) as u64 * 60),
            cookie_secure: cfg.cookie_secure,
        }
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from(&state.config.session)
    }
}

impl SessionKeys {
    pub fn sign(&self, ctx: SessionContext) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            uid: ctx.user_id,
            admin: ctx.is_admin,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = ?ctx.user_id, admin = ctx.is_admin, "session signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<SessionContext> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(SessionContext {
            user_id: data.claims.uid,
            is_admin: data.claims.admin,
        })
    }

    /// Sign `ctx` and wrap it in a session cookie.
    pub fn issue(&self, ctx: SessionContext) -> anyhow::Result<Cookie<'static>> {
        Ok(self.cookie(self.sign(ctx)?))
    }

    /// Session cookie carrying `token`.
    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .max_age(TimeDuration::seconds(self.ttl.as_secs() as i64))
            .build()
    }

    /// Cookie that makes the browser drop the session.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .build();
        cookie.make_removal();
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn make_keys() -> SessionKeys {
        SessionKeys::from(&AppConfig::for_tests().session)
    }

    #[test]
    fn sign_and_verify_user_session() {
        let keys = make_keys();
        let ctx = SessionContext::default().with_user(42);
        let token = keys.sign(ctx).expect("sign");
        assert_eq!(keys.verify(&token).expect("verify"), ctx);
    }

    #[test]
    fn admin_flag_survives_round_trip() {
        let keys = make_keys();
        let ctx = SessionContext::default().with_admin();
        let token = keys.sign(ctx).expect("sign");
        let back = keys.verify(&token).expect("verify");
        assert!(back.is_admin);
        assert_eq!(back.user_id, None);
    }

    #[test]
    fn verify_rejects_foreign_secret() {
        let keys = make_keys();
        let mut cfg = AppConfig::for_tests().session;
        cfg.secret = "someone-else".into();
        let other = SessionKeys::from(&cfg);
        let token = other.sign(SessionContext::default().with_user(1)).expect("sign");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let keys = make_keys();
        let user = keys.sign(SessionContext::default().with_user(7)).expect("sign");
        let admin = keys
            .sign(SessionContext::default().with_user(7).with_admin())
            .expect("sign");
        // admin payload glued onto the plain user's signature
        let user_parts: Vec<&str> = user.split('.').collect();
        let admin_parts: Vec<&str> = admin.split('.').collect();
        let forged = format!("{}.{}.{}", user_parts[0], admin_parts[1], user_parts[2]);
        assert!(keys.verify(&forged).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys();
        let cfg = AppConfig::for_tests().session;
        let past = OffsetDateTime::now_utc().unix_timestamp() - 3600;
        let claims = Claims {
            uid: Some(1),
            admin: false,
            iat: (past - 60) as usize,
            exp: past as usize,
            iss: cfg.issuer,
            aud: cfg.audience,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(cfg.secret.as_bytes()),
        )
        .expect("encode");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn cookies_are_http_only_and_clearable() {
        let keys = make_keys();
        let set = keys.issue(SessionContext::default().with_user(3)).expect("cookie");
        assert_eq!(set.name(), SESSION_COOKIE);
        assert_eq!(set.http_only(), Some(true));
        assert_eq!(set.same_site(), Some(SameSite::Lax));
        assert_eq!(set.max_age(), Some(TimeDuration::seconds(300)));
        assert_eq!(set.path(), Some("/"));
        assert!(!set.to_string().contains("Secure"));
        assert!(keys.verify(set.value()).is_ok());

        let cleared = keys.removal_cookie();
        assert_eq!(cleared.name(), SESSION_COOKIE);
        assert_eq!(cleared.value(), "");
        assert_eq!(cleared.max_age(), Some(TimeDuration::ZERO));
        assert_eq!(cleared.path(), Some("/"));
    }

    #[test]
    fn secure_flag_follows_config() {
        let mut cfg = AppConfig::for_tests().session;
        cfg.cookie_secure = true;
        let keys = SessionKeys::from(&cfg);
        let set = keys.issue(SessionContext::default().with_user(3)).expect("cookie");
        assert_eq!(set.secure(), Some(true));
        assert_eq!(keys.removal_cookie().secure(), Some(true));
    }
}
