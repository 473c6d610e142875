use serde::{Deserialize, Serialize};

/// JWT payload carried in the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub uid: Option<i64>, // logged-in user, if any
    #[serde(default)]
    pub admin: bool,      // passed the admin gate
    pub iat: usize,       // issued at (unix timestamp)
    pub exp: usize,       // expires at (unix timestamp)
    pub iss: String,      // issuer
    pub aud: String,      // audience
}
