//! Demo login gate.
//!
//! Tokens look like JWTs but carry a fixed `demo-signature`; they gate the
//! wizard in a demo deployment and offer no security.

use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const AUTH_EXP_KEY: &str = "auth_exp";
pub const FORM_CONFIG_CACHE_KEY: &str = "sip_form_config";
pub const SESSION_MINUTES: i64 = 200;

const TOKEN_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;
const TOKEN_SIGNATURE: &str = "demo-signature";

/// Key/value storage for session data (token, expiry, cached form config).
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySessionStore {
    entries: BTreeMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoUser {
    pub id: String,
    pub password: String,
    pub roles: Vec<String>,
}

impl DemoUser {
    pub fn new(id: &str, password: &str, roles: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            password: password.to_string(),
            roles: roles.iter().map(|role| role.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    pub token: String,
    pub user: SessionUser,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("failed to encode session token: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGate {
    users: Vec<DemoUser>,
    session_minutes: i64,
}

impl AuthGate {
    pub fn new(users: Vec<DemoUser>) -> Self {
        Self {
            users,
            session_minutes: SESSION_MINUTES,
        }
    }

    pub fn with_demo_users() -> Self {
        Self::new(vec![
            DemoUser::new("demo", "demo123", &["user"]),
            DemoUser::new("advisor", "advisor123", &["user", "advisor"]),
        ])
    }

    pub fn with_session_minutes(mut self, minutes: i64) -> Self {
        self.session_minutes = minutes;
        self
    }

    /// Checks the credentials and stores a fresh token valid from `now` (seconds).
    pub fn login(
        &self,
        store: &mut dyn SessionStore,
        username: &str,
        password: &str,
        now: i64,
    ) -> Result<IssuedSession, AuthError> {
        let user = self
            .users
            .iter()
            .find(|user| user.id == username && user.password == password)
            .ok_or(AuthError::InvalidCredentials)?;

        let exp = now + self.session_minutes * 60;
        let claims = Claims {
            sub: user.id.clone(),
            roles: user.roles.clone(),
            iat: now,
            exp,
        };
        let token = encode_token(&claims)?;

        store.set(AUTH_TOKEN_KEY, token.clone());
        store.set(AUTH_EXP_KEY, exp.to_string());
        Ok(IssuedSession {
            token,
            user: SessionUser {
                id: claims.sub,
                roles: claims.roles,
            },
            exp,
        })
    }

    pub fn logout(&self, store: &mut dyn SessionStore) {
        store.remove(AUTH_TOKEN_KEY);
        store.remove(AUTH_EXP_KEY);
    }

    pub fn is_authed(&self, store: &dyn SessionStore, now: i64) -> bool {
        store
            .get(AUTH_TOKEN_KEY)
            .and_then(|token| decode_token(&token))
            .is_some_and(|claims| now < claims.exp)
    }

    pub fn user(&self, store: &dyn SessionStore) -> Option<SessionUser> {
        let claims = decode_token(&store.get(AUTH_TOKEN_KEY)?)?;
        Some(SessionUser {
            id: claims.sub,
            roles: claims.roles,
        })
    }

    /// Seconds until the stored expiry; zero when expired or signed out.
    pub fn remaining_secs(&self, store: &dyn SessionStore, now: i64) -> i64 {
        let exp = store
            .get(AUTH_EXP_KEY)
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or(0);
        (exp - now).max(0)
    }
}

pub fn encode_token(claims: &Claims) -> Result<String, AuthError> {
    let payload =
        serde_json::to_vec(claims).map_err(|err| AuthError::Encoding(err.to_string()))?;
    Ok(format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(TOKEN_HEADER),
        URL_SAFE_NO_PAD.encode(payload),
        TOKEN_SIGNATURE
    ))
}

pub fn decode_token(token: &str) -> Option<Claims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}
