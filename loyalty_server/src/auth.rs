//! Password hashing and session tokens.
//!
//! Passwords are stored as argon2id PHC strings. Sessions are HS256 JWTs signed with the configured secret, and are
//! accepted either from the `Authorization` cookie or from an `Authorization: Bearer` header.
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use loyalty_engine::db_types::User;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const AUTH_COOKIE: &str = "Authorization";

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHashError(e.to_string()))
}

/// Checks `password` against a stored PHC string. A malformed stored hash never verifies.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            error!("🔑️ Stored password hash could not be parsed. {e}");
            false
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The user id
    pub sub: String,
    pub username: String,
    /// Expiry, in seconds since the Unix epoch
    pub exp: i64,
    pub iat: i64,
}

/// Signs and validates session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        let lifetime = chrono::Duration::from_std(config.session_lifetime)
            .ok()
            .filter(|d| Utc::now().checked_add_signed(*d).is_some())
            .unwrap_or_else(|| {
                warn!("🔑️ Session lifetime is out of range. Using 30 minutes.");
                chrono::Duration::minutes(30)
            });
        Self { encoding_key: EncodingKey::from_secret(secret), decoding_key: DecodingKey::from_secret(secret), lifetime }
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| AuthError::CouldNotIssueToken("The session expiry is out of range".into()))?;
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            exp: expires.timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::ValidationError(e.to_string()),
            })
    }
}

/// Pulls the raw token out of the request. The cookie wins over the header.
fn token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(AUTH_COOKIE) {
        return Some(cookie.value().to_string());
    }
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

impl FromRequest for Claims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<TokenIssuer>>() {
            None => Err(ServerError::ConfigurationError("No token issuer has been configured".into())),
            Some(issuer) => match token_from_request(req) {
                None => Err(AuthError::MissingToken.into()),
                Some(token) => issuer.validate(&token).map_err(|e| {
                    debug!("🔑️ Rejected session token. {e}");
                    ServerError::from(e)
                }),
            },
        };
        ready(result)
    }
}
