use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    error::AppError,
    models::{Admin, Role},
};

/// Fixed token lifetime: one day from issuance. There is no refresh-token
/// mechanism; key rotation invalidates all outstanding tokens.
pub const TOKEN_LIFETIME_SECS: usize = 24 * 60 * 60;

/// Claims
///
/// The payload structure signed into every JSON Web Token. The token embeds
/// the full acting identity — id, username, role and site scope — at issuance
/// time; later changes to the underlying admin record do not retroactively
/// affect outstanding tokens until they expire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the admin's row id.
    pub sub: i64,
    pub username: String,
    pub role: Role,
    pub sites: Vec<String>,
    /// Issued At (iat): timestamp when the JWT was issued.
    pub iat: usize,
    /// Expiration Time (exp): timestamp after which the JWT must not be accepted.
    pub exp: usize,
}

/// issue_token
///
/// Mints a signed HS256 token for the given admin record using the
/// process-wide signing key.
pub fn issue_token(admin: &Admin, secret: &str) -> Result<String, AppError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| AppError::Internal)?
        .as_secs() as usize;

    let claims = Claims {
        sub: admin.id,
        username: admin.username.clone(),
        role: admin.role,
        sites: admin.sites.clone(),
        iat: now,
        exp: now + TOKEN_LIFETIME_SECS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("token signing failed: {:?}", e);
        AppError::Internal
    })
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request, populated entirely from
/// the validated token claims. Handlers use this struct to apply the
/// authorization policy.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub sites: Vec<String>,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any protected handler. The process:
/// 1. Pull AppConfig (for the signing key) from the application state.
/// 2. Extract the Bearer token from the Authorization header.
/// 3. Decode and validate the JWT (signature + expiry) against the same
///    process-wide key that issued it.
///
/// Rejection: 401 Unauthorized on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("invalid authorization header".to_string()))?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::default();
        validation.validate_exp = true;

        // Expired, malformed and badly signed tokens are all rejected the
        // same way; the reason is not leaked to the client.
        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))?;

        let claims = token_data.claims;

        Ok(AuthUser {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
            sites: claims.sites,
        })
    }
}
