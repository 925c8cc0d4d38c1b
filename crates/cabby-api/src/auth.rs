//! JWT verification.
//!
//! Token issuance belongs to the surrounding platform; this service only
//! verifies tokens it is handed and extracts the caller's identity.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use cabby_core::config::AuthConfig;
use cabby_core::error::AppError;
use cabby_core::result::AppResult;

/// Claims carried by a Cabby access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: i64,
    /// Platform role string (`RIDER`, `DRIVER`, `ADMIN`).
    #[serde(default)]
    pub role: String,
    /// Expiration, seconds since epoch.
    pub exp: i64,
}

/// Validates JWT tokens against the shared HMAC secret.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // clock skew
        if !config.issuer.is_empty() {
            validation.set_issuer(&[&config.issuer]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates a token string.
    pub fn decode(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::unauthorized("Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AppError::unauthorized("Invalid token format")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::unauthorized("Invalid token signature")
                }
                _ => AppError::unauthorized(format!("Token validation failed: {e}")),
            })?;
        Ok(token_data.claims)
    }

    /// Best-effort identity for channels that accept anonymous sessions.
    /// An absent or invalid token yields `None`, never an error.
    pub fn identity(&self, token: Option<&str>) -> Option<i64> {
        let token = token?;
        match self.decode(token) {
            Ok(claims) => Some(claims.sub),
            Err(e) => {
                tracing::debug!(error = %e, "WebSocket token rejected, treating as anonymous");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            issuer: String::new(),
        }
    }

    fn token(secret: &str, exp_offset: i64) -> String {
        let claims = Claims {
            sub: 7,
            role: "DRIVER".to_string(),
            exp: chrono::Utc::now().timestamp() + exp_offset,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode")
    }

    #[test]
    fn test_decode_valid_token() {
        let decoder = JwtDecoder::new(&config());
        let claims = decoder.decode(&token("test-secret", 3600)).expect("decode");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, "DRIVER");
    }

    #[test]
    fn test_rejects_bad_signature_and_expiry() {
        let decoder = JwtDecoder::new(&config());
        assert!(decoder.decode(&token("other-secret", 3600)).is_err());
        assert!(decoder.decode(&token("test-secret", -3600)).is_err());
        assert!(decoder.decode("garbage").is_err());
    }

    #[test]
    fn test_identity_is_best_effort() {
        let decoder = JwtDecoder::new(&config());
        assert_eq!(decoder.identity(None), None);
        assert_eq!(decoder.identity(Some("garbage")), None);
        assert_eq!(decoder.identity(Some(&token("test-secret", 3600))), Some(7));
    }
}
