//! Bearer token issuing and checking
//!
//! Tokens are HMAC-signed JWTs (HS256, HS384 or HS512) carrying the identity
//! ID as `sub`. Validation has no clock leeway.

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};
use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum accepted secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Signing secret, algorithm, issuer and lifetime of issued tokens.
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC
    pub secret: String,

    /// Algorithm to use
    pub algorithm: JwtAlgorithm,

    /// Token issuer
    pub issuer: String,

    /// Token validity
    pub token_duration: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("token_duration", &self.token_duration)
            .finish()
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            algorithm: JwtAlgorithm::HS256,
            issuer: "crm".to_string(),
            token_duration: Duration::days(30),
        }
    }
}

/// HMAC signing algorithms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum JwtAlgorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
}

impl From<JwtAlgorithm> for Algorithm {
    fn from(alg: JwtAlgorithm) -> Self {
        match alg {
            JwtAlgorithm::HS256 => Algorithm::HS256,
            JwtAlgorithm::HS384 => Algorithm::HS384,
            JwtAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

/// Issues and validates identity tokens.
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &self.config)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtService {
    /// Build the service from a configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Secret, algorithm, issuer and lifetime
    ///
    /// # Returns
    ///
    /// JWT service, or a configuration error if the secret is shorter than
    /// [`MIN_SECRET_LEN`] bytes or the token duration is not positive
    pub fn new(config: JwtConfig) -> AuthResult<Self> {
        if config.secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::ConfigError(format!(
                "JWT secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if config.token_duration <= Duration::zero() {
            return Err(AuthError::ConfigError(
                "Token duration must be positive".to_string(),
            ));
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    /// Create with a simple secret (HS256, default issuer and duration).
    ///
    /// # Arguments
    ///
    /// * `secret` - HMAC key, at least [`MIN_SECRET_LEN`] bytes
    pub fn with_secret(secret: impl Into<String>) -> AuthResult<Self> {
        Self::new(JwtConfig {
            secret: secret.into(),
            ..Default::default()
        })
    }

    /// Issue an access token for an identity.
    ///
    /// # Arguments
    ///
    /// * `identity_id` - The identity the token is issued to
    ///
    /// # Returns
    ///
    /// Compact token string
    pub fn issue_token(&self, identity_id: Uuid) -> AuthResult<String> {
        let claims = Claims::new(identity_id, &self.config.issuer, self.config.token_duration);
        self.encode_claims(&claims)
    }

    /// Encode existing claims.
    pub fn encode_claims(&self, claims: &Claims) -> AuthResult<String> {
        let header = Header::new(self.config.algorithm.into());
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("cannot sign token: {e}")))
    }

    /// Check a token and return its claims.
    ///
    /// Checks signature, algorithm, issuer, expiry and not-before. The same
    /// token always yields the same outcome until it expires.
    ///
    /// # Arguments
    ///
    /// * `token` - Compact token string, without the `Bearer ` prefix
    pub fn validate_token(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(self.config.algorithm.into());
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.validate_nbf = true;
        validation.leeway = 0;

        let token_data: TokenData<Claims> = decode(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidToken => AuthError::InvalidToken("Malformed token".to_string()),
                ErrorKind::InvalidSignature => {
                    AuthError::InvalidToken("Invalid signature".to_string())
                }
                ErrorKind::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
                ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidToken("Invalid algorithm".to_string())
                }
                ErrorKind::ImmatureSignature => {
                    AuthError::InvalidToken("Token not yet valid".to_string())
                }
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        Ok(token_data.claims)
    }

    /// Active configuration.
    pub fn config(&self) -> &JwtConfig {
        &self.config
    }
}
