//! JWT claims
//!
//! Tokens carry only the identity ID and the standard registered claims.
//! Role and capabilities are always read from the stored identity, so a
//! role change takes effect on the next request.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by an access token.
///
/// # Example
///
/// ```rust
/// use crm_auth::claims::Claims;
/// use uuid::Uuid;
///
/// let id = Uuid::now_v7();
/// let claims = Claims::new(id, "crm", chrono::Duration::hours(1));
///
/// assert_eq!(claims.identity_id(), Some(id));
/// assert!(!claims.is_expired());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (identity ID)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

impl Claims {
    /// Create claims for an identity.
    ///
    /// # Arguments
    ///
    /// * `identity_id` - The identity the token is issued to
    /// * `issuer` - Token issuer
    /// * `duration` - Token validity duration
    pub fn new(identity_id: Uuid, issuer: impl Into<String>, duration: Duration) -> Self {
        let now = Utc::now();
        let exp = now + duration;

        Self {
            sub: identity_id.to_string(),
            iss: issuer.into(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
        }
    }

    /// Get the identity ID from the subject claim.
    pub fn identity_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    /// Check if the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Seconds until expiry, zero once expired.
    pub fn expires_in(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_uuid_subject() {
        let mut claims = Claims::new(Uuid::now_v7(), "crm", Duration::hours(1));
        claims.sub = "admin".into();
        assert_eq!(claims.identity_id(), None);
    }

    #[test]
    fn test_expiry() {
        let claims = Claims::new(Uuid::now_v7(), "crm", Duration::hours(-1));
        assert!(claims.is_expired());
        assert_eq!(claims.expires_in(), 0);
    }

    #[test]
    fn test_unique_token_ids() {
        let id = Uuid::now_v7();
        let a = Claims::new(id, "crm", Duration::hours(1));
        let b = Claims::new(id, "crm", Duration::hours(1));
        assert_ne!(a.jti, b.jti);
    }
}
