//! Server configuration
//!
//! Defaults are overridden by environment variables (after an optional `.env`
//! has been loaded by the binary). Overrides go through a resolver function so
//! tests never touch the process environment.

use chrono::Duration;
use crm_auth::{JwtAlgorithm, JwtConfig};
use std::net::SocketAddr;
use thiserror::Error;

use crate::logging::LogFormat;

/// Calls per month an agent is expected to make when nothing is configured.
pub const DEFAULT_MONTHLY_CALL_TARGET: u32 = 500;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable holds a value that cannot be used.
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// First administrator created at startup when no account uses its email.
#[derive(Clone)]
pub struct AdminBootstrap {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Cleartext password
    pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// HTTP server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Listen address
    pub bind_address: SocketAddr,
    /// JWT signing secret
    pub jwt_secret: Option<String>,
    /// JWT issuer
    pub jwt_issuer: String,
    /// Token lifetime in hours
    pub token_ttl_hours: i64,
    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,
    /// Log output format
    pub log_format: LogFormat,
    /// Administrator to create at startup
    pub admin: Option<AdminBootstrap>,
    /// Monthly call goal reported by the call-target statistics
    pub monthly_call_target: u32,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_address", &self.bind_address)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("jwt_issuer", &self.jwt_issuer)
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("cors_origins", &self.cors_origins)
            .field("log_format", &self.log_format)
            .field("admin", &self.admin)
            .field("monthly_call_target", &self.monthly_call_target)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 5000)),
            jwt_secret: None,
            jwt_issuer: "crm".to_string(),
            token_ttl_hours: 24 * 30,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            log_format: LogFormat::Human,
            admin: None,
            monthly_call_target: DEFAULT_MONTHLY_CALL_TARGET,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_resolver(|key| std::env::var(key).ok())
    }

    /// Load configuration through a custom variable resolver.
    pub fn from_resolver(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(env)?;
        Ok(config)
    }

    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let env = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = env("CRM_BIND_ADDRESS") {
            self.bind_address = v.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "CRM_BIND_ADDRESS",
                reason: e.to_string(),
            })?;
        }
        if let Some(v) = env("CRM_JWT_SECRET") {
            self.jwt_secret = Some(v);
        }
        if let Some(v) = env("CRM_JWT_ISSUER") {
            self.jwt_issuer = v;
        }
        if let Some(v) = env("CRM_TOKEN_TTL_HOURS") {
            self.token_ttl_hours = match v.parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "CRM_TOKEN_TTL_HOURS",
                        reason: format!("expected a positive number of hours, got {v:?}"),
                    })
                }
            };
        }
        if let Some(v) = env("CRM_CORS_ORIGINS") {
            self.cors_origins = v
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = env("CRM_LOG_FORMAT") {
            self.log_format = LogFormat::parse(&v).ok_or_else(|| ConfigError::Invalid {
                key: "CRM_LOG_FORMAT",
                reason: format!("expected \"json\" or \"human\", got {v:?}"),
            })?;
        }
        if let Some(v) = env("CRM_MONTHLY_CALL_TARGET") {
            self.monthly_call_target = match v.parse::<u32>() {
                Ok(target) if target > 0 => target,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "CRM_MONTHLY_CALL_TARGET",
                        reason: format!("expected a positive number of calls, got {v:?}"),
                    })
                }
            };
        }

        match (env("CRM_ADMIN_EMAIL"), env("CRM_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => {
                self.admin = Some(AdminBootstrap {
                    name: env("CRM_ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
                    email,
                    password,
                });
            }
            (Some(_), None) => return Err(ConfigError::Missing("CRM_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("CRM_ADMIN_EMAIL")),
            (None, None) => {}
        }
        Ok(())
    }

    /// JWT settings derived from this configuration.
    pub fn jwt_config(&self) -> Result<JwtConfig, ConfigError> {
        let secret = self
            .jwt_secret
            .clone()
            .ok_or(ConfigError::Missing("CRM_JWT_SECRET"))?;
        if secret.len() < crm_auth::jwt::MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "CRM_JWT_SECRET",
                reason: format!("must be at least {} bytes", crm_auth::jwt::MIN_SECRET_LEN),
            });
        }
        Ok(JwtConfig {
            secret,
            algorithm: JwtAlgorithm::HS256,
            issuer: self.jwt_issuer.clone(),
            token_duration: Duration::hours(self.token_ttl_hours),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolver(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_resolver(|_| None).unwrap();
        assert_eq!(config.bind_address.port(), 5000);
        assert_eq!(config.token_ttl_hours, 720);
        assert_eq!(config.cors_origins.len(), 2);
        assert!(config.admin.is_none());
        assert_eq!(config.monthly_call_target, DEFAULT_MONTHLY_CALL_TARGET);
        assert_eq!(config.jwt_config().unwrap_err(), ConfigError::Missing("CRM_JWT_SECRET"));
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::from_resolver(resolver(&[
            ("CRM_BIND_ADDRESS", "127.0.0.1:8080"),
            ("CRM_JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("CRM_TOKEN_TTL_HOURS", "2"),
            ("CRM_CORS_ORIGINS", "https://crm.example.com, ,https://admin.example.com"),
            ("CRM_LOG_FORMAT", "json"),
            ("CRM_ADMIN_EMAIL", "root@example.com"),
            ("CRM_ADMIN_PASSWORD", "change-me-now"),
            ("CRM_MONTHLY_CALL_TARGET", "120"),
        ]))
        .unwrap();

        assert_eq!(config.monthly_call_target, 120);
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.cors_origins, ["https://crm.example.com", "https://admin.example.com"]);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.admin.as_ref().map(|a| a.name.as_str()), Some("Administrator"));

        let jwt = config.jwt_config().unwrap();
        assert_eq!(jwt.token_duration, Duration::hours(2));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(ServerConfig::from_resolver(resolver(&[("CRM_BIND_ADDRESS", "nowhere")])).is_err());
        assert!(ServerConfig::from_resolver(resolver(&[("CRM_TOKEN_TTL_HOURS", "0")])).is_err());
        assert!(ServerConfig::from_resolver(resolver(&[("CRM_LOG_FORMAT", "xml")])).is_err());
        assert!(ServerConfig::from_resolver(resolver(&[("CRM_MONTHLY_CALL_TARGET", "0")])).is_err());
        assert!(ServerConfig::from_resolver(resolver(&[("CRM_MONTHLY_CALL_TARGET", "lots")])).is_err());
        assert_eq!(
            ServerConfig::from_resolver(resolver(&[("CRM_ADMIN_EMAIL", "root@example.com")])).unwrap_err(),
            ConfigError::Missing("CRM_ADMIN_PASSWORD")
        );
    }

    #[test]
    fn test_short_secret() {
        let config = ServerConfig::from_resolver(resolver(&[("CRM_JWT_SECRET", "short")])).unwrap();
        assert!(matches!(
            config.jwt_config(),
            Err(ConfigError::Invalid { key: "CRM_JWT_SECRET", .. })
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ServerConfig::from_resolver(resolver(&[
            ("CRM_JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("CRM_ADMIN_EMAIL", "root@example.com"),
            ("CRM_ADMIN_PASSWORD", "change-me-now"),
        ]))
        .unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("0123456789abcdef"));
        assert!(!printed.contains("change-me-now"));
    }
}
