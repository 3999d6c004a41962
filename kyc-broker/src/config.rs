//! Broker configuration

use serde::Deserialize;

const DEFAULT_REFERENCE_SALT: &str = "dev-reference-salt";
const DEFAULT_JWT_SECRET: &str = "dev-jwt-secret";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// SQLite database path; None keeps everything in memory
    pub database: Option<String>,

    /// Salt mixed into reference number hashes
    pub reference_salt: String,

    /// HS256 signing secret for issued tokens
    pub jwt_secret: String,

    /// Access token lifetime in seconds (default 7 days)
    pub access_ttl_secs: i64,

    /// Refresh token lifetime in seconds (default 30 days)
    pub refresh_ttl_secs: i64,

    /// Verification session lifetime in seconds (default 2 hours)
    pub session_ttl_secs: i64,

    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,

    /// Master toggle for all rate limiters
    pub rate_limiting: bool,

    /// Fabricate a deterministic stand-in record when extraction
    /// fails. Never on by default.
    pub demo_mode: bool,

    /// Session sweep interval in seconds
    pub sweep_interval_secs: u64,

    /// Auth events older than this are pruned
    pub audit_retention_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            database: None,
            reference_salt: DEFAULT_REFERENCE_SALT.to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            access_ttl_secs: 7 * 24 * 3600,
            refresh_ttl_secs: 30 * 24 * 3600,
            session_ttl_secs: 2 * 3600,
            max_upload_bytes: 2 * 1024 * 1024,
            rate_limiting: true,
            demo_mode: false,
            sweep_interval_secs: 60,
            audit_retention_days: 90,
        }
    }
}

impl Config {
    /// Build configuration from environment variables, falling back to
    /// defaults field by field.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            port: env_parse("KYC_PORT", defaults.port),
            database: std::env::var("KYC_DATABASE").ok(),
            reference_salt: std::env::var("KYC_REFERENCE_SALT")
                .unwrap_or(defaults.reference_salt),
            jwt_secret: std::env::var("KYC_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            access_ttl_secs: env_parse("KYC_ACCESS_TTL_SECS", defaults.access_ttl_secs),
            refresh_ttl_secs: env_parse("KYC_REFRESH_TTL_SECS", defaults.refresh_ttl_secs),
            session_ttl_secs: env_parse("KYC_SESSION_TTL_SECS", defaults.session_ttl_secs),
            max_upload_bytes: env_parse("KYC_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            rate_limiting: env_parse("KYC_RATE_LIMITING", defaults.rate_limiting),
            demo_mode: env_parse("KYC_DEMO_MODE", defaults.demo_mode),
            sweep_interval_secs: env_parse("KYC_SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs),
            audit_retention_days: env_parse(
                "KYC_AUDIT_RETENTION_DAYS",
                defaults.audit_retention_days,
            ),
        };
        config.warn_on_insecure_defaults();
        config
    }

    fn warn_on_insecure_defaults(&self) {
        if self.reference_salt == DEFAULT_REFERENCE_SALT {
            tracing::warn!("KYC_REFERENCE_SALT not set, using insecure default");
        }
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            tracing::warn!("KYC_JWT_SECRET not set, using insecure default");
        }
        if self.demo_mode {
            tracing::warn!("demo mode enabled, failed extractions will fabricate records");
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.session_ttl_secs, 7200);
        assert_eq!(config.access_ttl_secs, 604800);
        assert_eq!(config.refresh_ttl_secs, 2592000);
        assert!(!config.demo_mode);
        assert!(config.rate_limiting);
    }
}
