//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FARMSTAND_DATABASE_URL` - `PostgreSQL` connection string
//! - `FARMSTAND_BASE_URL` - Public URL for the API
//! - `FARMSTAND_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `STRIPE_SECRET_KEY` - Stripe API secret key
//! - `EASYPOST_API_KEY` - `EasyPost` API key
//! - `SHIP_FROM_STREET` / `SHIP_FROM_CITY` / `SHIP_FROM_STATE` / `SHIP_FROM_ZIP`
//!   - Origin address used for rate quoting
//! - `SMTP_HOST` / `SMTP_USERNAME` / `SMTP_PASSWORD` - Mail transport
//! - `EMAIL_FROM_ADDRESS` - From mailbox for outgoing mail
//! - `CONTACT_INBOX` - Destination for contact-form relays
//!
//! ## Optional
//! - `FARMSTAND_HOST` - Bind address (default: 127.0.0.1)
//! - `FARMSTAND_PORT` - Listen port (default: 3001)
//! - `SMTP_PORT` - Mail transport port (default: 587)
//! - `ORDER_REPLY_TO` - Reply-To mailbox on order mail
//! - `ORDER_BCC` - BCC mailbox on order mail
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the API (drives the Secure cookie flag)
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Stripe payment configuration
    pub stripe: StripeConfig,
    /// `EasyPost` shipping configuration
    pub easypost: EasyPostConfig,
    /// SMTP mail configuration
    pub email: EmailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g., "production")
    pub sentry_environment: Option<String>,
}

/// Stripe API configuration.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Stripe API secret key (server-side only)
    pub secret_key: SecretString,
}

/// `EasyPost` API configuration, including the fixed ship-from address.
#[derive(Debug, Clone)]
pub struct EasyPostConfig {
    /// `EasyPost` API key
    pub api_key: SecretString,
    /// Street of the farm's shipping origin
    pub ship_from_street: String,
    /// City of the shipping origin
    pub ship_from_city: String,
    /// State of the shipping origin (full name or abbreviation)
    pub ship_from_state: String,
    /// ZIP of the shipping origin
    pub ship_from_zip: String,
}

/// SMTP mail transport configuration.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP relay hostname
    pub smtp_host: String,
    /// SMTP relay port
    pub smtp_port: u16,
    /// SMTP username
    pub smtp_username: String,
    /// SMTP password
    pub smtp_password: SecretString,
    /// From mailbox for outgoing mail (e.g., `"Farmstand" <orders@farmstand.dev>`)
    pub from_address: String,
    /// Reply-To mailbox on order confirmation/shipment mail
    pub order_reply_to: Option<String>,
    /// BCC mailbox on order confirmation/shipment mail
    pub order_bcc: Option<String>,
    /// Destination mailbox for contact-form relays
    pub contact_inbox: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("FARMSTAND_DATABASE_URL")?;
        let host = get_env_or_default("FARMSTAND_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("FARMSTAND_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("FARMSTAND_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("FARMSTAND_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("FARMSTAND_BASE_URL")?;
        let session_secret = get_validated_secret("FARMSTAND_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "FARMSTAND_SESSION_SECRET")?;

        let stripe = StripeConfig::from_env()?;
        let easypost = EasyPostConfig::from_env()?;
        let email = EmailConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            stripe,
            easypost,
            email,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: get_validated_secret("STRIPE_SECRET_KEY")?,
        })
    }
}

impl EasyPostConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_validated_secret("EASYPOST_API_KEY")?,
            ship_from_street: get_required_env("SHIP_FROM_STREET")?,
            ship_from_city: get_required_env("SHIP_FROM_CITY")?,
            ship_from_state: get_required_env("SHIP_FROM_STATE")?,
            ship_from_zip: get_required_env("SHIP_FROM_ZIP")?,
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let smtp_port = get_env_or_default("SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?;

        Ok(Self {
            smtp_host: get_required_env("SMTP_HOST")?,
            smtp_port,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_required_secret("SMTP_PASSWORD")?,
            from_address: get_required_env("EMAIL_FROM_ADDRESS")?,
            order_reply_to: get_optional_env("ORDER_REPLY_TO"),
            order_bcc: get_optional_env("ORDER_BCC"),
            contact_inbox: get_required_env("CONTACT_INBOX")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL` (set by managed
/// Postgres attachments).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    // Try primary key first (e.g., FARMSTAND_DATABASE_URL)
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    // Fallback to generic DATABASE_URL
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_changeme() {
        let result = validate_secret_strength("changeme123", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            stripe: StripeConfig {
                secret_key: SecretString::from("sk_test_abc123"),
            },
            easypost: EasyPostConfig {
                api_key: SecretString::from("EZAKtest"),
                ship_from_street: "14 Orchard Lane".to_string(),
                ship_from_city: "Corvallis".to_string(),
                ship_from_state: "Oregon".to_string(),
                ship_from_zip: "97330".to_string(),
            },
            email: EmailConfig {
                smtp_host: "smtp.test.local".to_string(),
                smtp_port: 587,
                smtp_username: "mailer".to_string(),
                smtp_password: SecretString::from("hunter2"),
                from_address: "orders@test.local".to_string(),
                order_reply_to: None,
                order_bcc: None,
                contact_inbox: "owner@test.local".to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
    }
}
