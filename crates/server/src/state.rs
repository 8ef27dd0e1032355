//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::easypost::{EasyPostClient, EasyPostError};
use crate::services::email::{EmailService, EmailTransportError};
use crate::services::stripe::{StripeClient, StripeError};

/// Error constructing application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("easypost client: {0}")]
    EasyPost(#[from] EasyPostError),
    #[error("stripe client: {0}")]
    Stripe(#[from] StripeError),
    #[error("mail transport: {0}")]
    Email(#[from] EmailTransportError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections, configuration, and the
/// external-service clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    easypost: EasyPostClient,
    stripe: StripeClient,
    email: EmailService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if any of the external-service clients cannot be
    /// constructed (bad API key header, unreachable SMTP relay config).
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateError> {
        let easypost = EasyPostClient::new(&config.easypost)?;
        let stripe = StripeClient::new(&config.stripe)?;
        let email = EmailService::new(&config.email)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                easypost,
                stripe,
                email,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the `EasyPost` client.
    #[must_use]
    pub fn easypost(&self) -> &EasyPostClient {
        &self.inner.easypost
    }

    /// Get a reference to the Stripe client.
    #[must_use]
    pub fn stripe(&self) -> &StripeClient {
        &self.inner.stripe
    }

    /// Get a reference to the email service.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }
}
