//! HTTP session construction
//!
//! A [`Session`] bundles a `reqwest::Client` with the identity it presents
//! and the proxy it egresses through. Sessions are never modified: a new
//! identity always means a new session from [`SessionProvisioner::create_session`].

use crate::config::Config;
use crate::session::control::{ControlPort, IdentityRenewer};
use crate::session::identity::IdentityPool;
use crate::Result;
use reqwest::{Client, Proxy};
use std::time::Duration;

/// An HTTP client bound to one identity and one egress route
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    identity: String,
    proxy_endpoint: Option<String>,
    timeout: Duration,
}

impl Session {
    /// Builds a session that connects directly, bypassing any proxy
    ///
    /// Intended for diagnostics against local servers; crawl runs always go
    /// through [`SessionProvisioner::create_session`].
    pub fn direct(identity: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::build(identity.into(), None, timeout)
    }

    fn build(identity: String, proxy_endpoint: Option<String>, timeout: Duration) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(identity.as_str())
            .timeout(timeout)
            .connect_timeout(timeout)
            .gzip(true)
            .brotli(true);

        builder = match &proxy_endpoint {
            // One proxy for both plaintext and TLS traffic
            Some(endpoint) => builder.proxy(Proxy::all(endpoint.as_str())?),
            None => builder.no_proxy(),
        };

        Ok(Self {
            client: builder.build()?,
            identity,
            proxy_endpoint,
            timeout,
        })
    }

    /// The underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// User agent presented by this session
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Proxy this session routes through, if any
    pub fn proxy_endpoint(&self) -> Option<&str> {
        self.proxy_endpoint.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Creates anonymized sessions with a fresh network path and a random identity
pub struct SessionProvisioner {
    pool: IdentityPool,
    renewer: Box<dyn IdentityRenewer>,
    proxy_endpoint: String,
    timeout: Duration,
}

impl SessionProvisioner {
    /// Creates a provisioner
    ///
    /// # Arguments
    ///
    /// * `pool` - User agents to choose from
    /// * `renewer` - Mechanism used to request a new network path
    /// * `proxy_endpoint` - Proxy URL every session is routed through
    /// * `timeout` - Request timeout applied to every session
    pub fn new(
        pool: IdentityPool,
        renewer: Box<dyn IdentityRenewer>,
        proxy_endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            pool,
            renewer,
            proxy_endpoint: proxy_endpoint.into(),
            timeout,
        }
    }

    /// Creates a provisioner backed by the configured control port
    pub fn from_config(config: &Config) -> Result<Self> {
        let pool = IdentityPool::from_config(&config.identity)?;
        let control = ControlPort::from_config(&config.anonymizer);

        Ok(Self::new(
            pool,
            Box::new(control),
            config.anonymizer.proxy_endpoint.clone(),
            Duration::from_secs(config.crawler.request_timeout),
        ))
    }

    /// Asks the anonymizing service for a new network path
    ///
    /// # Errors
    ///
    /// * `VeilError::Authentication` - The credential was rejected
    /// * `VeilError::ControlChannel` - The control service could not be used
    pub async fn renew_identity(&self) -> Result<()> {
        self.renewer.renew_identity().await
    }

    /// Renews the identity once, then builds a proxied session with a random user agent
    pub async fn create_session(&self) -> Result<Session> {
        self.renew_identity().await?;

        let identity = self.random_identity().to_string();
        tracing::debug!(
            "Building session via {} as '{}'",
            self.proxy_endpoint,
            identity
        );

        Session::build(identity, Some(self.proxy_endpoint.clone()), self.timeout)
    }

    /// Picks a user agent uniformly at random from the pool
    pub fn random_identity(&self) -> &str {
        self.pool.random_identity()
    }

    pub fn pool(&self) -> &IdentityPool {
        &self.pool
    }

    pub fn proxy_endpoint(&self) -> &str {
        &self.proxy_endpoint
    }
}
