//! Client configuration and the scoped-override context.

use std::sync::Arc;

use secrecy::SecretString;

/// Connection settings for an OpenAI-style endpoint.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) api_key: SecretString,
    pub(crate) base_url: String,
    pub(crate) organization: Option<String>,
    pub(crate) http: reqwest::Client,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: "https://api.openai.com/v1".to_string(),
            organization: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies, connection pool).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }
}

/// Read-only configuration shared by any number of concurrent invocations.
///
/// Cloning is cheap. [`scoped`](Self::scoped) rebinds the configuration for
/// a subtree of work without touching the parent context, so an override
/// never leaks upward.
#[derive(Debug, Clone)]
pub struct ClientContext {
    inner: Arc<ClientConfig>,
}

impl ClientContext {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(config),
        }
    }

    /// A child context bound to a different configuration.
    pub fn scoped(&self, config: ClientConfig) -> Self {
        Self::new(config)
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.inner
    }
}
