//! Client configuration.
//!
//! Everything the client needs is carried by [`ClientConfig`], built either
//! explicitly or from the `QI_API_*` environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{QiError, Result};
use crate::retry::RetryPolicy;

/// Production API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.quointelligence.eu/v0.1";

/// Environment variable holding the account email.
pub const ENV_EMAIL: &str = "QI_API_EMAIL";
/// Environment variable holding the account password.
pub const ENV_PASSWORD: &str = "QI_API_PASSWORD";
/// Environment variable overriding the API base URL.
pub const ENV_URL: &str = "QI_API_URL";
/// Environment variable pointing at a PEM client certificate.
pub const ENV_CLIENT_CERT: &str = "QI_API_CLIENT_CERT";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration for a [`QiClient`](crate::QiClient).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use qintel::ClientConfig;
///
/// let config = ClientConfig::new("analyst@example.com", "secret")
///     .with_base_url("https://api.quointelligence.eu/v0.1")
///     .with_timeout(Duration::from_secs(60))
///     .with_max_pages(500);
/// assert_eq!(config.max_pages, Some(500));
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
    /// API base URL.
    pub base_url: String,
    /// Optional PEM file holding a client certificate and its private key.
    pub client_cert: Option<PathBuf>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy for idempotent requests.
    pub retry: RetryPolicy,
    /// Stop paginating after this many requests. `None` means unbounded.
    pub max_pages: Option<u32>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("email", &self.email)
            .field("base_url", &self.base_url)
            .field("client_cert", &self.client_cert)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Create a configuration for the production endpoint.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            base_url: DEFAULT_API_URL.to_string(),
            client_cert: None,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            max_pages: None,
        }
    }

    /// Create a configuration from environment variables.
    ///
    /// Reads `QI_API_EMAIL` and `QI_API_PASSWORD` (required), plus
    /// `QI_API_URL` and `QI_API_CLIENT_CERT` (optional).
    ///
    /// # Errors
    ///
    /// Returns [`QiError::Config`] if a required variable is not set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), but explicit values win over the
    /// environment and only missing pieces are looked up.
    ///
    /// # Errors
    ///
    /// Returns [`QiError::Config`] if email or password is available from
    /// neither source.
    pub fn from_env_with(email: Option<String>, password: Option<String>) -> Result<Self> {
        Self::from_lookup(|key| match key {
            ENV_EMAIL if email.is_some() => email.clone(),
            ENV_PASSWORD if password.is_some() => password.clone(),
            _ => env::var(key).ok(),
        })
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key).filter(|v| !v.is_empty()).ok_or_else(|| {
                QiError::Config(format!(
                    "Must specify parameter or define environment variable {key}"
                ))
            })
        };

        let mut config = Self::new(require(ENV_EMAIL)?, require(ENV_PASSWORD)?);
        if let Some(url) = lookup(ENV_URL).filter(|v| !v.is_empty()) {
            config.base_url = url;
        }
        config.client_cert = lookup(ENV_CLIENT_CERT)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    /// Override the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Use a client certificate (PEM with certificate and key).
    #[must_use]
    pub fn with_client_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.client_cert = Some(path.into());
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Cap the number of requests a single paginated query may issue.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Validate and normalize the base URL.
    ///
    /// The URL must use `https`, or plain `http` against a loopback host for
    /// local testing. The result always ends with `/` so relative resource
    /// paths join below it.
    ///
    /// # Errors
    ///
    /// Returns [`QiError::Config`] for unparsable URLs or insecure schemes.
    pub fn api_url(&self) -> Result<Url> {
        let trimmed = self.base_url.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(QiError::Config("API url must not be empty".to_string()));
        }

        let url = Url::parse(&format!("{trimmed}/"))
            .map_err(|e| QiError::Config(format!("API url '{trimmed}' is invalid: {e}")))?;

        let secure = match url.scheme() {
            "https" => true,
            "http" => matches!(
                url.host_str(),
                Some("localhost" | "127.0.0.1" | "[::1]")
            ),
            _ => false,
        };
        if !secure {
            return Err(QiError::Config(format!(
                "API url must specify https:// (got '{trimmed}')"
            )));
        }

        Ok(url)
    }
}
