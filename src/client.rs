//! QuoIntelligence API client.
//!
//! Low-level HTTP session that logs in once, keeps the bearer token and
//! issues authenticated requests. Resource accessors live in
//! [`resources`](crate::resources) and pagination in
//! [`pagination`](crate::pagination).

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Identity, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{QiError, Result};
use crate::retry::RetryPolicy;

const USER_AGENT: &str = concat!("qintel/", env!("CARGO_PKG_VERSION"));
const LOGIN_PATH: &str = "login";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
}

/// Authenticated QuoIntelligence API session.
///
/// Construction performs the login; the token is kept for the lifetime of
/// the client and never refreshed, so an expired token shows up as a
/// [`QiError::Query`] with status 401 on later calls.
///
/// This struct is cheaply cloneable; clones share the same connection pool
/// and token. It issues one request at a time per call and does no internal
/// locking.
///
/// # Example
///
/// ```no_run
/// use qintel::{ClientConfig, QiClient};
///
/// # async fn example() -> qintel::Result<()> {
/// // From QI_API_EMAIL / QI_API_PASSWORD / QI_API_URL / QI_API_CLIENT_CERT
/// let client = QiClient::from_env().await?;
///
/// // Or configure manually
/// let config = ClientConfig::new("analyst@example.com", "secret");
/// let client = QiClient::connect(config).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QiClient {
    http: Client,
    base_url: Arc<Url>,
    token: String,
    retry: RetryPolicy,
    max_pages: Option<u32>,
}

impl std::fmt::Debug for QiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QiClient")
            .field("base_url", &self.base_url.as_str())
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

impl QiClient {
    /// Log in using configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`QiError::Config`] if credentials are missing, or any error
    /// from [`connect`](Self::connect).
    pub async fn from_env() -> Result<Self> {
        Self::connect(ClientConfig::from_env()?).await
    }

    /// Validate the configuration, log in and keep the bearer token.
    ///
    /// Issues exactly one `POST {base}/login`, which is never retried.
    ///
    /// # Errors
    ///
    /// - [`QiError::Config`] for a bad URL, insecure scheme or unusable
    ///   client certificate.
    /// - [`QiError::Authentication`] if the login is rejected or returns no
    ///   token.
    /// - [`QiError::Http`] on transport failure.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let base_url = config.api_url()?;
        let http = Self::build_http(&config).await?;
        let token = Self::login(&http, &base_url, &config.email, &config.password).await?;

        debug!(base_url = %base_url, "logged in");

        Ok(Self {
            http,
            base_url: Arc::new(base_url),
            token,
            retry: config.retry,
            max_pages: config.max_pages,
        })
    }

    async fn build_http(config: &ClientConfig) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(config.timeout);

        if let Some(path) = &config.client_cert {
            let pem = tokio::fs::read(path).await.map_err(|e| {
                QiError::Config(format!(
                    "cannot read client certificate {}: {e}",
                    path.display()
                ))
            })?;
            let identity = Identity::from_pem(&pem).map_err(|e| {
                QiError::Config(format!(
                    "invalid client certificate {}: {e}",
                    path.display()
                ))
            })?;
            builder = builder.use_rustls_tls().identity(identity);
        }

        builder.build().map_err(QiError::Http)
    }

    #[tracing::instrument(skip(http, base_url, password), fields(base_url = %base_url))]
    async fn login(http: &Client, base_url: &Url, email: &str, password: &str) -> Result<String> {
        let url = base_url.join(LOGIN_PATH)?;

        let response = http
            .post(url)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(QiError::Http)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "login rejected");
            return Err(QiError::Authentication(format!(
                "login rejected with HTTP {status}"
            )));
        }

        let body: LoginResponse = response.json().await.map_err(|e| {
            QiError::Authentication(format!("malformed login response: {e}"))
        })?;

        body.access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                QiError::Authentication("login response carried no access_token".to_string())
            })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Page guard configured for this client.
    pub fn max_pages(&self) -> Option<u32> {
        self.max_pages
    }

    /// Make an authenticated GET request.
    ///
    /// Non-success statuses become [`QiError::Query`] carrying the body.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, path: &str) -> Result<Response> {
        let response = self.execute::<()>(Method::GET, path, None).await?;
        Self::check_response(path, response).await
    }

    /// Make an authenticated GET request with query parameters.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_with_query<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<Response> {
        let response = self.execute(Method::GET, path, Some(query)).await?;
        Self::check_response(path, response).await
    }

    /// GET a path and decode its JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.get(path).await?;
        let body = response.text().await.map_err(QiError::Http)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send a request, retrying idempotent methods per the retry policy.
    async fn execute<Q: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
    ) -> Result<Response> {
        // Relative to the API prefix, even if the caller wrote "/drp"
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        let retryable = self.retry.allows(&method);
        let mut attempt = 0;

        loop {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .bearer_auth(&self.token);
            if let Some(query) = query {
                request = request.query(query);
            }

            let can_retry = retryable && attempt < self.retry.max_retries;

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if can_retry && RetryPolicy::is_retryable_status(status) {
                        let delay = self.retry.delay_for(status, response.headers(), attempt);
                        warn!(
                            "Request to {} failed with {}, attempt {}/{}, retrying in {:?}",
                            path,
                            status.as_u16(),
                            attempt + 1,
                            self.retry.max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Ok(response);
                }
                Err(e) if can_retry && (e.is_connect() || e.is_timeout()) => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        "Request to {} failed ({}), attempt {}/{}, retrying in {:?}",
                        path,
                        e,
                        attempt + 1,
                        self.retry.max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(QiError::Http(e)),
            }
        }
    }

    /// Check response status and convert errors.
    async fn check_response(path: &str, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(_) => format!("HTTP {status}"),
        };

        Err(QiError::Query {
            path: path.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[tokio::test]
    async fn test_connect_rejects_insecure_url_before_network() {
        let config = ClientConfig::new("a@b.c", "pw").with_base_url("http://api.example.com");
        let err = QiClient::connect(config).await.unwrap_err();
        assert!(matches!(err, QiError::Config(_)));
    }

    #[tokio::test]
    async fn test_connect_reports_missing_certificate() {
        let config = ClientConfig::new("a@b.c", "pw")
            .with_base_url("https://127.0.0.1:1")
            .with_client_cert("/nonexistent/qintel-client.pem");
        let err = QiClient::connect(config).await.unwrap_err();
        match err {
            QiError::Config(msg) => assert!(msg.contains("client certificate")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_login_response_without_token_deserializes() {
        let body: LoginResponse = serde_json::from_str(r#"{"message": "ok"}"#).unwrap();
        assert!(body.access_token.is_none());
    }
}
