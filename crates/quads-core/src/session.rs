//! Authenticated session and the `request` primitive.
//!
//! A [`QuadsSession`] owns the pooled HTTP client, the retry policy and the
//! bearer-token state. Requests made before [`QuadsSession::login`] (or after
//! [`QuadsSession::logout`]) carry no `Authorization` header.
//!
//! Every response goes through the same classification:
//!
//! - `500` becomes [`Error::ServerError`] with a fixed message,
//! - `400` becomes [`Error::BadRequest`] with the body's `message` field,
//! - anything else is returned as an [`ApiResponse`] with the decoded body.

use crate::client::{ClientConfig, RetryPolicy};
use crate::config::QuadsConfig;
use crate::endpoint::{join_url, Endpoint};
use crate::error::{BAD_REQUEST_PARSE_MESSAGE, SERVER_ERROR_MESSAGE};
use crate::{Error, ErrorKind, Result};
use reqwest::header::ACCEPT;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;
use validator::Validate;

const USER_AGENT: &str = concat!("quads-core/", env!("CARGO_PKG_VERSION"));

/// Path of the login route, relative to the base URL.
pub const LOGIN_PATH: &str = "login";
/// Path of the logout route, relative to the base URL.
pub const LOGOUT_PATH: &str = "logout";

const LOGIN_OK: u64 = 201;
const LOGOUT_OK: u64 = 200;

/// A classified, successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status of the final attempt
    pub status: StatusCode,
    /// Decoded JSON body; `Value::Null` when the body was empty
    pub body: Value,
}

impl ApiResponse {
    /// Consume the response, keeping only the decoded body.
    #[must_use]
    pub fn into_body(self) -> Value {
        self.body
    }
}

/// Authentication state of a session.
#[derive(Debug, Clone, Default)]
pub enum AuthState {
    /// No token; requests are sent without credentials.
    #[default]
    Unauthenticated,
    /// A bearer token issued by `POST /login`.
    Authenticated(SecretString),
}

impl AuthState {
    /// Whether a token is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

#[derive(Debug, Clone)]
struct Credentials {
    username: String,
    password: SecretString,
}

enum Auth<'a> {
    Anonymous,
    Basic(&'a Credentials),
    Bearer(&'a SecretString),
}

impl Auth<'_> {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Anonymous => request,
            Self::Basic(credentials) => request.basic_auth(
                &credentials.username,
                Some(credentials.password.expose_secret()),
            ),
            Self::Bearer(token) => request.bearer_auth(token.expose_secret()),
        }
    }
}

/// Builder for [`QuadsSession`].
#[derive(Debug, Clone)]
pub struct QuadsSessionBuilder {
    base_url: Url,
    http_config: ClientConfig,
    user_agent: String,
    credentials: Option<Credentials>,
}

impl QuadsSessionBuilder {
    /// Create a builder for the specified base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|err| Error::ConfigError(format!("Invalid API URL: {err}")))?;

        Ok(Self {
            base_url,
            http_config: ClientConfig::new(),
            user_agent: USER_AGENT.to_string(),
            credentials: None,
        })
    }

    /// Create a builder from a [`QuadsConfig`].
    ///
    /// The configuration is validated first, so values set through its
    /// builder methods are held to the same ranges as deserialized ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if a field is out of range, and
    /// [`Error::ConfigError`] if the URL cannot be parsed or only one of
    /// username and password is set.
    pub fn from_config(config: &QuadsConfig) -> Result<Self> {
        config.validate()?;
        let credentials = config
            .credentials()?
            .map(|(username, password)| Credentials {
                username: username.to_string(),
                password: password.clone(),
            });

        Ok(Self {
            base_url: config.parse_api_url()?,
            http_config: config.client_config(),
            user_agent: USER_AGENT.to_string(),
            credentials,
        })
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.http_config.retry_policy = retry;
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Configure the credentials sent with HTTP basic auth on login.
    #[must_use]
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: SecretString::from(password.into()),
        });
        self
    }

    /// Build the session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the CA certificate cannot be loaded
    /// or the HTTP client cannot be constructed.
    pub fn build(self) -> Result<QuadsSession> {
        let config = self.http_config;

        let mut builder = ClientBuilder::new()
            .user_agent(self.user_agent)
            .timeout(config.timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .connect_timeout(Duration::from_secs(10))
            .gzip(config.enable_compression);

        if !config.tls_verify {
            warn!("TLS verification disabled for QUADS client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &config.tls_ca_cert {
            debug!("loading QUADS CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes)
                .map_err(|err| Error::ConfigError(format!("Invalid CA certificate: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder.build().map_err(|err| {
            Error::ConfigError(format!("Failed to build QUADS HTTP client: {err}"))
        })?;

        Ok(QuadsSession {
            http,
            base_url: self.base_url,
            credentials: self.credentials.map(Arc::new),
            retry_policy: config.retry_policy,
            auth: Arc::new(RwLock::new(AuthState::Unauthenticated)),
        })
    }
}

/// Authenticated connection to a QUADS server.
///
/// Clones share the connection pool and the token, so logging in through one
/// clone authenticates all of them. Login and logout take the token lock for
/// writing across their round trip; requests hold it for reading, so no
/// request is sent with a token that is being replaced or cleared.
#[derive(Debug, Clone)]
pub struct QuadsSession {
    http: Client,
    base_url: Url,
    credentials: Option<Arc<Credentials>>,
    retry_policy: RetryPolicy,
    auth: Arc<RwLock<AuthState>>,
}

impl QuadsSession {
    /// Construct a session directly from the base URL, without credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        QuadsSessionBuilder::new(base_url)?.build()
    }

    /// Start a builder for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the URL cannot be parsed.
    pub fn builder(base_url: impl AsRef<str>) -> Result<QuadsSessionBuilder> {
        QuadsSessionBuilder::new(base_url)
    }

    /// Construct a session from a [`QuadsConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot produce a client.
    pub fn from_config(config: &QuadsConfig) -> Result<Self> {
        QuadsSessionBuilder::from_config(config)?.build()
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Return the retry policy applied to every request.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Resolve an endpoint path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the path does not form a valid URL.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        join_url(&self.base_url, path)
    }

    /// Whether a bearer token is currently held.
    pub async fn is_authenticated(&self) -> bool {
        self.auth.read().await.is_authenticated()
    }

    /// Send `body` (if the endpoint takes one) to `endpoint` and classify the response.
    ///
    /// # Errors
    ///
    /// See [`QuadsSession::request`].
    pub async fn call<B>(&self, endpoint: &Endpoint, body: Option<&B>) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let body = if endpoint.expects_body { body } else { None };
        self.request(endpoint.method.clone(), &endpoint.path, body)
            .await
    }

    /// Send a request and classify the response.
    ///
    /// `body` is serialized as JSON for `POST`, `PUT` and `PATCH` and ignored
    /// for other verbs.
    ///
    /// # Errors
    ///
    /// - [`Error::ServerError`] on HTTP 500.
    /// - [`Error::BadRequest`] on HTTP 400.
    /// - [`Error::Transport`] or [`Error::Timeout`] when no usable response arrives,
    ///   including when every attempt hit a retryable status.
    /// - [`Error::ParseError`] when a success body is not JSON.
    pub async fn request<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url_for(path)?;
        let body = if matches!(method, Method::POST | Method::PUT | Method::PATCH) {
            body
        } else {
            None
        };

        let state = self.auth.read().await;
        let auth = match &*state {
            AuthState::Authenticated(token) => Auth::Bearer(token),
            AuthState::Unauthenticated => Auth::Anonymous,
        };
        let outcome = match self.execute_with_retry(&method, &url, &auth, body).await {
            Ok(response) => classify_response(response).await,
            Err(err) => Err(err),
        };
        drop(state);

        if let Err(err) = &outcome {
            if err.should_log() {
                warn!(%method, %url, error = %err, "QUADS request failed");
            } else {
                debug!(%method, %url, error = %err, "QUADS request rejected");
            }
        }
        outcome
    }

    /// Obtain a bearer token with the configured credentials.
    ///
    /// Logging in while already authenticated replaces the token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] without credentials, and
    /// [`Error::AuthenticationFailed`] if the server does not report `201`.
    pub async fn login(&self) -> Result<()> {
        let credentials = self.credentials.as_deref().ok_or_else(|| {
            Error::ConfigError("no API credentials configured for login".to_string())
        })?;

        let mut state = self.auth.write().await;
        let url = self.url_for(LOGIN_PATH)?;
        let response = self
            .execute_with_retry::<()>(&Method::POST, &url, &Auth::Basic(credentials), None)
            .await?;
        let response = classify_response(response).await?;

        if status_code_of(&response.body) != Some(LOGIN_OK) {
            return Err(Error::AuthenticationFailed(format!(
                "login rejected: {}",
                message_of(&response.body)
            )));
        }

        let token = response
            .body
            .get("auth_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::AuthenticationFailed("login response carried no auth_token".to_string())
            })?;

        *state = AuthState::Authenticated(SecretString::from(token.to_string()));
        info!(username = %credentials.username, "logged in to QUADS");
        Ok(())
    }

    /// Invalidate the bearer token.
    ///
    /// A no-op when not authenticated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthenticationFailed`] if the server does not report
    /// `200`; the token is kept in that case.
    pub async fn logout(&self) -> Result<()> {
        let mut state = self.auth.write().await;
        let AuthState::Authenticated(token) = &*state else {
            debug!("logout requested without an active token");
            return Ok(());
        };

        let url = self.url_for(LOGOUT_PATH)?;
        let response = self
            .execute_with_retry::<()>(&Method::POST, &url, &Auth::Bearer(token), None)
            .await?;
        let response = classify_response(response).await?;

        if status_code_of(&response.body) != Some(LOGOUT_OK) {
            return Err(Error::AuthenticationFailed(format!(
                "logout rejected: {}",
                message_of(&response.body)
            )));
        }

        *state = AuthState::Unauthenticated;
        info!("logged out of QUADS");
        Ok(())
    }

    /// Log out and release the session.
    ///
    /// The connection pool is dropped once the last clone goes away.
    ///
    /// # Errors
    ///
    /// Propagates the logout failure, if any.
    pub async fn close(self) -> Result<()> {
        self.logout().await
    }

    async fn execute_with_retry<B>(
        &self,
        method: &Method,
        url: &Url,
        auth: &Auth<'_>,
        body: Option<&B>,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let policy = &self.retry_policy;
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .header(ACCEPT, "application/json");
            request = auth.apply(request);
            if let Some(payload) = body {
                request = request.json(payload);
            }

            debug!(%method, %url, attempt, "sending QUADS request");

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if !policy.should_retry_status(status) {
                        return Ok(response);
                    }
                    if attempt >= max_attempts {
                        return Err(Error::Transport(format!(
                            "{method} {url} gave up after {attempt} attempts: last status {status}"
                        )));
                    }
                    warn!(%method, %url, %status, attempt, "retryable status from QUADS");
                }
                Err(err) => {
                    let error = Error::from(err);
                    let retryable = policy.retry_on_connect_errors
                        && error.kind() == ErrorKind::Transport
                        && attempt < max_attempts;
                    if !retryable {
                        return Err(error);
                    }
                    warn!(%method, %url, attempt, error = %error, "QUADS request failed");
                }
            }

            let delay = policy.delay_for_attempt(attempt);
            attempt += 1;
            if !delay.is_zero() {
                debug!("retrying QUADS request after {:?}", delay);
                sleep(delay).await;
            }
        }
    }
}

async fn classify_response(response: Response) -> Result<ApiResponse> {
    let status = response.status();
    let bytes = response.bytes().await?;
    classify(status, &bytes)
}

/// Apply the status classification to a raw response.
pub(crate) fn classify(status: StatusCode, body: &[u8]) -> Result<ApiResponse> {
    match status {
        StatusCode::INTERNAL_SERVER_ERROR => {
            Err(Error::ServerError(SERVER_ERROR_MESSAGE.to_string()))
        }
        StatusCode::BAD_REQUEST => match serde_json::from_slice::<Value>(body) {
            Ok(json) => Err(Error::BadRequest(message_of(&json))),
            Err(_) => Err(Error::BadRequest(BAD_REQUEST_PARSE_MESSAGE.to_string())),
        },
        _ => {
            let body = if body.iter().all(u8::is_ascii_whitespace) {
                Value::Null
            } else {
                serde_json::from_slice(body).map_err(|err| {
                    Error::ParseError(format!("{status} response is not JSON: {err}"))
                })?
            };
            Ok(ApiResponse { status, body })
        }
    }
}

fn message_of(body: &Value) -> String {
    match body.get("message") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
    }
}

fn status_code_of(body: &Value) -> Option<u64> {
    body.get("status_code").and_then(Value::as_u64)
}
