//! HTTP client for the remote task API and the error taxonomy callers
//! branch on.

pub mod types;

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Config;
use crate::session::SessionStore;

/// Standard User-Agent header for tusk API requests.
pub const USER_AGENT: &str = concat!("tusk/", env!("CARGO_PKG_VERSION"));

/// Categories of API errors for consistent error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Connectivity or timeout failure; nothing reached the server.
    Transport,
    /// Non-2xx with an application-level message body.
    Api,
    /// HTTP 401; the caller must route to re-authentication.
    AuthRequired,
    /// Duplicate resource (e.g. email already registered).
    Duplicate,
    /// Failed to parse the response body.
    Parse,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::Api => write!(f, "api"),
            ApiErrorKind::AuthRequired => write!(f, "auth_required"),
            ApiErrorKind::Duplicate => write!(f, "duplicate"),
            ApiErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from the API with kind and details.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ApiError {
    /// Fallback shown for application errors without a message body.
    pub const GENERIC_MESSAGE: &'static str = "Something went wrong. Please try again.";
    /// Shown for connectivity failures; retryable by user action.
    pub const TRANSPORT_MESSAGE: &'static str =
        "Network error. Check your connection and try again.";

    /// Creates a transport-level error from a request failure.
    pub fn transport(err: &reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Transport,
            status: None,
            message: Self::TRANSPORT_MESSAGE.to_string(),
            details: Some(err.to_string()),
        }
    }

    /// Classifies a non-2xx response by status and body.
    ///
    /// 401 is always an authentication error. 409, or a message that reports
    /// the resource as already existing, is a duplicate. Everything else is
    /// an application error carrying the server's message verbatim when one
    /// is present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let extracted = extract_message(body);
        let details = (!body.is_empty()).then(|| body.to_string());

        if status == 401 {
            return Self {
                kind: ApiErrorKind::AuthRequired,
                status: Some(status),
                message: extracted
                    .unwrap_or_else(|| "Authentication required. Please log in.".to_string()),
                details,
            };
        }

        let is_duplicate = status == 409
            || extracted
                .as_deref()
                .is_some_and(|m| m.to_lowercase().contains("already"));
        if is_duplicate {
            return Self {
                kind: ApiErrorKind::Duplicate,
                status: Some(status),
                message: extracted.unwrap_or_else(|| "Already registered.".to_string()),
                details,
            };
        }

        Self {
            kind: ApiErrorKind::Api,
            status: Some(status),
            message: extracted.unwrap_or_else(|| Self::GENERIC_MESSAGE.to_string()),
            details,
        }
    }

    /// Creates a parse error for a malformed response body.
    pub fn parse(err: &reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            status: None,
            message: "Malformed response from server.".to_string(),
            details: Some(err.to_string()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Caller-facing error for flow operations: either a client-side validation
/// failure (no network call was made) or an API error.
#[derive(Debug, Clone)]
pub enum FlowError {
    /// Client-side validation failure; immediate, no request issued.
    Validation(String),
    /// Error from the API client (transport, application, auth, duplicate).
    Api(ApiError),
}

impl FlowError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        FlowError::Validation(message.into())
    }

    /// Returns the API error kind, if this is an API error.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            FlowError::Validation(_) => None,
            FlowError::Api(e) => Some(e.kind),
        }
    }
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::Validation(message) => write!(f, "{message}"),
            FlowError::Api(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for FlowError {}

impl From<ApiError> for FlowError {
    fn from(e: ApiError) -> Self {
        FlowError::Api(e)
    }
}

/// Extracts a display message from a JSON error body.
///
/// Accepts the shapes the server has been observed to emit:
/// `{"message": ...}`, `{"detail": ...}`, `{"error": "..."}` and
/// `{"error": {"message": ...}}`.
fn extract_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    for key in ["message", "detail"] {
        if let Some(msg) = json.get(key).and_then(Value::as_str) {
            return Some(msg.to_string());
        }
    }
    if let Some(error) = json.get("error") {
        if let Some(msg) = error.as_str() {
            return Some(msg.to_string());
        }
        if let Some(msg) = error.get("message").and_then(Value::as_str) {
            return Some(msg.to_string());
        }
    }
    None
}

/// API client: one HTTP client bound to a base URL and a session store.
///
/// Before every request the stored access token is read; if non-empty it is
/// sent as `Authorization: Bearer <token>`, otherwise the request proceeds
/// unauthenticated and the server's 401 is surfaced as
/// [`ApiErrorKind::AuthRequired`]. No retry, no token rotation.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    store: SessionStore,
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates a client from config (resolved base URL and timeout).
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be constructed.
    pub fn new(config: &Config, store: SessionStore) -> anyhow::Result<Self> {
        let base_url = config.base_url()?;
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self {
            base_url,
            store,
            http,
        })
    }

    /// Creates a client for a known base URL (tests, overrides).
    pub fn with_base_url(base_url: impl Into<String>, store: SessionStore) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
            http: reqwest::Client::new(),
        }
    }

    /// Returns the session store backing this client.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Sends a GET request and parses the JSON response.
    ///
    /// # Errors
    /// Returns an [`ApiError`] classified per the taxonomy.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let builder = self.request(reqwest::Method::GET, path).query(query);
        self.execute(builder).await
    }

    /// Sends a POST request with a JSON body and parses the JSON response.
    ///
    /// # Errors
    /// Returns an [`ApiError`] classified per the taxonomy.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let builder = self.request(reqwest::Method::POST, path).json(body);
        self.execute(builder).await
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let mut builder = self.http.request(method, &url);

        let token = self.store.access_token();
        if token.is_empty() {
            tracing::debug!("Request to {path} proceeds unauthenticated (no stored token)");
        } else {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn execute<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> ApiResult<T> {
        let response = builder.send().await.map_err(|e| ApiError::transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_status(status.as_u16(), &body);
            tracing::debug!("API error ({}): {}", err.kind, err.message);
            return Err(err);
        }

        response.json().await.map_err(|e| ApiError::parse(&e))
    }
}
