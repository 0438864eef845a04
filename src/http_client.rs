use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::auth::{self, AuthResult, CredentialManager, LoginForm, SignupRequest};
use crate::error::{ClientError, Result};
use crate::models::{
    ApiKey, AuditEvent, CreateApiKeyRequest, EventQuery, HealthStatus, Metrics, PricingPlan,
    Subscription,
};

const LOGIN_PATH: &str = "/login";
const SIGNUP_PATH: &str = "/auth/signup";
const EVENTS_PATH: &str = "/events";
const METRICS_PATH: &str = "/metrics";
const API_KEYS_PATH: &str = "/api-keys";
const PLANS_PATH: &str = "/billing/plans";
const SUBSCRIPTION_PATH: &str = "/billing/subscription";
const HEALTH_PATH: &str = "/health";

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Message used when an error response carries no readable message
pub const GENERIC_ERROR_MESSAGE: &str = "Request failed";

/// Transport settings for the underlying HTTP client
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Idle connections kept per host
    pub max_idle_connections: usize,

    /// Whole-request timeout in seconds; `None` keeps the transport default
    pub request_timeout: Option<u64>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            max_idle_connections: 20,
            request_timeout: None,
        }
    }
}

/// Request body, already encoded
enum Payload {
    Empty,
    Json(String),
    Form(String),
}

/// Client for the audit API
///
/// Every call builds its headers from the current credentials, performs one
/// round trip, and classifies the outcome. Calls are independent and may run
/// concurrently; the bearer token is the only mutable state.
pub struct ApiClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Base URL without embedded credentials or trailing slash
    base_url: String,

    /// Bearer token and static basic auth
    credentials: CredentialManager,
}

impl ApiClient {
    /// Create a new client for the configured endpoint
    ///
    /// Credentials embedded in the endpoint URL are moved into a static
    /// basic-auth fallback here, once.
    pub fn new(endpoint: &str, options: &HttpOptions) -> Result<Self> {
        let resolved = auth::resolve_endpoint(endpoint);

        let mut builder = Client::builder().pool_max_idle_per_host(options.max_idle_connections);
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let client = builder.build().map_err(|e| {
            ClientError::ConfigError(format!("Failed to build HTTP client: {}", e))
        })?;

        let base_url = resolved.base_url.trim_end_matches('/').to_string();
        tracing::debug!(
            base_url = %base_url,
            static_auth = resolved.static_auth.is_some(),
            "API client initialized"
        );

        Ok(Self {
            client,
            base_url,
            credentials: CredentialManager::new(resolved.static_auth),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credentials attached to outbound requests
    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    /// Replace the bearer token for every request issued after this returns
    pub fn set_token(&self, token: Option<String>) {
        self.credentials.set_token(token);
    }

    /// Current bearer token
    pub fn token(&self) -> Option<String> {
        self.credentials.token()
    }

    /// Build request headers
    ///
    /// `Content-Type: application/json`, overridden by any `extra` headers,
    /// then `Authorization` per the credential precedence (omitted when no
    /// credential is available).
    pub fn build_headers(&self, extra: Option<&HeaderMap>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        if let Some(extra) = extra {
            for (name, value) in extra {
                headers.insert(name.clone(), value.clone());
            }
        }

        if let Some(auth) = self.credentials.authorization_header() {
            let mut value = HeaderValue::from_str(&auth).map_err(|_| {
                ClientError::ConfigError("Credential is not a valid header value".to_string())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    // ==============================================================================================
    // Authentication
    // ==============================================================================================

    /// Log in with email and password
    ///
    /// Credentials are posted form-encoded as `username`/`password` to
    /// `/login`, unlike every other call.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult> {
        let form = LoginForm {
            username: email,
            password,
        }
        .encode();

        let mut extra = HeaderMap::new();
        extra.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));

        let result = self
            .request(
                Method::POST,
                LOGIN_PATH,
                &[],
                Payload::Form(form),
                Some(&extra),
            )
            .await
            .map_err(ClientError::into_auth)?;

        require_body(result, LOGIN_PATH)
    }

    /// Create an account
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<AuthResult> {
        let body = serde_json::to_string(&SignupRequest {
            email,
            password,
            name,
        })?;

        let result = self
            .request(Method::POST, SIGNUP_PATH, &[], Payload::Json(body), None)
            .await
            .map_err(ClientError::into_auth)?;

        require_body(result, SIGNUP_PATH)
    }

    // ==============================================================================================
    // Audit data
    // ==============================================================================================

    /// List audit events, newest page first
    pub async fn get_events(&self, limit: u32, offset: u32) -> Result<Vec<AuditEvent>> {
        self.list_events(&EventQuery::page(limit, offset)).await
    }

    /// List audit events with an optional user filter
    pub async fn list_events(&self, query: &EventQuery) -> Result<Vec<AuditEvent>> {
        let pairs = query.to_query_pairs();
        let events = self
            .request(Method::GET, EVENTS_PATH, &pairs, Payload::Empty, None)
            .await?;
        Ok(events.unwrap_or_default())
    }

    /// Fetch aggregate metrics
    pub async fn get_metrics(&self) -> Result<Metrics> {
        let metrics = self
            .request(Method::GET, METRICS_PATH, &[], Payload::Empty, None)
            .await?;
        require_body(metrics, METRICS_PATH)
    }

    // ==============================================================================================
    // API keys
    // ==============================================================================================

    /// List API keys (prefixes only)
    pub async fn get_api_keys(&self) -> Result<Vec<ApiKey>> {
        let keys = self
            .request(Method::GET, API_KEYS_PATH, &[], Payload::Empty, None)
            .await?;
        Ok(keys.unwrap_or_default())
    }

    /// Create an API key; the returned value is the only copy of the full key
    pub async fn create_api_key(&self, name: &str) -> Result<ApiKey> {
        let body = serde_json::to_string(&CreateApiKeyRequest { name })?;
        let key = self
            .request(Method::POST, API_KEYS_PATH, &[], Payload::Json(body), None)
            .await?;
        require_body(key, API_KEYS_PATH)
    }

    /// Delete an API key
    pub async fn delete_api_key(&self, id: &str) -> Result<()> {
        let endpoint = format!("{}/{}", API_KEYS_PATH, urlencoding::encode(id));
        let response = self
            .execute(Method::DELETE, &endpoint, &[], Payload::Empty, None)
            .await?;

        if response.status() != StatusCode::NO_CONTENT {
            tracing::debug!(status = %response.status(), "API key delete returned a body, ignoring it");
        }
        Ok(())
    }

    // ==============================================================================================
    // Billing
    // ==============================================================================================

    /// List pricing plans
    pub async fn get_pricing_plans(&self) -> Result<Vec<PricingPlan>> {
        let plans = self
            .request(Method::GET, PLANS_PATH, &[], Payload::Empty, None)
            .await?;
        Ok(plans.unwrap_or_default())
    }

    /// Fetch the current user's subscription
    pub async fn get_subscription(&self) -> Result<Subscription> {
        let subscription = self
            .request(Method::GET, SUBSCRIPTION_PATH, &[], Payload::Empty, None)
            .await?;
        require_body(subscription, SUBSCRIPTION_PATH)
    }

    /// Probe service health
    pub async fn health(&self) -> Result<HealthStatus> {
        let status = self
            .request(Method::GET, HEALTH_PATH, &[], Payload::Empty, None)
            .await?;
        require_body(status, HEALTH_PATH)
    }

    // ==============================================================================================
    // Request plumbing
    // ==============================================================================================

    /// Execute a request and decode a JSON body
    /// Returns `None` for `204 No Content` without looking at the body
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        payload: Payload,
        extra_headers: Option<&HeaderMap>,
    ) -> Result<Option<T>> {
        let response = self
            .execute(method, endpoint, query, payload, extra_headers)
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response.bytes().await?;
        let value = serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(endpoint = endpoint, error = %e, "Response body is not valid JSON");
            ClientError::Decode(format!("{} response: {}", endpoint, e))
        })?;

        Ok(Some(value))
    }

    /// Execute a request, failing on transport errors and non-2xx statuses
    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        payload: Payload,
        extra_headers: Option<&HeaderMap>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        let headers = self.build_headers(extra_headers)?;

        tracing::debug!(
            method = %method,
            url = %url,
            authorized = headers.contains_key(AUTHORIZATION),
            "Sending HTTP request"
        );

        let mut builder = self.client.request(method.clone(), &url).headers(headers);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        builder = match payload {
            Payload::Empty => builder,
            Payload::Json(body) | Payload::Form(body) => builder.body(body),
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                // Categorize the error for better debugging
                let error_kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connection_failed"
                } else if e.is_request() {
                    "request_error"
                } else {
                    "unknown"
                };

                tracing::warn!(
                    error_kind = error_kind,
                    error = %e,
                    method = %method,
                    url = %url,
                    "HTTP request error"
                );
                return Err(ClientError::Transport(e));
            }
        };

        let status = response.status();
        tracing::debug!(status = %status, "Received HTTP response");

        if status.is_success() {
            return Ok(response);
        }

        // Error bodies are best effort; an unreadable body gets the generic message
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body);

        tracing::warn!(
            status = status.as_u16(),
            method = %method,
            url = %url,
            message = %message,
            "HTTP request failed with error response"
        );

        Err(ClientError::Request {
            status: status.as_u16(),
            message,
        })
    }
}

/// Turn a `204` into a decode failure for operations that need a body
fn require_body<T>(value: Option<T>, endpoint: &str) -> Result<T> {
    value.ok_or_else(|| {
        ClientError::Decode(format!(
            "{} response: got 204 No Content, expected a JSON body",
            endpoint
        ))
    })
}

/// Pull a human-readable message out of an error response body
///
/// Recognizes `{"detail": "..."}`, `{"message": "..."}`,
/// `{"error": {"message": "..."}}` and validation lists
/// `{"detail": [{"msg": "..."}]}`.
pub fn extract_error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return GENERIC_ERROR_MESSAGE.to_string();
    };

    json.get("detail")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .or_else(|| {
            json.get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
        })
        .or_else(|| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
        })
        .or_else(|| {
            json.get("detail")
                .and_then(Value::as_array)
                .and_then(|items| items.first())
                .and_then(|item| item.get("msg"))
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
        })
        .map(str::to_string)
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}
