use std::sync::{PoisonError, RwLock};

/// Credential manager
/// Holds the credentials attached to outbound requests
///
/// The static basic-auth value is fixed at construction. The bearer token
/// has a single writer (`set_token`) and is read once per request while the
/// headers are built, so requests already in flight keep the token they
/// started with.
#[derive(Debug, Default)]
pub struct CredentialManager {
    /// Session bearer token, if authenticated
    bearer_token: RwLock<Option<String>>,

    /// Basic auth derived from the configured endpoint
    static_auth: Option<String>,
}

impl CredentialManager {
    /// Create a new CredentialManager with an optional static fallback
    pub fn new(static_auth: Option<String>) -> Self {
        Self {
            bearer_token: RwLock::new(None),
            static_auth,
        }
    }

    /// Replace the bearer token used by subsequent requests
    pub fn set_token(&self, token: Option<String>) {
        let mut current = self
            .bearer_token
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        match (&*current, &token) {
            (None, Some(_)) => tracing::debug!("Bearer token set"),
            (Some(_), None) => tracing::debug!("Bearer token cleared"),
            (Some(_), Some(_)) => tracing::debug!("Bearer token replaced"),
            (None, None) => {}
        }

        *current = token;
    }

    /// Get the current bearer token
    pub fn token(&self) -> Option<String> {
        self.bearer_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Check whether a bearer token is set
    pub fn has_token(&self) -> bool {
        self.bearer_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Check whether a static basic-auth fallback is configured
    pub fn has_static_auth(&self) -> bool {
        self.static_auth.is_some()
    }

    /// Authorization header value for the next request
    /// Bearer token wins over static basic auth; `None` means send no header
    pub fn authorization_header(&self) -> Option<String> {
        if let Some(token) = self.token() {
            return Some(format!("Bearer {}", token));
        }
        self.static_auth.clone()
    }
}
