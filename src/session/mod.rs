// Session module
// Tracks the authenticated/anonymous state and keeps it persisted

mod storage;

pub use storage::{MemorySessionStorage, SessionStorage, SqliteSessionStorage, StoredSession};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::auth::AuthResult;
use crate::error::{ClientError, Result};
use crate::http_client::ApiClient;
use crate::models::UserProfile;

/// Session lifecycle state
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Startup check has not run yet
    Unknown,

    /// No valid credential
    Anonymous,

    /// Token and user are both present
    Authenticated { token: String, user: UserProfile },
}

/// Session store
///
/// Owns the persisted credential and keeps the client's bearer token in step
/// with it. Token and user always change together.
pub struct SessionStore {
    client: Arc<ApiClient>,
    storage: Arc<dyn SessionStorage>,
    state: RwLock<SessionState>,
    loading: AtomicBool,
}

impl SessionStore {
    /// Create a store in the `Unknown` state; call `initialize` once at startup
    pub fn new(client: Arc<ApiClient>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            client,
            storage,
            state: RwLock::new(SessionState::Unknown),
            loading: AtomicBool::new(true),
        }
    }

    /// Resolve the startup state from storage
    ///
    /// Runs at most once. A missing pair, unreadable storage, or a user value
    /// that does not deserialize all lead to `Anonymous`; corrupted values are
    /// cleared rather than reported.
    pub fn initialize(&self) -> SessionState {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if *state != SessionState::Unknown {
            return state.clone();
        }

        *state = match self.storage.load() {
            Ok(Some(stored)) => match serde_json::from_str::<UserProfile>(&stored.user) {
                Ok(user) => {
                    tracing::info!(user_id = %user.id, "Restored persisted session");
                    self.client.set_token(Some(stored.token.clone()));
                    SessionState::Authenticated {
                        token: stored.token,
                        user,
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Persisted user is corrupted, discarding session");
                    if let Err(e) = self.storage.clear() {
                        tracing::warn!(error = %e, "Failed to clear corrupted session");
                    }
                    SessionState::Anonymous
                }
            },
            Ok(None) => {
                tracing::debug!("No persisted session");
                SessionState::Anonymous
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load persisted session");
                SessionState::Anonymous
            }
        };

        self.loading.store(false, Ordering::SeqCst);
        state.clone()
    }

    /// True only until `initialize` has resolved the startup state
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current user, if authenticated
    pub fn user(&self) -> Option<UserProfile> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            SessionState::Authenticated { user, .. } => Some(user.clone()),
            _ => None,
        }
    }

    /// Current token, if authenticated
    pub fn token(&self) -> Option<String> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            SessionState::Authenticated { token, .. } => Some(token.clone()),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state(), SessionState::Authenticated { .. })
    }

    /// Log in and persist the new session
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let result = self.client.login(email, password).await?;
        self.establish(result)
    }

    /// Sign up and persist the new session
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<UserProfile> {
        let result = self.client.signup(email, password, name).await?;
        self.establish(result)
    }

    /// Drop the session: storage, client token and in-memory state
    ///
    /// The in-memory session is cleared even when storage fails; the storage
    /// error is still returned.
    pub fn logout(&self) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let cleared = self.storage.clear();
        self.client.set_token(None);
        *state = SessionState::Anonymous;
        self.loading.store(false, Ordering::SeqCst);

        tracing::info!("Logged out");
        cleared.map_err(ClientError::from)
    }

    /// Apply the auth-failure policy to an error from a data call
    ///
    /// A 401 means the token is no longer accepted, so the session is dropped.
    /// Returns true when that happened.
    pub fn handle_auth_failure(&self, err: &ClientError) -> bool {
        let expired = matches!(err, ClientError::Request { status: 401, .. });
        if !expired || !self.is_authenticated() {
            return false;
        }

        tracing::warn!("Token rejected by the API, ending session");
        if let Err(e) = self.logout() {
            tracing::warn!(error = %e, "Failed to clear persisted session");
        }
        true
    }

    /// Persist a fresh login/signup result and switch to `Authenticated`
    fn establish(&self, result: AuthResult) -> Result<UserProfile> {
        let stored = StoredSession {
            token: result.access_token.clone(),
            user: serde_json::to_string(&result.user)?,
        };

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        self.storage.save(&stored)?;
        self.client.set_token(Some(result.access_token.clone()));
        *state = SessionState::Authenticated {
            token: result.access_token,
            user: result.user.clone(),
        };
        self.loading.store(false, Ordering::SeqCst);

        tracing::info!(user_id = %result.user.id, "Session established");
        Ok(result.user)
    }
}
