//! Authenticated-user state.
//!
//! # Design
//! `SessionStore` is the only writer of `Session`. It rehydrates
//! `{user, token, isAuthenticated}` from storage on construction and writes
//! the same subset back after every committing mutation. Those writes are
//! fire-and-forget: a failed write is logged and never reaches the caller.
//!
//! The store mirrors its token into the `SharedToken` the gateway reads, so
//! requests issued after a commit carry the new credential.
//!
//! `login` and `register` surface failures to the caller; `check_auth`
//! records the outcome in state and returns nothing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth_actions::{AuthActions, AuthPayload};
use crate::config::AUTH_STORAGE_KEY;
use crate::error::ApiResult;
use crate::gateway::SharedToken;
use crate::storage::{load_snapshot, save_snapshot, KeyValueStorage};
use crate::types::{LoginCredentials, RegisterCredentials, User};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthStatus {
    Anonymous,
    Authenticating,
    Authenticated,
    /// The last login, registration or token check failed.
    Invalid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Persisted subset of `Session`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    is_authenticated: bool,
}

pub struct SessionStore {
    state: Session,
    status: AuthStatus,
    actions: AuthActions,
    storage: Arc<dyn KeyValueStorage>,
    token: SharedToken,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("status", &self.status)
            .field("is_authenticated", &self.state.is_authenticated)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Build the store and rehydrate it from storage.
    ///
    /// The token slot the gateway reads is taken from `actions`.
    pub fn new(actions: AuthActions, storage: Arc<dyn KeyValueStorage>) -> Self {
        let token = actions.gateway().token().clone();
        let mut state = Session::default();
        if let Some(saved) = load_snapshot::<PersistedSession>(storage.as_ref(), AUTH_STORAGE_KEY) {
            state.user = saved.user;
            state.token = saved.token;
            state.is_authenticated = saved.is_authenticated && state.token.is_some();
        }
        token.set(state.token.clone());
        let status = if state.is_authenticated {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Anonymous
        };
        if state.token.is_some() {
            info!(authenticated = state.is_authenticated, "restored persisted session");
        }
        Self {
            state,
            status,
            actions,
            storage,
            token,
        }
    }

    pub fn state(&self) -> &Session {
        &self.state
    }

    pub fn status(&self) -> AuthStatus {
        self.status
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn login(&mut self, username: &str, password: &str) -> ApiResult<()> {
        let credentials = LoginCredentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.begin_authenticating();
        let outcome = self.actions.login(&credentials);
        self.settle_authentication(outcome, "login")
    }

    /// Same transitions as `login`; success signs the new account in.
    pub fn register(&mut self, credentials: &RegisterCredentials) -> ApiResult<()> {
        self.begin_authenticating();
        let outcome = self.actions.register(credentials);
        self.settle_authentication(outcome, "registration")
    }

    pub fn logout(&mut self) {
        self.actions.logout();
        self.state.user = None;
        self.state.token = None;
        self.state.is_authenticated = false;
        self.state.error = None;
        self.status = AuthStatus::Anonymous;
        self.token.set(None);
        self.persist();
        info!("logged out");
    }

    /// Validate the persisted token once at start-up.
    ///
    /// Without a token this settles anonymous and makes no request.
    pub fn check_auth(&mut self) {
        if self.state.token.is_none() {
            self.state.is_authenticated = false;
            self.state.is_loading = false;
            self.status = AuthStatus::Anonymous;
            return;
        }

        self.state.is_loading = true;
        self.status = AuthStatus::Authenticating;

        if self.actions.validate_token() {
            self.state.is_authenticated = true;
            self.state.is_loading = false;
            self.status = AuthStatus::Authenticated;
            info!("persisted token is valid");
        } else {
            self.state.user = None;
            self.state.token = None;
            self.state.is_authenticated = false;
            self.state.is_loading = false;
            self.status = AuthStatus::Invalid;
            self.token.set(None);
            warn!("persisted token rejected, session cleared");
        }
        self.persist();
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    fn begin_authenticating(&mut self) {
        self.state.is_loading = true;
        self.state.error = None;
        self.status = AuthStatus::Authenticating;
    }

    fn settle_authentication(&mut self, outcome: ApiResult<AuthPayload>, what: &str) -> ApiResult<()> {
        match outcome {
            Ok(AuthPayload { token, user }) => {
                info!(user = %user.username, "{what} succeeded");
                self.token.set(Some(token.clone()));
                self.state.token = Some(token);
                self.state.user = Some(user);
                self.state.is_authenticated = true;
                self.state.is_loading = false;
                self.state.error = None;
                self.status = AuthStatus::Authenticated;
                self.persist();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "{what} failed");
                self.state.error = Some(e.message());
                self.state.is_loading = false;
                self.state.is_authenticated = false;
                self.state.token = None;
                self.state.user = None;
                self.status = AuthStatus::Invalid;
                self.token.set(None);
                self.persist();
                Err(e)
            }
        }
    }

    fn persist(&self) {
        let snapshot = PersistedSession {
            user: self.state.user.clone(),
            token: self.state.token.clone(),
            is_authenticated: self.state.is_authenticated,
        };
        if let Err(e) = save_snapshot(self.storage.as_ref(), AUTH_STORAGE_KEY, &snapshot) {
            warn!(error = %e, "failed to persist session");
        }
    }
}
