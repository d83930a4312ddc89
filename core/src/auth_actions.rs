//! Authentication endpoints and their normalized actions.
//!
//! The demo API's token endpoint returns only `{token}`, so a successful
//! login or registration is followed by a profile fetch. That fetch uses the
//! freshly issued token directly because the session has not committed it
//! yet.

use tracing::{debug, warn};

use crate::error::ApiResult;
use crate::gateway::Gateway;
use crate::http::HttpMethod;
use crate::types::{AuthResponse, LoginCredentials, RegisterCredentials, User};

const LOGIN_FAILED: &str = "Failed to sign in";
const REGISTER_FAILED: &str = "Failed to register";

/// Token plus profile, the result of a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone)]
pub struct AuthActions {
    gateway: Gateway,
    current_user_id: i64,
}

impl AuthActions {
    pub fn new(gateway: Gateway, current_user_id: i64) -> Self {
        Self {
            gateway,
            current_user_id,
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    fn current_user_path(&self) -> String {
        format!("/users/{}", self.current_user_id)
    }

    /// `POST /auth/login`.
    pub fn request_token(&self, credentials: &LoginCredentials) -> ApiResult<AuthResponse> {
        self.gateway.post("/auth/login", credentials, false)
    }

    /// `POST /users`. The demo backend does not keep the account.
    pub fn request_registration(&self, credentials: &RegisterCredentials) -> ApiResult<AuthResponse> {
        warn!("the demo API does not persist registered accounts");
        self.gateway.post("/users", credentials, false)
    }

    /// `GET /users/{id}` with the stored token.
    pub fn current_user(&self) -> ApiResult<User> {
        self.gateway.get(&self.current_user_path(), true)
    }

    fn current_user_with(&self, token: &str) -> ApiResult<User> {
        self.gateway
            .request_with_bearer::<User, ()>(HttpMethod::Get, &self.current_user_path(), None, Some(token))
    }

    pub fn login(&self, credentials: &LoginCredentials) -> ApiResult<AuthPayload> {
        let run = || -> ApiResult<AuthPayload> {
            let AuthResponse { token } = self.request_token(credentials)?;
            let user = self.current_user_with(&token)?;
            Ok(AuthPayload { token, user })
        };
        run().map_err(|e| e.into_domain(LOGIN_FAILED))
    }

    pub fn register(&self, credentials: &RegisterCredentials) -> ApiResult<AuthPayload> {
        let run = || -> ApiResult<AuthPayload> {
            let AuthResponse { token } = self.request_registration(credentials)?;
            let user = self.current_user_with(&token)?;
            Ok(AuthPayload { token, user })
        };
        run().map_err(|e| e.into_domain(REGISTER_FAILED))
    }

    /// Probe the stored token. Any failure, network or authorization, means
    /// the token is not valid.
    pub fn validate_token(&self) -> bool {
        match self.current_user() {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "token validation failed");
                false
            }
        }
    }

    /// The demo API has no server-side logout.
    pub fn logout(&self) {}
}
