//! Session lifecycle: who is logged in, and with which token.
//!
//! `SessionStore` moves through `Unresolved -> Resolving -> Authenticated |
//! Anonymous` exactly once at startup; afterwards login and logout flip
//! between the two settled states.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::api::{user_message, AuthToken, RequestContext};
use crate::models::{Identity, LoginResponse};

use super::store::{TokenStore, TOKEN_KEY};

/// Message shown when a login fails without a server-provided detail.
pub const LOGIN_FAILED: &str = "Login failed";

/// The two calls the session needs from the backend.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse>;
    async fn fetch_me(&self, ctx: &RequestContext) -> Result<Identity>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unresolved,
    Resolving,
    Authenticated {
        identity: Identity,
        context: RequestContext,
    },
    Anonymous,
}

/// Failed login, carrying the message to show on the login form.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct LoginError {
    pub message: String,
    pub cause: anyhow::Error,
}

pub struct SessionStore<B, S> {
    backend: B,
    store: S,
    state: SessionState,
}

impl<B: AuthBackend, S: TokenStore> SessionStore<B, S> {
    pub fn new(backend: B, store: S) -> Self {
        Self {
            backend,
            store,
            state: SessionState::Unresolved,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// True until startup resolution has settled.
    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Unresolved | SessionState::Resolving)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    /// Credentials to attach to the next request, if logged in.
    pub fn context(&self) -> Option<&RequestContext> {
        match &self.state {
            SessionState::Authenticated { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Resolve a persisted token into an identity. Any failure (expired
    /// token, unknown user, unreachable server) demotes to anonymous and
    /// purges the token. Runs once; later calls are no-ops.
    pub async fn initialize(&mut self) {
        if !matches!(self.state, SessionState::Unresolved) {
            debug!("Session already initialized");
            return;
        }
        self.state = SessionState::Resolving;

        let token = match self.store.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => {
                debug!("No persisted token");
                self.state = SessionState::Anonymous;
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                self.purge_token();
                self.state = SessionState::Anonymous;
                return;
            }
        };

        let context = RequestContext::new(AuthToken::new(token));
        match self.backend.fetch_me(&context).await {
            Ok(identity) => {
                info!(username = %identity.username, role = %identity.role, "Session restored");
                self.state = SessionState::Authenticated { identity, context };
            }
            Err(e) => {
                debug!(error = %e, "Persisted token rejected");
                self.purge_token();
                self.state = SessionState::Anonymous;
            }
        }
    }

    /// Exchange credentials for a session. On failure the previous state is
    /// left exactly as it was.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Identity, LoginError> {
        let response = match self.backend.login(username, password).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, username, "Login failed");
                return Err(LoginError {
                    message: user_message(&e, LOGIN_FAILED),
                    cause: e,
                });
            }
        };

        if let Err(e) = self.store.set(TOKEN_KEY, &response.access_token) {
            warn!(error = %e, "Failed to persist token");
        }

        let identity = response.user;
        let context = RequestContext::new(AuthToken::new(response.access_token));
        self.state = SessionState::Authenticated {
            identity: identity.clone(),
            context,
        };
        info!(username = %identity.username, role = %identity.role, "Login successful");
        Ok(identity)
    }

    /// Drop the token and identity. Safe to call when already logged out.
    pub fn logout(&mut self) {
        self.purge_token();
        if self.identity().is_some() {
            info!("Logged out");
        }
        self.state = SessionState::Anonymous;
    }

    /// Re-read `/auth/me` and replace the identity wholesale. A rejected
    /// token logs the session out.
    pub async fn refresh_identity(&mut self) -> Result<()> {
        let context = match self.context() {
            Some(context) => context.clone(),
            None => return Ok(()),
        };
        let fetched = self.backend.fetch_me(&context).await;
        self.apply_identity(fetched)
    }

    /// Apply the result of an `/auth/me` read issued elsewhere with the
    /// current context. Ignored when the session is no longer authenticated.
    pub fn apply_identity(&mut self, fetched: Result<Identity>) -> Result<()> {
        let context = match self.context() {
            Some(context) => context.clone(),
            None => return Ok(()),
        };

        match fetched {
            Ok(identity) => {
                self.state = SessionState::Authenticated { identity, context };
                Ok(())
            }
            Err(e) => {
                let rejected = e
                    .chain()
                    .filter_map(|cause| cause.downcast_ref::<crate::api::ApiError>())
                    .any(|api| api.is_unauthorized());
                if rejected {
                    warn!("Token rejected while refreshing identity");
                    self.logout();
                }
                Err(e).context("Failed to refresh identity")
            }
        }
    }

    fn purge_token(&self) {
        if let Err(e) = self.store.clear(TOKEN_KEY) {
            warn!(error = %e, "Failed to clear persisted token");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::api::ApiError;
    use crate::auth::MemoryTokenStore;
    use crate::models::Role;
    use crate::router::{select_view, ViewKind};

    /// Backend with a fixed account table and a fixed set of valid tokens.
    #[derive(Default)]
    struct FakeBackend {
        accounts: HashMap<String, (String, Identity)>,
        tokens: HashMap<String, Identity>,
        me_calls: Arc<AtomicUsize>,
    }

    fn identity(username: &str, role: &str) -> Identity {
        Identity {
            id: format!("id-{}", username),
            username: username.to_string(),
            role: Role::from(role),
            name: None,
            coins: None,
            deposits: None,
            target_monthly: None,
        }
    }

    impl FakeBackend {
        fn with_account(mut self, username: &str, password: &str, role: &str) -> Self {
            let identity = identity(username, role);
            self.tokens
                .insert(format!("token-{}", username), identity.clone());
            self.accounts
                .insert(username.to_string(), (password.to_string(), identity));
            self
        }
    }

    fn unauthorized(detail: &str) -> anyhow::Error {
        ApiError::from_status(
            reqwest::StatusCode::UNAUTHORIZED,
            &format!(r#"{{"detail":"{}"}}"#, detail),
        )
        .into()
    }

    #[async_trait]
    impl AuthBackend for FakeBackend {
        async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
            match self.accounts.get(username) {
                Some((expected, identity)) if expected == password => Ok(LoginResponse {
                    access_token: format!("token-{}", username),
                    token_type: Some("bearer".into()),
                    user: identity.clone(),
                }),
                _ => Err(unauthorized("Invalid credentials")),
            }
        }

        async fn fetch_me(&self, ctx: &RequestContext) -> Result<Identity> {
            self.me_calls.fetch_add(1, Ordering::SeqCst);
            self.tokens
                .get(ctx.token().as_str())
                .cloned()
                .ok_or_else(|| unauthorized("Invalid token"))
        }
    }

    fn stored_token(session: &SessionStore<FakeBackend, MemoryTokenStore>) -> Option<String> {
        session.store.get(TOKEN_KEY).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_without_token_is_anonymous() {
        let mut session = SessionStore::new(FakeBackend::default(), MemoryTokenStore::new());
        assert!(session.is_loading());
        assert_eq!(select_view(session.identity(), session.is_loading()), ViewKind::Loading);

        session.initialize().await;

        assert!(!session.is_loading());
        assert_eq!(session.state(), &SessionState::Anonymous);
        assert_eq!(select_view(session.identity(), session.is_loading()), ViewKind::Login);
    }

    #[tokio::test]
    async fn test_initialize_with_accepted_token_routes_by_role() {
        for (role, view) in [
            ("super_admin", ViewKind::SuperAdmin),
            ("admin", ViewKind::Admin),
            ("agent", ViewKind::Agent),
            ("ghost", ViewKind::UnknownRole),
        ] {
            let backend = FakeBackend::default().with_account("u", "p", role);
            let mut session = SessionStore::new(backend, MemoryTokenStore::with_token("token-u"));

            session.initialize().await;

            assert!(!session.is_loading());
            assert_eq!(session.identity().map(|i| i.role.clone()), Some(Role::from(role)));
            assert_eq!(select_view(session.identity(), session.is_loading()), view);
            assert_eq!(session.context().unwrap().token().as_str(), "token-u");
        }
    }

    #[tokio::test]
    async fn test_initialize_with_rejected_token_purges_it() {
        let backend = FakeBackend::default().with_account("u", "p", "agent");
        let mut session = SessionStore::new(backend, MemoryTokenStore::with_token("expired"));

        session.initialize().await;

        assert_eq!(session.state(), &SessionState::Anonymous);
        assert_eq!(stored_token(&session), None);
        assert!(session.context().is_none());
    }

    #[tokio::test]
    async fn test_initialize_runs_once() {
        let backend = FakeBackend::default().with_account("u", "p", "agent");
        let calls = Arc::clone(&backend.me_calls);
        let mut session = SessionStore::new(backend, MemoryTokenStore::with_token("token-u"));

        session.initialize().await;
        session.initialize().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_login_super_admin_routes_to_super_admin_view() {
        let backend = FakeBackend::default().with_account("tharme.ritta", "Tharme@789", "super_admin");
        let mut session = SessionStore::new(backend, MemoryTokenStore::new());
        session.initialize().await;

        let identity = session.login("tharme.ritta", "Tharme@789").await.unwrap();

        assert_eq!(identity.role, Role::SuperAdmin);
        assert_eq!(select_view(session.identity(), session.is_loading()), ViewKind::SuperAdmin);
        assert_eq!(stored_token(&session).as_deref(), Some("token-tharme.ritta"));
    }

    #[tokio::test]
    async fn test_failed_login_surfaces_detail_and_keeps_state() {
        let backend = FakeBackend::default()
            .with_account("agent1", "pw", "agent")
            .with_account("admin1", "pw", "admin");
        let mut session = SessionStore::new(backend, MemoryTokenStore::new());
        session.initialize().await;
        session.login("agent1", "pw").await.unwrap();
        let before = session.state().clone();

        let err = session.login("admin1", "wrong").await.unwrap_err();

        assert_eq!(err.message, "Invalid credentials");
        assert_eq!(session.state(), &before);
        assert_eq!(stored_token(&session).as_deref(), Some("token-agent1"));
    }

    #[tokio::test]
    async fn test_login_then_logout_leaves_no_token() {
        let backend = FakeBackend::default().with_account("agent1", "pw", "agent");
        let mut session = SessionStore::new(backend, MemoryTokenStore::new());
        session.initialize().await;

        session.login("agent1", "pw").await.unwrap();
        session.logout();

        assert_eq!(session.state(), &SessionState::Anonymous);
        assert_eq!(stored_token(&session), None);

        // Idempotent
        session.logout();
        assert_eq!(session.state(), &SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_refresh_identity_with_revoked_token_logs_out() {
        let backend = FakeBackend::default().with_account("agent1", "pw", "agent");
        let mut session = SessionStore::new(backend, MemoryTokenStore::new());
        session.initialize().await;
        session.login("agent1", "pw").await.unwrap();

        session.backend.tokens.clear();
        assert!(session.refresh_identity().await.is_err());

        assert_eq!(session.state(), &SessionState::Anonymous);
        assert_eq!(stored_token(&session), None);
    }

    #[tokio::test]
    async fn test_apply_identity_replaces_balance_and_ignores_when_anonymous() {
        let backend = FakeBackend::default().with_account("agent1", "pw", "agent");
        let mut session = SessionStore::new(backend, MemoryTokenStore::new());
        session.initialize().await;
        let mut identity = session.login("agent1", "pw").await.unwrap();

        identity.coins = Some(2.5);
        session.apply_identity(Ok(identity.clone())).unwrap();
        assert_eq!(session.identity().and_then(|i| i.coins), Some(2.5));

        session.logout();
        session.apply_identity(Ok(identity)).unwrap();
        assert_eq!(session.state(), &SessionState::Anonymous);
    }
}
