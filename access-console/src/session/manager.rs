//! Token lifecycle: login, half-life refresh, restore and logout.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use console_core::error::ApiError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use validator::Validate;

use super::clock::Clock;
use super::scheduler::{Scheduler, TaskHandle};
use super::store::{PersistedSession, SessionStore};
use crate::config::SessionSettings;
use crate::models::{LoginRequest, LoginResponse, User};

/// Successful login or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub token: String,
    pub expires_in_secs: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication rejected: {reason}")]
    Rejected { reason: String },
    #[error("Malformed authentication response")]
    Malformed,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl TokenGrant {
    /// Turn the loosely shaped login/refresh body into a tagged result.
    pub fn from_response(response: LoginResponse) -> Result<Self, AuthError> {
        match response.auth {
            Some(auth) if !auth.token.is_empty() && auth.expires_in > 0 => Ok(Self {
                token: auth.token,
                expires_in_secs: auth.expires_in,
            }),
            Some(_) => Err(AuthError::Malformed),
            None => match response.error {
                Some(reason) => Err(AuthError::Rejected { reason }),
                None => Err(AuthError::Malformed),
            },
        }
    }
}

/// Backend calls the session manager depends on.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<TokenGrant, AuthError>;
    /// Exchange the held token for a new one.
    async fn refresh(&self, token: &str) -> Result<TokenGrant, AuthError>;
    async fn me(&self, token: &str) -> Result<User, ApiError>;
}

/// What subscribers observe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub authenticated: bool,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Remaining lifetime under which a token counts as expiring soon.
    pub expiring_soon: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            expiring_soon: Duration::from_secs(300),
        }
    }
}

impl From<&SessionSettings> for SessionOptions {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            expiring_soon: Duration::from_secs(settings.expiring_soon_secs),
        }
    }
}

#[derive(Debug, Clone)]
struct Session {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    session: Option<Session>,
    /// Armed refresh timer and the generation it was armed under.
    timer: Option<(u64, TaskHandle)>,
}

struct Inner {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    options: SessionOptions,
    state: Mutex<State>,
    generation: AtomicU64,
    state_tx: watch::Sender<AuthState>,
}

/// Owns the current session and keeps it refreshed.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(
        api: Arc<dyn AuthApi>,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn Scheduler>,
        options: SessionOptions,
    ) -> Self {
        let (state_tx, _) = watch::channel(AuthState::default());
        Self {
            inner: Arc::new(Inner {
                api,
                store,
                clock,
                scheduler,
                options,
                state: Mutex::new(State::default()),
                generation: AtomicU64::new(0),
                state_tx,
            }),
        }
    }

    /// Pick up a persisted session left by a previous run.
    ///
    /// Expired or unreadable records are cleared. A restored token already
    /// inside the expiring-soon window is refreshed straight away.
    pub fn restore(&self) -> bool {
        let persisted = match self.inner.store.load() {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted session");
                None
            }
        };

        let Some(persisted) = persisted else {
            tracing::info!("No persisted session");
            self.inner.clear_store();
            return false;
        };

        let now = self.inner.clock.now();
        let expires_at = match DateTime::<Utc>::from_timestamp_millis(persisted.expires_at_ms) {
            Some(expires_at) if expires_at > now => expires_at,
            _ => {
                tracing::info!(
                    expires_at_ms = persisted.expires_at_ms,
                    "Persisted session expired, clearing"
                );
                self.inner.clear_store();
                return false;
            }
        };

        let mut state = self.inner.lock_state();
        state.session = Some(Session {
            token: persisted.token,
            expires_at,
        });
        self.inner.publish(&state);

        let remaining = (expires_at - now).to_std().unwrap_or(Duration::ZERO);
        if remaining < self.inner.options.expiring_soon {
            tracing::info!(
                remaining_secs = remaining.as_secs(),
                "Restored session is expiring soon, refreshing now"
            );
            self.inner.arm(&mut state, Duration::ZERO);
        } else {
            tracing::info!(remaining_secs = remaining.as_secs(), "Session restored");
            self.inner.arm_half_life(&mut state, expires_at);
        }

        true
    }

    /// Log in with credentials. Failures are logged and reported as `false`.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        self.login_with(&LoginRequest::new(username, password)).await
    }

    pub async fn login_with(&self, request: &LoginRequest) -> bool {
        if let Err(e) = request.validate() {
            tracing::warn!(error = %e, "Login request rejected before sending");
            return false;
        }

        match self.inner.api.login(request).await {
            Ok(grant) => {
                let mut state = self.inner.lock_state();
                match self.inner.establish(&mut state, grant) {
                    Ok(()) => {
                        tracing::info!(username = %request.username, "Login succeeded");
                        true
                    }
                    Err(e) => {
                        tracing::warn!(username = %request.username, error = %e, "Login failed");
                        false
                    }
                }
            }
            Err(e) => {
                tracing::warn!(username = %request.username, error = %e, "Login failed");
                false
            }
        }
    }

    /// Cancel the refresh timer and drop the session. Idempotent.
    pub fn logout(&self) {
        self.inner.logout();
    }

    /// Refresh the held token now instead of waiting for the timer.
    pub async fn refresh(&self) {
        Inner::refresh(&self.inner).await;
    }

    pub fn token(&self) -> Option<String> {
        self.inner
            .lock_state()
            .session
            .as_ref()
            .map(|s| s.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.lock_state().session.is_some()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock_state().session.as_ref().map(|s| s.expires_at)
    }

    pub fn is_token_expiring_soon(&self) -> bool {
        match self.expires_at() {
            Some(expires_at) => {
                let remaining_ms = (expires_at - self.inner.clock.now()).num_milliseconds();
                remaining_ms < self.inner.options.expiring_soon.as_millis() as i64
            }
            None => false,
        }
    }

    /// Whole seconds left on the token, zero when none is held.
    pub fn remaining_time_secs(&self) -> u64 {
        match self.expires_at() {
            Some(expires_at) => {
                let remaining_ms = (expires_at - self.inner.clock.now()).num_milliseconds();
                (remaining_ms.max(0) / 1000) as u64
            }
            None => 0,
        }
    }

    /// Push-based view of `{authenticated, token}`.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state_tx.subscribe()
    }

    /// `GET /auth/me` with the held token.
    ///
    /// A token the backend refuses is dropped, the same as a failed refresh.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let token = self
            .token()
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

        let result = self.inner.api.me(&token).await;
        if let Err(e) = &result
            && e.is_auth_failure()
        {
            let mut state = self.inner.lock_state();
            if state.session.as_ref().is_some_and(|s| s.token == token) {
                tracing::warn!(error = %e, "Held token refused, logging out");
                self.inner.logout_locked(&mut state);
            }
        }
        result
    }

    pub async fn has_permission(&self, permission: &str) -> Result<bool, ApiError> {
        Ok(self.current_user().await?.has_permission(permission))
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, state: &State) {
        let next = match &state.session {
            Some(session) => AuthState {
                authenticated: true,
                token: Some(session.token.clone()),
            },
            None => AuthState::default(),
        };
        self.state_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "Failed to clear persisted session");
        }
    }

    /// Persist, publish and schedule a freshly granted token.
    ///
    /// A lifetime that does not fit the calendar is rejected and leaves the
    /// current state untouched.
    fn establish(
        self: &Arc<Self>,
        state: &mut State,
        grant: TokenGrant,
    ) -> Result<(), AuthError> {
        let expires_at = chrono::TimeDelta::try_seconds(grant.expires_in_secs)
            .and_then(|lifetime| self.clock.now().checked_add_signed(lifetime))
            .ok_or(AuthError::Malformed)?;

        let persisted = PersistedSession {
            token: grant.token.clone(),
            expires_at_ms: expires_at.timestamp_millis(),
        };
        if let Err(e) = self.store.save(&persisted) {
            tracing::error!(error = %e, "Failed to persist session");
        }

        state.session = Some(Session {
            token: grant.token,
            expires_at,
        });
        self.publish(state);
        self.arm_half_life(state, expires_at);
        Ok(())
    }

    fn arm_half_life(self: &Arc<Self>, state: &mut State, expires_at: DateTime<Utc>) {
        let half_ms = (expires_at - self.clock.now()).num_milliseconds() / 2;
        let delay = if half_ms <= 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(half_ms as u64)
        };
        self.arm(state, delay);
    }

    fn arm(self: &Arc<Self>, state: &mut State, delay: Duration) {
        if let Some((_, previous)) = state.timer.take() {
            self.scheduler.cancel(previous);
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let weak = Arc::downgrade(self);
        let handle = self.scheduler.arm(
            delay,
            Box::pin(async move {
                if let Some(inner) = weak.upgrade() {
                    inner.timer_fired(generation);
                    Inner::refresh(&inner).await;
                }
            }),
        );
        state.timer = Some((generation, handle));

        tracing::debug!(delay_ms = delay.as_millis() as u64, "Token refresh armed");
    }

    fn timer_fired(&self, generation: u64) {
        let mut state = self.lock_state();
        if matches!(state.timer, Some((armed, _)) if armed == generation) {
            state.timer = None;
        }
    }

    async fn refresh(self: &Arc<Self>) {
        let Some(token) = self.lock_state().session.as_ref().map(|s| s.token.clone()) else {
            tracing::debug!("No token held, refresh skipped");
            return;
        };

        let result = self.api.refresh(&token).await;

        let mut state = self.lock_state();
        let still_current = state.session.as_ref().is_some_and(|s| s.token == token);
        if !still_current {
            tracing::info!("Session changed while refreshing, refresh result discarded");
            return;
        }

        match result.and_then(|grant| self.establish(&mut state, grant)) {
            Ok(()) => tracing::info!("Token refreshed"),
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, logging out");
                self.logout_locked(&mut state);
            }
        }
    }

    fn logout(&self) {
        let mut state = self.lock_state();
        self.logout_locked(&mut state);
    }

    fn logout_locked(&self, state: &mut State) {
        if let Some((_, handle)) = state.timer.take() {
            self.scheduler.cancel(handle);
        }
        let had_session = state.session.take().is_some();
        self.clear_store();
        self.publish(state);

        if had_session {
            tracing::info!("Logged out");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthPayload;

    fn response(token: &str, expires_in: i64) -> LoginResponse {
        LoginResponse {
            auth: Some(AuthPayload {
                token: token.to_string(),
                token_type: "Bearer".to_string(),
                expires_in,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_grant_from_valid_response() {
        let grant = TokenGrant::from_response(response("abc", 3600)).unwrap();
        assert_eq!(grant.token, "abc");
        assert_eq!(grant.expires_in_secs, 3600);
    }

    #[test]
    fn test_grant_rejected_carries_reason() {
        let body = LoginResponse {
            error: Some("Invalid credentials".to_string()),
            ..Default::default()
        };
        match TokenGrant::from_response(body) {
            Err(AuthError::Rejected { reason }) => assert_eq!(reason, "Invalid credentials"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_grant_malformed_shapes() {
        assert!(matches!(
            TokenGrant::from_response(LoginResponse::default()),
            Err(AuthError::Malformed)
        ));
        assert!(matches!(
            TokenGrant::from_response(response("", 3600)),
            Err(AuthError::Malformed)
        ));
        assert!(matches!(
            TokenGrant::from_response(response("abc", 0)),
            Err(AuthError::Malformed)
        ));
    }
}
