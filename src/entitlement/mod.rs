//! Identity and trial entitlement of one signed-in browser session.
//!
//! `Unauthenticated -> AuthenticatedLoading -> AuthenticatedReady -> Expired`,
//! with `logout` returning any state to `Unauthenticated`. Consumers hold an
//! `Arc<EntitlementStore>` or a `watch` subscription; nothing is global.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::clients::backend_client::{BackendApi, BackendError};
use crate::helper::time_helpers::remaining_until;
use crate::models::UserRecord;

pub mod registry;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Side effect of an automatic logout. Runs once per expired session.
pub trait LogoutHook: Send + Sync {
    fn on_expired(&self, identity: &UserRecord);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unauthenticated,
    AuthenticatedLoading,
    AuthenticatedReady(UserRecord),
    Expired,
}

#[derive(Error, Debug)]
pub enum EntitlementError {
    #[error("Session lookup failed: {0}")]
    Backend(#[from] BackendError),
    #[error("Your trial has expired.")]
    Expired,
    #[error("No active session.")]
    NotAuthenticated,
}

pub struct EntitlementStore {
    state: watch::Sender<SessionState>,
    backend: Arc<dyn BackendApi>,
    clock: Arc<dyn Clock>,
    logout_hook: Arc<dyn LogoutHook>,
}

impl EntitlementStore {
    pub fn new(
        backend: Arc<dyn BackendApi>,
        clock: Arc<dyn Clock>,
        logout_hook: Arc<dyn LogoutHook>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        EntitlementStore {
            state,
            backend,
            clock,
            logout_hook,
        }
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Returns the cached identity, fetching it from the backend when none is cached.
    /// A failed fetch leaves the store `Unauthenticated`; it is not retried here.
    pub async fn ensure_loaded(&self, token: &str) -> Result<UserRecord, EntitlementError> {
        match self.current() {
            SessionState::AuthenticatedReady(identity) => {
                if self.check_expiry() {
                    return Err(EntitlementError::Expired);
                }
                return Ok(identity);
            }
            SessionState::Expired => return Err(EntitlementError::Expired),
            SessionState::Unauthenticated | SessionState::AuthenticatedLoading => {}
        }

        self.state.send_replace(SessionState::AuthenticatedLoading);
        let identity = match self.fetch_identity(token).await {
            Ok(identity) => identity,
            Err(e) => {
                self.state.send_if_modified(|state| {
                    if *state == SessionState::AuthenticatedLoading {
                        *state = SessionState::Unauthenticated;
                        true
                    } else {
                        false
                    }
                });
                return Err(e.into());
            }
        };

        let installed = self.state.send_if_modified(|state| {
            if *state == SessionState::AuthenticatedLoading {
                *state = SessionState::AuthenticatedReady(identity.clone());
                true
            } else {
                false
            }
        });
        if !installed {
            // Logged out (or expired) while the lookup was in flight.
            return match self.current() {
                SessionState::AuthenticatedReady(identity) => Ok(identity),
                SessionState::Expired => Err(EntitlementError::Expired),
                _ => Err(EntitlementError::NotAuthenticated),
            };
        }

        if self.check_expiry() {
            return Err(EntitlementError::Expired);
        }
        Ok(identity)
    }

    async fn fetch_identity(&self, token: &str) -> Result<UserRecord, BackendError> {
        let mut identity = self.backend.current_session(token).await?;
        if identity.is_trial() {
            let record = self.backend.fetch_user(token, identity.id).await?;
            identity.generated_count = record.generated_count;
            identity.expired_at = record.expired_at;
        }
        Ok(identity)
    }

    /// Re-reads the trial counters from the backend. The backend's numbers replace
    /// the local ones; nothing is incremented locally.
    pub async fn refresh_credits(&self, token: &str) -> Result<(), EntitlementError> {
        let user_id = match &*self.state.borrow() {
            SessionState::AuthenticatedReady(identity) if identity.is_trial() => identity.id,
            SessionState::AuthenticatedReady(_) => return Ok(()),
            SessionState::Expired => return Err(EntitlementError::Expired),
            _ => return Err(EntitlementError::NotAuthenticated),
        };

        let record = self.backend.fetch_user(token, user_id).await?;
        self.state.send_if_modified(|state| match state {
            SessionState::AuthenticatedReady(identity) if identity.id == record.id => {
                identity.generated_count = record.generated_count;
                identity.expired_at = record.expired_at;
                true
            }
            _ => false,
        });

        if self.check_expiry() {
            return Err(EntitlementError::Expired);
        }
        Ok(())
    }

    /// Time left before a trial identity expires. `None` for other states and roles.
    pub fn remaining_time(&self) -> Option<chrono::Duration> {
        match &*self.state.borrow() {
            SessionState::AuthenticatedReady(identity) if identity.is_trial() => identity
                .expired_at
                .map(|expired_at| remaining_until(expired_at, self.clock.now())),
            _ => None,
        }
    }

    pub fn remaining_credits(&self, limit: u32) -> Option<u32> {
        match &*self.state.borrow() {
            SessionState::AuthenticatedReady(identity) if identity.is_trial() => {
                Some(limit.saturating_sub(identity.generated_count))
            }
            _ => None,
        }
    }

    /// Moves a ready trial session whose expiry has passed to `Expired` and runs the
    /// logout hook. Returns `true` only for the call that made the transition.
    pub fn check_expiry(&self) -> bool {
        let now = self.clock.now();
        let mut expired_identity = None;
        self.state.send_if_modified(|state| {
            if let SessionState::AuthenticatedReady(identity) = state {
                if let (true, Some(expired_at)) = (identity.is_trial(), identity.expired_at) {
                    if remaining_until(expired_at, now) <= chrono::Duration::zero() {
                        expired_identity = Some(identity.clone());
                        *state = SessionState::Expired;
                        return true;
                    }
                }
            }
            false
        });

        match expired_identity {
            Some(identity) => {
                log::info!("Trial for user '{}' expired; logging out.", identity.username);
                self.logout_hook.on_expired(&identity);
                true
            }
            None => false,
        }
    }

    pub fn logout(&self) {
        self.state.send_replace(SessionState::Unauthenticated);
    }

    /// Starts a one-second countdown against the identity's expiry.
    /// Dropping the returned handle stops it.
    pub fn spawn_countdown(self: &Arc<Self>) -> CountdownHandle {
        let store = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let keep_running = match &*store.state.borrow() {
                    SessionState::AuthenticatedReady(_) | SessionState::AuthenticatedLoading => true,
                    SessionState::Unauthenticated | SessionState::Expired => false,
                };
                if !keep_running || store.check_expiry() {
                    break;
                }
            }
        });
        CountdownHandle { task }
    }
}

pub struct CountdownHandle {
    task: JoinHandle<()>,
}

impl CountdownHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
