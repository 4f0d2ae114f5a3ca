use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::clients::backend_client::BackendApi;
use crate::entitlement::{
    Clock, CountdownHandle, EntitlementError, EntitlementStore, LogoutHook, SessionState,
};
use crate::models::UserRecord;

/// Revokes the backend token of a session whose trial ran out.
pub struct RevokeOnExpiry {
    backend: Arc<dyn BackendApi>,
    token: String,
}

impl LogoutHook for RevokeOnExpiry {
    fn on_expired(&self, identity: &UserRecord) {
        let backend = Arc::clone(&self.backend);
        let token = self.token.clone();
        let username = identity.username.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = backend.logout(&token).await {
                        log::warn!("Failed to revoke backend session of expired user '{}': {}", username, e);
                    }
                });
            }
            Err(_) => log::warn!("No runtime available to revoke session of '{}'.", username),
        }
    }
}

/// One browser session: its entitlement store and the countdown watching it.
pub struct UserSession {
    pub store: Arc<EntitlementStore>,
    countdown: Mutex<Option<CountdownHandle>>,
    last_seen: Mutex<DateTime<Utc>>,
}

impl UserSession {
    fn touch(&self, now: DateTime<Utc>) {
        let mut last_seen = self.last_seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *last_seen = now;
    }

    fn idle_since(&self) -> DateTime<Utc> {
        *self.last_seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_countdown(&self) {
        let mut countdown = self.countdown.lock().unwrap_or_else(|poisoned| {
            log::error!("Countdown mutex was poisoned! Recovering lock.");
            poisoned.into_inner()
        });
        let running = countdown.as_ref().map_or(false, |handle| !handle.is_finished());
        if !running {
            *countdown = Some(self.store.spawn_countdown());
        }
    }

    fn stop_countdown(&self) {
        let mut countdown = self.countdown.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        countdown.take();
    }
}

/// Maps the session id kept in the signed cookie to its [`UserSession`].
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<UserSession>>>,
    backend: Arc<dyn BackendApi>,
    clock: Arc<dyn Clock>,
}

impl SessionRegistry {
    pub fn new(backend: Arc<dyn BackendApi>, clock: Arc<dyn Clock>) -> Self {
        SessionRegistry {
            sessions: RwLock::new(HashMap::new()),
            backend,
            clock,
        }
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<UserSession>> {
        let sessions = self.sessions.read().unwrap_or_else(|poisoned| {
            log::error!("RwLock for session registry was poisoned! Using stale data.");
            poisoned.into_inner()
        });
        sessions.get(session_id).cloned()
    }

    /// Returns the session for `session_id`, creating an empty one on first use.
    pub fn open(&self, session_id: &str, token: &str) -> Arc<UserSession> {
        let now = self.clock.now();
        if let Some(existing) = self.get(session_id) {
            existing.touch(now);
            return existing;
        }
        let mut sessions = self.sessions.write().unwrap_or_else(|poisoned| {
            log::error!("RwLock for session registry was poisoned! Recovering lock.");
            poisoned.into_inner()
        });
        let hook = Arc::new(RevokeOnExpiry {
            backend: Arc::clone(&self.backend),
            token: token.to_string(),
        });
        let session = sessions.entry(session_id.to_string()).or_insert_with(|| {
            Arc::new(UserSession {
                store: Arc::new(EntitlementStore::new(
                    Arc::clone(&self.backend),
                    Arc::clone(&self.clock),
                    hook,
                )),
                countdown: Mutex::new(None),
                last_seen: Mutex::new(now),
            })
        });
        Arc::clone(session)
    }

    /// Loads (or reuses) the identity behind a cookie and keeps a trial countdown running.
    pub async fn identity(&self, session_id: &str, token: &str) -> Result<UserRecord, EntitlementError> {
        let session = self.open(session_id, token);
        let identity = session.store.ensure_loaded(token).await?;
        if identity.is_trial() && identity.expired_at.is_some() {
            session.ensure_countdown();
        }
        Ok(identity)
    }

    pub fn is_expired(&self, session_id: &str) -> bool {
        self.get(session_id)
            .map_or(false, |session| session.store.current() == SessionState::Expired)
    }

    /// Logs the session out and forgets it.
    pub fn close(&self, session_id: &str) {
        let removed = {
            let mut sessions = self.sessions.write().unwrap_or_else(|poisoned| {
                log::error!("RwLock for session registry was poisoned! Recovering lock.");
                poisoned.into_inner()
            });
            sessions.remove(session_id)
        };
        if let Some(session) = removed {
            session.stop_countdown();
            session.store.logout();
        }
    }

    /// Forgets sessions nobody came back for. Failed loads go at once; everything
    /// else, including expired trials still owed their notice, after `idle_ttl`.
    pub fn sweep(&self, idle_ttl: chrono::Duration) -> usize {
        let now = self.clock.now();
        let stale: Vec<Arc<UserSession>> = {
            let mut sessions = self.sessions.write().unwrap_or_else(|poisoned| {
                log::error!("RwLock for session registry was poisoned! Recovering lock.");
                poisoned.into_inner()
            });
            let ids: Vec<String> = sessions
                .iter()
                .filter(|(_, session)| {
                    session.store.current() == SessionState::Unauthenticated
                        || now - session.idle_since() > idle_ttl
                })
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| sessions.remove(&id))
                .collect()
        };
        for session in &stale {
            session.stop_countdown();
            session.store.logout();
        }
        if !stale.is_empty() {
            log::info!("Evicted {} idle session(s).", stale.len());
        }
        stale.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|sessions| sessions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
