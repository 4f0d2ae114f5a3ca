#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contentgen_backend::clients::ai_client::{AiError, AiMessage, TextGenerator};
use contentgen_backend::clients::backend_client::{BackendApi, BackendError};
use contentgen_backend::entitlement::{Clock, LogoutHook};
use contentgen_backend::helper::time_helpers::to_yangon;
use contentgen_backend::models::{
    LoginResult, NewContent, Role, SavedContent, UserRecord, UserUpsert,
};

pub const PASSWORD: &str = "secret";

pub fn user(id: i64, username: &str, role: Role) -> UserRecord {
    UserRecord {
        id,
        username: username.to_string(),
        role,
        email: format!("{}@example.com", username),
        generated_count: 0,
        expired_at: None,
    }
}

pub fn trial_user(id: i64, username: &str, generated_count: u32, expired_at: DateTime<Utc>) -> UserRecord {
    UserRecord {
        generated_count,
        expired_at: Some(to_yangon(expired_at)),
        ..user(id, username, Role::Trial)
    }
}

pub fn token_for(user_id: i64) -> String {
    format!("token-{}", user_id)
}

fn status(code: u16, body: &str) -> BackendError {
    BackendError::Status { status: code, body: body.to_string() }
}

/// In-memory stand-in for the REST backend.
#[derive(Default)]
pub struct FakeBackend {
    pub users: Mutex<Vec<UserRecord>>,
    pub contents: Mutex<Vec<SavedContent>>,
    pub upserts: Mutex<Vec<UserUpsert>>,
    pub logout_calls: AtomicUsize,
    pub increment_calls: AtomicUsize,
    /// How much the server adds per recorded generation.
    pub increment_step: AtomicU32,
    pub fail_session: AtomicBool,
    pub fetch_delay_ms: AtomicU32,
}

impl FakeBackend {
    pub fn with_users(users: Vec<UserRecord>) -> Arc<FakeBackend> {
        let backend = FakeBackend::default();
        backend.increment_step.store(1, Ordering::SeqCst);
        *backend.users.lock().unwrap() = users;
        Arc::new(backend)
    }

    pub fn set_generated_count(&self, user_id: i64, count: u32) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|user| user.id == user_id) {
            user.generated_count = count;
        }
    }

    pub fn set_expired_at(&self, user_id: i64, expired_at: DateTime<Utc>) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|user| user.id == user_id) {
            user.expired_at = Some(to_yangon(expired_at));
        }
    }

    fn find(&self, user_id: i64) -> Result<UserRecord, BackendError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == user_id)
            .cloned()
            .ok_or_else(|| status(404, "user not found"))
    }

    fn user_for_token(&self, token: &str) -> Result<UserRecord, BackendError> {
        let user_id = token
            .strip_prefix("token-")
            .and_then(|id| id.parse::<i64>().ok())
            .ok_or_else(|| status(401, "bad token"))?;
        self.find(user_id).map_err(|_| status(401, "bad token"))
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, BackendError> {
        let found = self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.username == username)
            .cloned();
        match found {
            Some(user) if password == PASSWORD => Ok(LoginResult { token: token_for(user.id), user }),
            _ => Err(status(401, "invalid credentials")),
        }
    }

    async fn logout(&self, _token: &str) -> Result<(), BackendError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn current_session(&self, token: &str) -> Result<UserRecord, BackendError> {
        if self.fail_session.load(Ordering::SeqCst) {
            return Err(status(503, "backend down"));
        }
        let mut user = self.user_for_token(token)?;
        // The session endpoint only reports claims; trial counters come from /users/{id}.
        user.generated_count = 0;
        user.expired_at = None;
        Ok(user)
    }

    async fn fetch_user(&self, token: &str, user_id: i64) -> Result<UserRecord, BackendError> {
        self.user_for_token(token)?;
        let delay = self.fetch_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        self.find(user_id)
    }

    async fn list_users(&self, token: &str) -> Result<Vec<UserRecord>, BackendError> {
        self.user_for_token(token)?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn create_user(&self, token: &str, upsert: &UserUpsert) -> Result<UserRecord, BackendError> {
        self.user_for_token(token)?;
        self.upserts.lock().unwrap().push(upsert.clone());
        let mut users = self.users.lock().unwrap();
        let id = users.iter().map(|user| user.id).max().unwrap_or(0) + 1;
        let created = UserRecord {
            id,
            username: upsert.username.clone(),
            role: upsert.role,
            email: upsert.email.clone(),
            generated_count: 0,
            expired_at: upsert
                .expired_at
                .as_deref()
                .and_then(|raw| DateTime::<FixedOffset>::parse_from_rfc3339(raw).ok()),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, token: &str, user_id: i64, upsert: &UserUpsert) -> Result<UserRecord, BackendError> {
        self.user_for_token(token)?;
        self.upserts.lock().unwrap().push(upsert.clone());
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|user| user.id == user_id)
            .ok_or_else(|| status(404, "user not found"))?;
        user.username = upsert.username.clone();
        user.role = upsert.role;
        user.email = upsert.email.clone();
        Ok(user.clone())
    }

    async fn delete_user(&self, token: &str, user_id: i64) -> Result<(), BackendError> {
        self.user_for_token(token)?;
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|user| user.id != user_id);
        if users.len() == before {
            return Err(status(404, "user not found"));
        }
        Ok(())
    }

    async fn increment_trial_usage(&self, token: &str, user_id: i64) -> Result<(), BackendError> {
        self.user_for_token(token)?;
        self.increment_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.increment_step.load(Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|user| user.id == user_id) {
            user.generated_count += step;
        }
        Ok(())
    }

    async fn list_contents(&self, token: &str) -> Result<Vec<SavedContent>, BackendError> {
        self.user_for_token(token)?;
        Ok(self.contents.lock().unwrap().clone())
    }

    async fn fetch_content(&self, token: &str, content_id: &str) -> Result<SavedContent, BackendError> {
        self.user_for_token(token)?;
        self.contents
            .lock()
            .unwrap()
            .iter()
            .find(|content| content.id == content_id)
            .cloned()
            .ok_or_else(|| status(404, "content not found"))
    }

    async fn create_content(&self, token: &str, content: &NewContent) -> Result<SavedContent, BackendError> {
        self.user_for_token(token)?;
        let mut contents = self.contents.lock().unwrap();
        let saved = SavedContent {
            id: format!("c{}", contents.len() + 1),
            title: content.title.clone(),
            content: content.content.clone(),
            topic: content.topic.clone(),
            output_language: content.output_language.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        contents.push(saved.clone());
        Ok(saved)
    }

    async fn update_content(&self, token: &str, content_id: &str, content: &NewContent) -> Result<SavedContent, BackendError> {
        self.user_for_token(token)?;
        let mut contents = self.contents.lock().unwrap();
        let saved = contents
            .iter_mut()
            .find(|saved| saved.id == content_id)
            .ok_or_else(|| status(404, "content not found"))?;
        saved.title = content.title.clone();
        saved.content = content.content.clone();
        saved.updated_at = Some(Utc::now());
        Ok(saved.clone())
    }

    async fn delete_content(&self, token: &str, content_id: &str) -> Result<(), BackendError> {
        self.user_for_token(token)?;
        let mut contents = self.contents.lock().unwrap();
        let before = contents.len();
        contents.retain(|saved| saved.id != content_id);
        if contents.len() == before {
            return Err(status(404, "content not found"));
        }
        Ok(())
    }
}

/// Records every conversation and answers with a fixed text.
#[derive(Default)]
pub struct FakeGenerator {
    pub calls: Mutex<Vec<Vec<AiMessage>>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate_text(&self, messages: &[AiMessage]) -> Result<String, AiError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        if self.fail.load(Ordering::SeqCst) {
            return Err(AiError::Status { status: 500, body: "provider exploded".into() });
        }
        Ok("Fresh marketing copy".to_string())
    }
}

/// Wall clock driven by tokio's (pausable) clock.
pub struct TokioClock {
    base: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl TokioClock {
    pub fn starting_at(base: DateTime<Utc>) -> Self {
        TokioClock { base, started: tokio::time::Instant::now() }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        self.base + chrono::Duration::from_std(self.started.elapsed()).unwrap()
    }
}

/// Clock moved by hand.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        ManualClock { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub struct CountingHook {
    pub fired: AtomicUsize,
}

impl LogoutHook for CountingHook {
    fn on_expired(&self, _identity: &UserRecord) {
        self.fired.fetch_add(1, Ordering::SeqCst);
    }
}
