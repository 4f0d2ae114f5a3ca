use actix_session::Session;
use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::json;

use crate::clients::backend_client::BackendError;
use crate::entitlement::{EntitlementError, SessionState};
use crate::middleware::{expired_response, AuthenticatedUser, LOGIN_PATH};
use crate::models::UserRecord;
use crate::AppState;

pub mod admin;
pub mod content;
pub mod generation;
pub mod public;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> HttpResponse {
        HttpResponse::Ok().json(ApiResponse { success: true, data: Some(data), error: None })
    }
}

pub fn error_json(message: &str) -> serde_json::Value {
    json!({ "success": false, "data": null, "error": message })
}

/// What the UI shows about the signed-in account.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub user: UserRecord,
    pub remaining_credits: Option<u32>,
    pub expires_in_seconds: Option<i64>,
}

pub fn account_view(state: &AppState, auth_user: &AuthenticatedUser, identity: UserRecord) -> AccountView {
    let store = state.sessions.get(&auth_user.session_id).map(|session| session.store.clone());
    AccountView {
        remaining_credits: store
            .as_ref()
            .and_then(|store| store.remaining_credits(state.trial_generation_limit)),
        expires_in_seconds: store
            .as_ref()
            .and_then(|store| store.remaining_time())
            .map(|remaining| remaining.num_seconds().max(0)),
        user: identity,
    }
}

/// Ends the browser session locally.
pub fn end_session(state: &AppState, session: &Session, auth_user: &AuthenticatedUser) {
    state.sessions.close(&auth_user.session_id);
    session.purge();
}

/// Resolves the identity behind the cookie, or the response to send instead.
pub async fn load_identity(
    state: &AppState,
    session: &Session,
    auth_user: &AuthenticatedUser,
) -> Result<UserRecord, HttpResponse> {
    match state.sessions.identity(&auth_user.session_id, &auth_user.token).await {
        Ok(identity) => Ok(identity),
        Err(EntitlementError::Expired) => {
            end_session(state, session, auth_user);
            Err(expired_response())
        }
        Err(EntitlementError::Backend(e)) if e.is_unauthorized() => {
            log::warn!("Backend rejected the session of '{}'.", auth_user.username);
            end_session(state, session, auth_user);
            Err(HttpResponse::Unauthorized().json(json!({
                "success": false,
                "error": "Your session is no longer valid. Please log in again.",
                "redirect": LOGIN_PATH,
            })))
        }
        Err(EntitlementError::NotAuthenticated) => {
            end_session(state, session, auth_user);
            Err(HttpResponse::Unauthorized().json(error_json("Not logged in.")))
        }
        Err(e) => {
            log::error!("Failed to load identity for '{}': {}", auth_user.username, e);
            Err(upstream_failure())
        }
    }
}

/// Re-reads a trial's counters and expiry from the backend, so credit use and
/// admin edits to `expiredAt` reach the session's countdown.
pub async fn refresh_trial(
    state: &AppState,
    session: &Session,
    auth_user: &AuthenticatedUser,
    identity: UserRecord,
) -> Result<UserRecord, HttpResponse> {
    if !identity.is_trial() {
        return Ok(identity);
    }
    let Some(user_session) = state.sessions.get(&auth_user.session_id) else {
        return Ok(identity);
    };
    match user_session.store.refresh_credits(&auth_user.token).await {
        Ok(()) => {}
        Err(EntitlementError::Expired) => {
            end_session(state, session, auth_user);
            return Err(expired_response());
        }
        Err(e) => log::warn!("Could not refresh trial record of '{}': {}", auth_user.username, e),
    }
    Ok(match user_session.store.current() {
        SessionState::AuthenticatedReady(current) => current,
        _ => identity,
    })
}

/// The single generic message shown for provider or backend failures.
pub fn upstream_failure() -> HttpResponse {
    HttpResponse::BadGateway().json(error_json("The service is unavailable right now. Please try again."))
}

pub fn backend_failure(context: &str, e: &BackendError) -> HttpResponse {
    if e.is_not_found() {
        return HttpResponse::NotFound().json(error_json("Not found."));
    }
    log::error!("{}: {}", context, e);
    upstream_failure()
}
