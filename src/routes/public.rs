use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::AuthenticatedUser;
use crate::routes::{account_view, error_json, load_identity, refresh_trial, upstream_failure, ApiResponse};
use crate::AppState;

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(is_server_active))
        .service(
            web::scope("/api/auth")
                .route("/login", web::post().to(handle_login))
                .route("/logout", web::post().to(handle_logout))
                .route("/me", web::get().to(show_account)),
        );
}

async fn is_server_active() -> impl Responder {
    HttpResponse::Ok().body("active")
}

async fn handle_login(
    session: Session,
    state: web::Data<AppState>,
    form: web::Json<LoginForm>,
) -> impl Responder {
    let login_data = form.into_inner();
    let username = login_data.username.trim();
    if username.is_empty() || login_data.password.is_empty() {
        return HttpResponse::BadRequest().json(error_json("Username and password are required."));
    }

    let result = match state.backend.login(username, &login_data.password).await {
        Ok(result) => result,
        Err(e) if e.is_unauthorized() => {
            log::warn!("Failed login attempt for '{}'.", username);
            return HttpResponse::Unauthorized().json(error_json("Invalid credentials or account suspended."));
        }
        Err(e) => {
            log::error!("Backend login failed for '{}': {}", username, e);
            return upstream_failure();
        }
    };

    // A browser logging in again drops the session it already had.
    if let Some(previous) = AuthenticatedUser::from_session(&session) {
        state.sessions.close(&previous.session_id);
        if previous.token != result.token {
            if let Err(e) = state.backend.logout(&previous.token).await {
                log::warn!("Failed to revoke the previous session of '{}': {}", previous.username, e);
            }
        }
    }

    let auth_user = AuthenticatedUser {
        session_id: Uuid::new_v4().to_string(),
        token: result.token,
        user_id: result.user.id,
        username: result.user.username.clone(),
        role: result.user.role,
        email: result.user.email.clone(),
    };
    if let Err(e) = auth_user.store_in(&session) {
        log::error!("Failed to write session cookie for '{}': {}", auth_user.username, e);
        return HttpResponse::InternalServerError().json(error_json("Could not start a session."));
    }

    match load_identity(&state, &session, &auth_user).await {
        Ok(identity) => {
            log::info!("User '{}' logged in as {}.", identity.username, identity.role.as_str());
            ApiResponse::ok(account_view(&state, &auth_user, identity))
        }
        Err(response) => response,
    }
}

async fn handle_logout(session: Session, state: web::Data<AppState>) -> impl Responder {
    if let Some(auth_user) = AuthenticatedUser::from_session(&session) {
        state.sessions.close(&auth_user.session_id);
        if let Err(e) = state.backend.logout(&auth_user.token).await {
            log::warn!("Backend logout failed for '{}': {}", auth_user.username, e);
        }
        log::info!("User '{}' logged out.", auth_user.username);
    }
    session.purge();
    ApiResponse::ok("Logged out.")
}

async fn show_account(
    auth_user: AuthenticatedUser,
    session: Session,
    state: web::Data<AppState>,
) -> impl Responder {
    let identity = match load_identity(&state, &session, &auth_user).await {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    match refresh_trial(&state, &session, &auth_user, identity).await {
        Ok(identity) => ApiResponse::ok(account_view(&state, &auth_user, identity)),
        Err(response) => response,
    }
}
