use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::helper::admin_helpers::{build_user_upsert, UserForm};
use crate::middleware::{AuthenticatedUser, LOGIN_PATH};
use crate::models::Role;
use crate::routes::{backend_failure, end_session, error_json, load_identity, ApiResponse};
use crate::AppState;

pub fn config_admin(cfg: &mut web::ServiceConfig) {
    cfg.route("/users", web::get().to(list_users))
        .route("/users", web::post().to(create_user_action))
        .route("/users/{id}", web::put().to(update_user_action))
        .route("/users/{id}", web::delete().to(delete_user_action));
}

/// Re-checks the role against the backend identity, not only the cookie claim.
async fn require_admin(
    state: &AppState,
    session: &Session,
    auth_user: &AuthenticatedUser,
) -> Result<(), HttpResponse> {
    let identity = load_identity(state, session, auth_user).await?;
    if identity.role != Role::Admin {
        log::warn!("Non-admin '{}' attempted to manage users.", auth_user.username);
        return Err(HttpResponse::Forbidden().json(error_json("Administrator access required.")));
    }
    Ok(())
}

async fn list_users(
    auth_user: AuthenticatedUser,
    session: Session,
    state: web::Data<AppState>,
) -> impl Responder {
    if let Err(response) = require_admin(&state, &session, &auth_user).await {
        return response;
    }
    match state.backend.list_users(&auth_user.token).await {
        Ok(users) => ApiResponse::ok(users),
        Err(e) => backend_failure("Failed to list users", &e),
    }
}

async fn create_user_action(
    auth_user: AuthenticatedUser,
    session: Session,
    state: web::Data<AppState>,
    form: web::Json<UserForm>,
) -> impl Responder {
    if let Err(response) = require_admin(&state, &session, &auth_user).await {
        return response;
    }
    let upsert = match build_user_upsert(form.into_inner(), true) {
        Ok(upsert) => upsert,
        Err(e) => return HttpResponse::BadRequest().json(error_json(&e.to_string())),
    };
    match state.backend.create_user(&auth_user.token, &upsert).await {
        Ok(user) => {
            log::info!("Admin '{}' created {} account '{}'.", auth_user.username, user.role.as_str(), user.username);
            ApiResponse::ok(user)
        }
        Err(e) => backend_failure(&format!("Failed to create user '{}'", upsert.username), &e),
    }
}

async fn update_user_action(
    auth_user: AuthenticatedUser,
    session: Session,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    form: web::Json<UserForm>,
) -> impl Responder {
    if let Err(response) = require_admin(&state, &session, &auth_user).await {
        return response;
    }
    let user_id = path.into_inner();
    let upsert = match build_user_upsert(form.into_inner(), false) {
        Ok(upsert) => upsert,
        Err(e) => return HttpResponse::BadRequest().json(error_json(&e.to_string())),
    };
    match state.backend.update_user(&auth_user.token, user_id, &upsert).await {
        Ok(user) => {
            log::info!("Admin '{}' updated account '{}'.", auth_user.username, user.username);
            ApiResponse::ok(user)
        }
        Err(e) => backend_failure(&format!("Failed to update user {}", user_id), &e),
    }
}

async fn delete_user_action(
    auth_user: AuthenticatedUser,
    session: Session,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    if let Err(response) = require_admin(&state, &session, &auth_user).await {
        return response;
    }
    let user_id = path.into_inner();
    if let Err(e) = state.backend.delete_user(&auth_user.token, user_id).await {
        return backend_failure(&format!("Failed to delete user {}", user_id), &e);
    }
    log::info!("Admin '{}' deleted user {}.", auth_user.username, user_id);

    // Deleting your own account ends the session.
    if user_id == auth_user.user_id {
        end_session(&state, &session, &auth_user);
        return HttpResponse::Ok().json(json!({
            "success": true,
            "data": "Your account was deleted.",
            "redirect": LOGIN_PATH,
        }));
    }
    ApiResponse::ok("Deleted.")
}
