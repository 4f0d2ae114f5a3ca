use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};

use crate::middleware::AuthenticatedUser;
use crate::models::NewContent;
use crate::routes::{backend_failure, error_json, load_identity, ApiResponse};
use crate::AppState;

pub fn config_content(cfg: &mut web::ServiceConfig) {
    cfg.route("/contents", web::get().to(list_contents))
        .route("/contents", web::post().to(create_content))
        .route("/contents/{id}", web::get().to(show_content))
        .route("/contents/{id}", web::put().to(update_content))
        .route("/contents/{id}", web::delete().to(delete_content));
}

/// Backend ids are opaque but only ever alphanumeric with `-` or `_`.
pub fn is_valid_content_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn validate_content(content: NewContent) -> Result<NewContent, HttpResponse> {
    let title = content.title.trim().to_string();
    if title.is_empty() {
        return Err(HttpResponse::BadRequest().json(error_json("Title is required.")));
    }
    if content.content.trim().is_empty() {
        return Err(HttpResponse::BadRequest().json(error_json("Content is required.")));
    }
    Ok(NewContent { title, ..content })
}

async fn list_contents(
    auth_user: AuthenticatedUser,
    session: Session,
    state: web::Data<AppState>,
) -> impl Responder {
    if let Err(response) = load_identity(&state, &session, &auth_user).await {
        return response;
    }
    match state.backend.list_contents(&auth_user.token).await {
        Ok(contents) => ApiResponse::ok(contents),
        Err(e) => backend_failure("Failed to list saved content", &e),
    }
}

async fn show_content(
    auth_user: AuthenticatedUser,
    session: Session,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let content_id = path.into_inner();
    if !is_valid_content_id(&content_id) {
        return HttpResponse::BadRequest().json(error_json("Invalid content id."));
    }
    if let Err(response) = load_identity(&state, &session, &auth_user).await {
        return response;
    }
    match state.backend.fetch_content(&auth_user.token, &content_id).await {
        Ok(content) => ApiResponse::ok(content),
        Err(e) => backend_failure(&format!("Failed to fetch content {}", content_id), &e),
    }
}

async fn create_content(
    auth_user: AuthenticatedUser,
    session: Session,
    state: web::Data<AppState>,
    form: web::Json<NewContent>,
) -> impl Responder {
    let content = match validate_content(form.into_inner()) {
        Ok(content) => content,
        Err(response) => return response,
    };
    // Saving after an automatic logout is refused by load_identity.
    if let Err(response) = load_identity(&state, &session, &auth_user).await {
        return response;
    }
    match state.backend.create_content(&auth_user.token, &content).await {
        Ok(saved) => {
            log::info!("User '{}' saved content '{}'.", auth_user.username, saved.id);
            ApiResponse::ok(saved)
        }
        Err(e) => backend_failure("Failed to save content", &e),
    }
}

async fn update_content(
    auth_user: AuthenticatedUser,
    session: Session,
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Json<NewContent>,
) -> impl Responder {
    let content_id = path.into_inner();
    if !is_valid_content_id(&content_id) {
        return HttpResponse::BadRequest().json(error_json("Invalid content id."));
    }
    let content = match validate_content(form.into_inner()) {
        Ok(content) => content,
        Err(response) => return response,
    };
    if let Err(response) = load_identity(&state, &session, &auth_user).await {
        return response;
    }
    match state.backend.update_content(&auth_user.token, &content_id, &content).await {
        Ok(saved) => ApiResponse::ok(saved),
        Err(e) => backend_failure(&format!("Failed to update content {}", content_id), &e),
    }
}

async fn delete_content(
    auth_user: AuthenticatedUser,
    session: Session,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let content_id = path.into_inner();
    if !is_valid_content_id(&content_id) {
        return HttpResponse::BadRequest().json(error_json("Invalid content id."));
    }
    if let Err(response) = load_identity(&state, &session, &auth_user).await {
        return response;
    }
    match state.backend.delete_content(&auth_user.token, &content_id).await {
        Ok(()) => {
            log::info!("User '{}' deleted content '{}'.", auth_user.username, content_id);
            ApiResponse::ok("Deleted.")
        }
        Err(e) => backend_failure(&format!("Failed to delete content {}", content_id), &e),
    }
}
