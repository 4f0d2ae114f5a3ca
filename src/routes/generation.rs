use actix_multipart::Multipart;
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::helper::form_helpers::collect_generation_upload;
use crate::helper::generation_helpers::{Attachments, Caller, GenerationInput};
use crate::middleware::{expired_response, AuthenticatedUser};
use crate::models::generation::{GenerationForm, OutputLanguage};
use crate::routes::{
    account_view, end_session, error_json, load_identity, refresh_trial, AccountView, ApiResponse,
};
use crate::AppState;

const GENERATION_FAILED: &str = "Content generation failed. Please try again.";

#[derive(Serialize)]
struct GenerationResult {
    content: String,
    account: AccountView,
}

pub fn config_generation(cfg: &mut web::ServiceConfig) {
    cfg.route("/generate", web::post().to(generate_from_json))
        .route("/generate/upload", web::post().to(generate_from_upload))
        .route("/generate/voice", web::post().to(generate_from_voice));
}

async fn generate_from_json(
    auth_user: AuthenticatedUser,
    session: Session,
    state: web::Data<AppState>,
    form: web::Json<GenerationForm>,
) -> impl Responder {
    let request = match form.into_inner().validate() {
        Ok(request) => request,
        Err(e) => return HttpResponse::BadRequest().json(error_json(&e.to_string())),
    };
    run_generation(&state, &session, &auth_user, GenerationInput::Form(request), Attachments::default()).await
}

async fn generate_from_upload(
    auth_user: AuthenticatedUser,
    session: Session,
    state: web::Data<AppState>,
    payload: Multipart,
) -> impl Responder {
    let upload = match collect_generation_upload(payload, state.max_upload_bytes).await {
        Ok(upload) => upload,
        Err(e) => {
            log::warn!("Rejected generation upload from '{}': {}", auth_user.username, e);
            return HttpResponse::BadRequest().json(error_json(&e.to_string()));
        }
    };

    let Some(raw_request) = upload.fields.get("request") else {
        return HttpResponse::BadRequest().json(error_json("Field 'request' is required."));
    };
    let form: GenerationForm = match serde_json::from_str(raw_request) {
        Ok(form) => form,
        Err(e) => return HttpResponse::BadRequest().json(error_json(&format!("Malformed request field: {}", e))),
    };
    let request = match form.validate() {
        Ok(request) => request,
        Err(e) => return HttpResponse::BadRequest().json(error_json(&e.to_string())),
    };

    run_generation(&state, &session, &auth_user, GenerationInput::Form(request), upload.attachments).await
}

async fn generate_from_voice(
    auth_user: AuthenticatedUser,
    session: Session,
    state: web::Data<AppState>,
    payload: Multipart,
) -> impl Responder {
    let upload = match collect_generation_upload(payload, state.max_upload_bytes).await {
        Ok(upload) => upload,
        Err(e) => {
            log::warn!("Rejected voice upload from '{}': {}", auth_user.username, e);
            return HttpResponse::BadRequest().json(error_json(&e.to_string()));
        }
    };

    let language = match upload.fields.get("outputLanguage").map(String::as_str) {
        Some(raw) => match OutputLanguage::parse(raw) {
            Some(language) => language,
            None => {
                return HttpResponse::BadRequest()
                    .json(error_json(&format!("Unsupported output language '{}'.", raw)))
            }
        },
        None => return HttpResponse::BadRequest().json(error_json("Field 'outputLanguage' is required.")),
    };
    if upload.attachments.audio.is_none() {
        return HttpResponse::BadRequest().json(error_json("Voice generation needs an audio clip."));
    }

    run_generation(&state, &session, &auth_user, GenerationInput::Voice(language), upload.attachments).await
}

/// Shared tail of every generation route: identity, provider call, expiry
/// check and credit refresh.
async fn run_generation(
    state: &AppState,
    session: &Session,
    auth_user: &AuthenticatedUser,
    input: GenerationInput,
    attachments: Attachments,
) -> HttpResponse {
    let identity = match load_identity(state, session, auth_user).await {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    let caller = Caller { token: &auth_user.token, identity: &identity };
    let content = match state.generation.generate(&input, &attachments, &caller).await {
        Ok(content) => content,
        Err(e) => {
            log::error!("Generation failed for '{}': {}", auth_user.username, e);
            return HttpResponse::BadGateway().json(error_json(GENERATION_FAILED));
        }
    };

    // The countdown may have fired while the provider was working.
    if state.sessions.is_expired(&auth_user.session_id) {
        log::warn!("Discarding generation result for expired session of '{}'.", auth_user.username);
        end_session(state, session, auth_user);
        return expired_response();
    }

    let refreshed = match refresh_trial(state, session, auth_user, identity).await {
        Ok(refreshed) => refreshed,
        Err(response) => return response,
    };
    ApiResponse::ok(GenerationResult {
        content,
        account: account_view(state, auth_user, refreshed),
    })
}
