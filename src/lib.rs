use std::sync::Arc;

use clients::backend_client::BackendApi;
use entitlement::registry::SessionRegistry;
use helper::generation_helpers::GenerationService;

/// Shared services handed to every handler through `web::Data`.
pub struct AppState {
    pub backend: Arc<dyn BackendApi>,
    pub sessions: SessionRegistry,
    pub generation: GenerationService,
    pub trial_generation_limit: u32,
    pub max_upload_bytes: usize,
}

pub mod clients;
pub mod config;
pub mod entitlement;
pub mod helper;
pub mod middleware;
pub mod models;
pub mod routes;
