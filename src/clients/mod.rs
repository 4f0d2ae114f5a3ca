pub mod ai_client;
pub mod backend_client;
