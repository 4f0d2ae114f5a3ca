use actix_cors::Cors;
use actix_web::{web, App, HttpServer, middleware::{Logger, DefaultHeaders}, cookie::Key, HttpResponse, Responder};
use actix_session::{SessionMiddleware, storage::CookieSessionStore, SessionExt};
use contentgen_backend::{
    clients::{ai_client::build_text_generator, backend_client::{BackendApi, RestBackendClient}},
    config::Config,
    entitlement::{registry::SessionRegistry, SystemClock},
    helper::generation_helpers::GenerationService,
    middleware::{admin_guard, member_guard, TrialExpiryGate},
    routes,
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use clap::Parser;
use std::path::PathBuf;
use std::convert::TryFrom;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// A simple handler for the root URL.
async fn root_handler() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain").body("OK")
}

#[derive(Parser, Debug)]
#[command(name = "contentgen_server", author, version, about = "Starts the content generation server.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    // Load configuration first
    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    // Initialize logger using the value from config
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let backend_http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.backend_request_timeout_secs))
        .build()
        .expect("FATAL: Failed to build the HTTP client for the backend.");
    let backend: Arc<dyn BackendApi> = Arc::new(
        RestBackendClient::new(backend_http, &config.backend_base_url)
            .expect("FATAL: BACKEND_BASE_URL is not a valid URL."),
    );
    let ai = build_text_generator(&config)
        .expect("FATAL: Failed to initialize the AI provider client.");

    let app_state = web::Data::new(AppState {
        backend: Arc::clone(&backend),
        sessions: SessionRegistry::new(Arc::clone(&backend), Arc::new(SystemClock)),
        generation: GenerationService::new(Arc::from(ai), Arc::clone(&backend)),
        trial_generation_limit: config.trial_generation_limit,
        max_upload_bytes: config.max_upload_bytes(),
    });

    // Evicts sessions whose browser never came back.
    let sweep_state = app_state.clone();
    let idle_ttl = config.session_idle_timeout();
    actix_web::rt::spawn(async move {
        let mut ticker = actix_web::rt::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            sweep_state.sessions.sweep(idle_ttl);
        }
    });

    let session_key_bytes = hex::decode(&config.session_secret_key)
        .expect("FATAL: SESSION_SECRET_KEY in .env is not a valid hex string.");
    let session_key = Key::try_from(session_key_bytes.as_slice())
        .expect("FATAL: The decoded SESSION_SECRET_KEY is not long enough (minimum 64 bytes required).");

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    log::info!("Server starting at http://{} (AI provider: {:?})", server_address, config.ai_provider);

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
            .cookie_secure(config.use_secure_cookies)
            .cookie_http_only(true)
            .cookie_same_site(actix_web::cookie::SameSite::Lax)
            .build();

        let cors = {
            let allowed_origins_str = &config.allowed_origins;
            if allowed_origins_str.trim() == "*" {
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                    .allowed_headers(vec![actix_web::http::header::AUTHORIZATION, actix_web::http::header::ACCEPT, actix_web::http::header::CONTENT_TYPE])
                    .supports_credentials()
                    .max_age(3600)
            } else {
                let mut cors = Cors::default();
                let origins: Vec<&str> = allowed_origins_str.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
                for origin in origins {
                    cors = cors.allowed_origin(origin);
                }
                cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                    .allowed_headers(vec![actix_web::http::header::AUTHORIZATION, actix_web::http::header::ACCEPT, actix_web::http::header::CONTENT_TYPE])
                    .supports_credentials()
                    .max_age(3600)
            }
        };

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
            )
            .app_data(web::JsonConfig::default().limit(app_state.max_upload_bytes))
            .app_data(app_state.clone())

            .route("/", web::get().to(root_handler))

            // Every /api route sees the signed session cookie; the expiry gate
            // runs inside it so it can purge the cookie.
            .service(
                web::scope("")
                    .wrap(TrialExpiryGate)
                    .wrap(session_mw)
                    .configure(routes::public::config_api)
                    .service(
                        web::scope("/api/admin")
                            .guard(actix_web::guard::fn_guard(|ctx| admin_guard(&ctx.get_session())))
                            .configure(routes::admin::config_admin)
                    )
                    .service(
                        web::scope("/api")
                            .guard(actix_web::guard::fn_guard(|ctx| member_guard(&ctx.get_session())))
                            .configure(routes::generation::config_generation)
                            .configure(routes::content::config_content)
                    )
            )
    })
    .bind(server_address)?
    .run()
    .await
}
