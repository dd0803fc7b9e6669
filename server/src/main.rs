mod ai;
mod projects;


use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use architect_core::{AiSettings, Storage};

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub settings: Arc<AiSettings>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() {
    // .env is optional; the system environment works on its own.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_or("RUST_LOG", "info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = env_or("ARCHITECT_DATA_DIR", "data");
    let storage = match Storage::new(&data_dir) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("cannot initialize storage at {data_dir}: {e}");
            std::process::exit(1);
        }
    };

    let settings = Arc::new(AiSettings::from_env());
    if !settings.configured() {
        tracing::warn!(
            "AI provider not fully configured (set ARCHITECT_PROVIDER / ARCHITECT_API_KEY / \
             ARCHITECT_CHAT_MODEL); chat and schematic calls will fail"
        );
    }

    let state = AppState { storage, settings };
    let public_dir = env_or("ARCHITECT_PUBLIC_DIR", "public");

    let app = Router::new()
        .route("/api/projects", get(projects::list).post(projects::create))
        .route("/api/projects/:name", get(projects::load))
        .route("/api/ai/style", get(ai::get_style).post(ai::save_style))
        .route("/api/ai/chat", post(ai::chat))
        .route("/api/ai/schematic", post(ai::schematic))
        .fallback_service(ServeDir::new(&public_dir))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = env_or("ARCHITECT_ADDR", "127.0.0.1:3000");
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("cannot bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!("listening on http://{addr} (ui from {public_dir}/, data in {data_dir}/)");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
