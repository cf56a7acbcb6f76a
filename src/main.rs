use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atende_gateway::config::Config;
use atende_gateway::gateway::fanout::GatewayBroadcast;
use atende_gateway::gateway::registry::SessionRegistry;
use atende_gateway::store::memory::MemoryStore;
use atende_gateway::AppState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing — env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    // In-memory stores until the Postgres-backed platform services are wired
    // in; the gateway only sees the trait seams either way.
    let store = Arc::new(MemoryStore::new());

    let state = AppState {
        users: store.clone(),
        conversations: store.clone(),
        messages: store,
        config: Arc::new(config),
        sessions: Arc::new(SessionRegistry::new()),
        broadcast: Arc::new(GatewayBroadcast::new()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(atende_gateway::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "atende-gateway listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}
