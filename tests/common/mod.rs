#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use atende_gateway::config::Config;
use atende_gateway::gateway::fanout::GatewayBroadcast;
use atende_gateway::gateway::registry::SessionRegistry;
use atende_gateway::models::conversation::{Conversa, ConversaStatus};
use atende_gateway::models::customer::Cliente;
use atende_gateway::models::user::{Role, Usuario};
use atende_gateway::store::memory::MemoryStore;
use atende_gateway::AppState;

pub const TEST_SECRET: &str = "gateway-test-secret";

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Build an AppState backed by a shared in-memory store.
pub fn test_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        users: store.clone(),
        conversations: store.clone(),
        messages: store.clone(),
        config: Arc::new(Config {
            jwt_secret: TEST_SECRET.to_string(),
            port: 0,
            store_timeout: Duration::from_secs(2),
        }),
        sessions: Arc::new(SessionRegistry::new()),
        broadcast: Arc::new(GatewayBroadcast::new()),
    };
    (state, store)
}

/// Serve an existing state on an ephemeral port, in the background.
pub async fn serve(state: AppState) -> SocketAddr {
    let app = atende_gateway::routes::router().with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// Start a gateway on an ephemeral port. The server runs in the background.
pub async fn start_server() -> (SocketAddr, AppState, Arc<MemoryStore>) {
    let (state, store) = test_state();
    let addr = serve(state.clone()).await;
    (addr, state, store)
}

/// Mint an HS256 access token the way the platform API does.
pub fn mint_token(user_id: &str, empresa_id: &str, role: &str) -> String {
    let claims = serde_json::json!({
        "sub": user_id,
        "empresa_id": empresa_id,
        "role": role,
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn seed_user(store: &MemoryStore, id: &str, empresa_id: &str, email: &str, role: Role) {
    store.insert_user(Usuario {
        id: id.to_string(),
        empresa_id: empresa_id.to_string(),
        nome: id.to_string(),
        email: email.to_string(),
        role,
        ativo: true,
        ultimo_acesso: None,
    });
}

pub fn seed_customer(store: &MemoryStore, id: &str, empresa_id: &str, email: &str) {
    store.insert_customer(Cliente {
        id: id.to_string(),
        empresa_id: empresa_id.to_string(),
        nome: id.to_string(),
        email: email.to_string(),
    });
}

pub fn seed_conversation(store: &MemoryStore, id: &str, empresa_id: &str, cliente_id: &str) {
    store.insert_conversation(Conversa {
        id: id.to_string(),
        empresa_id: empresa_id.to_string(),
        cliente_id: cliente_id.to_string(),
        agente_id: None,
        status: ConversaStatus::Aberta,
    });
}

/// Connect with the token in the handshake query string.
pub async fn connect(addr: SocketAddr, token: &str) -> WsClient {
    let url = format!("ws://{addr}/gateway?token={token}");
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws
}

/// Attempt a connection that is expected to be rejected at the handshake.
pub async fn connect_expect_rejection(addr: SocketAddr, token: Option<&str>) {
    let url = match token {
        Some(token) => format!("ws://{addr}/gateway?token={token}"),
        None => format!("ws://{addr}/gateway"),
    };
    let result = tokio_tungstenite::connect_async(&url).await;
    assert!(result.is_err(), "handshake should have been rejected");
}

pub async fn send_json(ws: &mut WsClient, value: &serde_json::Value) {
    ws.send(tungstenite::Message::Text(value.to_string().into()))
        .await
        .expect("ws send");
}

/// Read the next JSON event, failing after 5 seconds.
pub async fn recv_event(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let msg = time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for event")
            .expect("stream ended")
            .expect("ws read error");
        match msg {
            tungstenite::Message::Text(text) => {
                return serde_json::from_str(&text).expect("parse event")
            }
            tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Assert that no event arrives within the window.
pub async fn assert_no_event(ws: &mut WsClient, window: Duration) {
    if let Ok(Some(Ok(msg))) = time::timeout(window, ws.next()).await {
        if let tungstenite::Message::Text(text) = &msg {
            panic!("expected no event, got: {text}");
        }
    }
}
