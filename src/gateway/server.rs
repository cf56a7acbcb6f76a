//! WebSocket upgrade handler and per-connection event loop.

use std::collections::HashSet;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::id;
use crate::store::with_deadline;
use crate::AppState;

use super::events::{ClientEvent, PresencePayload, ServerEvent};
use super::fanout::Scope;
use super::handler::{self, Principal};
use super::session::Session;

pub fn router() -> Router<AppState> {
    Router::new().route("/gateway", get(ws_upgrade))
}

#[derive(Debug, Deserialize)]
struct ConnectParams {
    token: Option<String>,
}

/// Admission happens before the upgrade completes: a rejected peer only ever
/// observes a failed/closed connection, never a structured error, because
/// there is no authenticated session to address one to.
async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let token = match bearer_token(&headers).or(params.token) {
        Some(token) => token,
        None => return StatusCode::UNAUTHORIZED.into_response(),
    };

    match handler::authenticate(&state, &token).await {
        Ok(principal) => ws
            .on_upgrade(move |socket| handle_connection(socket, state, principal))
            .into_response(),
        Err(reason) => {
            tracing::debug!(%reason, "gateway connection rejected");
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

async fn handle_connection(socket: WebSocket, state: AppState, principal: Principal) {
    let connection_id = id::prefixed_ulid(id::prefix::CONNECTION);
    let session = Session::new(
        connection_id.clone(),
        principal.user_id,
        principal.empresa_id,
        principal.role,
    );

    // Subscribe before registering so nothing published after admission is
    // missed by this connection.
    let broadcast_rx = state.broadcast.subscribe();
    state.sessions.insert(
        connection_id.clone(),
        session.user_id.clone(),
        session.empresa_id.clone(),
    );

    // Best-effort: a failed last-seen write must not abort the connection.
    if let Err(e) = with_deadline(
        state.config.store_timeout,
        state.users.touch_last_seen(&session.user_id),
    )
    .await
    {
        tracing::debug!(user_id = %session.user_id, error = %e, "last-seen update failed");
    }

    state.broadcast.publish(
        Scope::Empresa {
            empresa_id: session.empresa_id.clone(),
            except_connection: Some(connection_id.clone()),
        },
        ServerEvent::UserOnline(PresencePayload {
            user_id: session.user_id.clone(),
            empresa_id: session.empresa_id.clone(),
        }),
    );

    tracing::info!(
        connection_id = %connection_id,
        user_id = %session.user_id,
        empresa_id = %session.empresa_id,
        "gateway session established"
    );

    run_session(&state, &session, socket, broadcast_rx).await;

    // Teardown must tolerate a connection that vanished mid-admission, so
    // removal is a no-op when the id is unknown. The registry decides
    // "last connection for this user" atomically; concurrent teardowns of
    // the same user's connections yield at most one offline broadcast.
    if matches!(state.sessions.remove(&connection_id), Some((_, true))) {
        state.broadcast.publish(
            Scope::Empresa {
                empresa_id: session.empresa_id.clone(),
                except_connection: Some(connection_id.clone()),
            },
            ServerEvent::UserOffline(PresencePayload {
                user_id: session.user_id.clone(),
                empresa_id: session.empresa_id.clone(),
            }),
        );
    }

    tracing::info!(
        connection_id = %connection_id,
        user_id = %session.user_id,
        "gateway session ended"
    );
}

/// Main event loop: inbound frames are handled to completion in arrival
/// order (one connection's events never reorder), interleaved with outbound
/// fan-out filtered against this session and its joined channels.
async fn run_session(
    state: &AppState,
    session: &Session,
    socket: WebSocket,
    mut broadcast_rx: broadcast::Receiver<std::sync::Arc<super::fanout::Outbound>>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut joined: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let event: ClientEvent = match serde_json::from_str(&text) {
                            Ok(event) => event,
                            Err(e) => {
                                tracing::debug!(connection_id = %session.connection_id, ?e, "unparseable event");
                                if send_event(&mut ws_tx, &ServerEvent::error("Evento inválido")).await.is_err() {
                                    break;
                                }
                                continue;
                            }
                        };

                        if let Some(reply) = handler::handle_event(state, session, &mut joined, event).await {
                            if send_event(&mut ws_tx, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) | Some(Ok(Message::Binary(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %session.connection_id, ?e, "ws read error");
                        break;
                    }
                }
            }

            result = broadcast_rx.recv() => {
                match result {
                    Ok(outbound) => {
                        if !outbound.matches(session, &joined) {
                            continue;
                        }
                        if send_event(&mut ws_tx, &outbound.event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            connection_id = %session.connection_id,
                            skipped = n,
                            "gateway session lagged behind broadcast"
                        );
                        // Continue — the missed events are dropped.
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

async fn send_event(
    ws_tx: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(axum::Error::new)?;
    ws_tx.send(Message::Text(json.into())).await
}
