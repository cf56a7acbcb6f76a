//! Broadcast hub for fanning gateway events out to connected sessions.
//!
//! A single `tokio::sync::broadcast` channel carries every outbound event
//! together with a delivery scope; each connection task subscribes once and
//! filters locally against its session and joined channels. Caller-only
//! replies (`error`) never go through the hub.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::broadcast;

use super::events::ServerEvent;
use super::session::Session;

/// Capacity of the broadcast channel. Receivers that fall behind skip
/// events (RecvError::Lagged).
const BROADCAST_CAPACITY: usize = 4096;

/// Which connections an outbound event is addressed to.
#[derive(Debug, Clone)]
pub enum Scope {
    /// Every connection whose session belongs to the empresa.
    Empresa {
        empresa_id: String,
        except_connection: Option<String>,
    },
    /// Every connection currently joined to the conversation channel.
    Conversa {
        chat_id: String,
        except_connection: Option<String>,
    },
}

/// A scoped event published to the hub.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub scope: Scope,
    pub event: ServerEvent,
}

impl Outbound {
    /// Whether this event should be delivered on the given connection,
    /// considering its session identity and joined conversation channels.
    pub fn matches(&self, session: &Session, joined: &HashSet<String>) -> bool {
        match &self.scope {
            Scope::Empresa {
                empresa_id,
                except_connection,
            } => {
                session.empresa_id == *empresa_id
                    && except_connection.as_deref() != Some(session.connection_id.as_str())
            }
            Scope::Conversa {
                chat_id,
                except_connection,
            } => {
                joined.contains(chat_id)
                    && except_connection.as_deref() != Some(session.connection_id.as_str())
            }
        }
    }
}

/// The broadcast hub. Cloneable — store in AppState.
#[derive(Clone)]
pub struct GatewayBroadcast {
    sender: broadcast::Sender<Arc<Outbound>>,
}

impl GatewayBroadcast {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Subscribe to the hub. Each connection task calls this once, before
    /// registering its session, so nothing published afterwards is missed.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Outbound>> {
        self.sender.subscribe()
    }

    /// Publish an event. send() returns Err when no receiver exists — fine.
    pub fn publish(&self, scope: Scope, event: ServerEvent) {
        let _ = self.sender.send(Arc::new(Outbound { scope, event }));
    }
}

impl Default for GatewayBroadcast {
    fn default() -> Self {
        Self::new()
    }
}
