pub mod auth;
pub mod config;
pub mod gateway;
pub mod id;
pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use config::Config;
use gateway::fanout::GatewayBroadcast;
use gateway::registry::SessionRegistry;
use store::{ConversationStore, MessageStore, UserDirectory};

/// Shared application state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserDirectory>,
    pub conversations: Arc<dyn ConversationStore>,
    pub messages: Arc<dyn MessageStore>,
    pub config: Arc<Config>,
    pub sessions: Arc<SessionRegistry>,
    pub broadcast: Arc<GatewayBroadcast>,
}
