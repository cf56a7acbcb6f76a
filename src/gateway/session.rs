//! Per-connection gateway session state.

use crate::models::user::Role;

/// Principal for a single WebSocket connection, resolved once at admission
/// and never refreshed; a role or empresa change applies on reconnect.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique connection identifier (`conn_` prefixed ULID).
    pub connection_id: String,
    pub user_id: String,
    pub empresa_id: String,
    pub role: Role,
}

impl Session {
    pub fn new(connection_id: String, user_id: String, empresa_id: String, role: Role) -> Self {
        Self {
            connection_id,
            user_id,
            empresa_id,
            role,
        }
    }
}
