use serde::{Deserialize, Serialize};

/// Conversation status, owned by the platform API. The gateway reads it for
/// context only and never transitions it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversaStatus {
    Aberta,
    EmAtendimento,
    Fechada,
}

/// A support conversation, read-only from the gateway's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversa {
    pub id: String,
    pub empresa_id: String,
    pub cliente_id: String,
    pub agente_id: Option<String>,
    pub status: ConversaStatus,
}
