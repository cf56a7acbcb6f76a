use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the conversation authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remetente {
    Cliente,
    Agente,
}

/// Message content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipoMensagem {
    Texto,
    Imagem,
    Arquivo,
    Audio,
}

/// A persisted conversation message, as returned by the message store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mensagem {
    pub id: String,
    pub conversa_id: String,
    pub remetente: Remetente,
    /// Set only when the sender is agent-tier.
    pub agente_id: Option<String>,
    pub conteudo: Option<String>,
    pub tipo: TipoMensagem,
    pub file_url: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub reply_to_id: Option<String>,
    pub lida: bool,
    pub criada_em: DateTime<Utc>,
}

/// Fields supplied by the gateway when requesting message creation. The
/// store assigns the id, timestamp, and read flag.
#[derive(Debug, Clone)]
pub struct NewMensagem {
    pub conversa_id: String,
    pub remetente: Remetente,
    pub agente_id: Option<String>,
    pub conteudo: Option<String>,
    pub tipo: TipoMensagem,
    pub file_url: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub reply_to_id: Option<String>,
}
