//! Wire-format events exchanged over the gateway WebSocket.
//!
//! Frames are JSON objects of the form `{"event": "<name>", "data": {...}}`.
//! Inbound names are a closed set: anything unrecognized fails to parse and
//! is answered with an `error` event.

use serde::{Deserialize, Serialize};

use crate::models::message::{Mensagem, TipoMensagem};

// ---------------------------------------------------------------------------
// Client → Gateway
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinChat(ChatRef),
    LeaveChat(ChatRef),
    SendMessage(SendMessagePayload),
    Typing(ChatRef),
    StopTyping(ChatRef),
    MessageRead(MessageRef),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRef {
    pub chat_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub chat_id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub tipo: TipoMensagem,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub reply_to_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub message_id: String,
}

// ---------------------------------------------------------------------------
// Gateway → Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    UserOnline(PresencePayload),
    UserOffline(PresencePayload),
    /// Full persisted record, delivered to conversation-channel members.
    Message(Mensagem),
    /// Lightweight notice for dashboard/list views on the empresa channel.
    NewMessage(NewMessageNotice),
    Typing(TypingNotice),
    StopTyping(TypingNotice),
    MessageRead(ReadNotice),
    Error(ErrorPayload),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresencePayload {
    pub user_id: String,
    pub empresa_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessageNotice {
    pub conversa_id: String,
    pub message: Mensagem,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice {
    pub user_id: String,
    pub conversa_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadNotice {
    pub message_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorPayload {
            message: message.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_chat() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"join-chat","data":{"chatId":"conv1"}}"#).unwrap();
        match event {
            ClientEvent::JoinChat(p) => assert_eq!(p.chat_id, "conv1"),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn parses_send_message_with_attachment() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"event":"send-message","data":{
                "chatId":"conv1",
                "content":"segue o anexo",
                "type":"imagem",
                "fileUrl":"https://cdn.example/a.png",
                "fileSize":2048,
                "mimeType":"image/png"
            }}"#,
        )
        .unwrap();
        match event {
            ClientEvent::SendMessage(p) => {
                assert_eq!(p.chat_id, "conv1");
                assert_eq!(p.tipo, TipoMensagem::Imagem);
                assert_eq!(p.file_size, Some(2048));
                assert!(p.reply_to_id.is_none());
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn parses_message_read() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"message-read","data":{"messageId":"msg_1"}}"#)
                .unwrap();
        assert!(matches!(event, ClientEvent::MessageRead(p) if p.message_id == "msg_1"));
    }

    #[test]
    fn rejects_unknown_event_name() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"event":"shutdown","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn server_event_names_are_kebab_case() {
        let json = serde_json::to_value(ServerEvent::error("negado")).unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["data"]["message"], "negado");

        let json = serde_json::to_value(ServerEvent::UserOnline(PresencePayload {
            user_id: "u1".to_string(),
            empresa_id: "emp1".to_string(),
        }))
        .unwrap();
        assert_eq!(json["event"], "user-online");
        assert_eq!(json["data"]["userId"], "u1");
        assert_eq!(json["data"]["empresaId"], "emp1");
    }
}
