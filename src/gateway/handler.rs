//! Connection admission and per-event handling.
//!
//! Every handler is individually guarded: denials and store failures become
//! an `error` event to the originating connection (or a silent drop for
//! typing) and never cross the connection boundary as a panic.

use std::collections::HashSet;

use crate::auth::tokens;
use crate::models::message::{NewMensagem, Remetente};
use crate::models::user::Role;
use crate::store::with_deadline;
use crate::AppState;

use super::authz;
use super::events::{
    ChatRef, ClientEvent, MessageRef, NewMessageNotice, ReadNotice, SendMessagePayload,
    ServerEvent, TypingNotice,
};
use super::fanout::Scope;
use super::session::Session;

/// Identity resolved at admission, before a connection id exists.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: String,
    pub empresa_id: String,
    pub role: Role,
}

/// Admit a connection: verify the bearer token, then cross-check the user
/// directory. Every failure maps to the same outcome for the peer — the
/// connection never opens.
pub async fn authenticate(state: &AppState, token: &str) -> Result<Principal, &'static str> {
    let claims = tokens::verify_access_token(token, &state.config.jwt_secret)?;

    let user = with_deadline(
        state.config.store_timeout,
        state.users.get_user(&claims.sub),
    )
    .await
    .map_err(|_| "Directory lookup failed")?
    .ok_or("User not found")?;

    if !user.ativo {
        return Err("User is inactive");
    }

    // The directory is authoritative; a stale or forged empresa claim is
    // rejected even when the signature checks out.
    if user.empresa_id != claims.empresa_id {
        return Err("Empresa mismatch");
    }

    Ok(Principal {
        user_id: user.id,
        empresa_id: user.empresa_id,
        role: claims.role,
    })
}

/// Process one inbound event. Broadcasts are published to the fanout hub;
/// the returned event, if any, goes to the originating connection only.
pub async fn handle_event(
    state: &AppState,
    session: &Session,
    joined: &mut HashSet<String>,
    event: ClientEvent,
) -> Option<ServerEvent> {
    match event {
        ClientEvent::JoinChat(payload) => handle_join(state, session, joined, payload).await,
        ClientEvent::LeaveChat(payload) => {
            // No-op when not joined; no authorization needed to leave.
            joined.remove(&payload.chat_id);
            None
        }
        ClientEvent::SendMessage(payload) => handle_send_message(state, session, payload).await,
        ClientEvent::Typing(payload) => handle_typing(state, session, payload, true).await,
        ClientEvent::StopTyping(payload) => handle_typing(state, session, payload, false).await,
        ClientEvent::MessageRead(payload) => handle_message_read(state, session, payload).await,
    }
}

async fn handle_join(
    state: &AppState,
    session: &Session,
    joined: &mut HashSet<String>,
    payload: ChatRef,
) -> Option<ServerEvent> {
    match authz::authorize_conversation(state, &payload.chat_id, session).await {
        Ok(_) => {
            // Idempotent: re-joining an already joined channel is fine.
            joined.insert(payload.chat_id);
            None
        }
        Err(message) => Some(ServerEvent::error(message)),
    }
}

async fn handle_send_message(
    state: &AppState,
    session: &Session,
    payload: SendMessagePayload,
) -> Option<ServerEvent> {
    let conversa = match authz::authorize_conversation(state, &payload.chat_id, session).await {
        Ok(conversa) => conversa,
        Err(message) => return Some(ServerEvent::error(message)),
    };

    let agent_tier = session.role.is_agent_tier();
    let new = NewMensagem {
        conversa_id: payload.chat_id,
        remetente: if agent_tier {
            Remetente::Agente
        } else {
            Remetente::Cliente
        },
        agente_id: agent_tier.then(|| session.user_id.clone()),
        conteudo: payload.content,
        tipo: payload.tipo,
        file_url: payload.file_url,
        file_size: payload.file_size,
        mime_type: payload.mime_type,
        reply_to_id: payload.reply_to_id,
    };

    let mensagem = match with_deadline(state.config.store_timeout, state.messages.create_message(new))
        .await
    {
        Ok(mensagem) => mensagem,
        Err(e) => {
            tracing::warn!(user_id = %session.user_id, error = %e, "message create failed");
            return Some(ServerEvent::error(e.to_string()));
        }
    };

    // Two independent broadcasts: the full record to members of the
    // conversation channel, and a lightweight notice to the empresa channel
    // so list views refetch without receiving message bodies.
    state.broadcast.publish(
        Scope::Conversa {
            chat_id: mensagem.conversa_id.clone(),
            except_connection: None,
        },
        ServerEvent::Message(mensagem.clone()),
    );
    state.broadcast.publish(
        Scope::Empresa {
            empresa_id: conversa.empresa_id,
            except_connection: None,
        },
        ServerEvent::NewMessage(NewMessageNotice {
            conversa_id: mensagem.conversa_id.clone(),
            message: mensagem,
        }),
    );
    None
}

async fn handle_typing(
    state: &AppState,
    session: &Session,
    payload: ChatRef,
    start: bool,
) -> Option<ServerEvent> {
    // Typing indicators are low-value: unauthorized ones are dropped without
    // an error reply.
    if authz::authorize_conversation(state, &payload.chat_id, session)
        .await
        .is_err()
    {
        return None;
    }

    let notice = TypingNotice {
        user_id: session.user_id.clone(),
        conversa_id: payload.chat_id.clone(),
    };
    state.broadcast.publish(
        Scope::Conversa {
            chat_id: payload.chat_id,
            except_connection: Some(session.connection_id.clone()),
        },
        if start {
            ServerEvent::Typing(notice)
        } else {
            ServerEvent::StopTyping(notice)
        },
    );
    None
}

async fn handle_message_read(
    state: &AppState,
    session: &Session,
    payload: MessageRef,
) -> Option<ServerEvent> {
    // Authorization is pushed into the store here: the lookup is scoped by
    // the caller's empresa, so a foreign message is simply not found.
    let mensagem = match with_deadline(
        state.config.store_timeout,
        state.messages.mark_read(&payload.message_id, &session.empresa_id),
    )
    .await
    {
        Ok(mensagem) => mensagem,
        Err(e) => return Some(ServerEvent::error(e.to_string())),
    };

    state.broadcast.publish(
        Scope::Empresa {
            empresa_id: session.empresa_id.clone(),
            except_connection: Some(session.connection_id.clone()),
        },
        ServerEvent::MessageRead(ReadNotice {
            message_id: mensagem.id,
            user_id: session.user_id.clone(),
        }),
    );
    None
}
