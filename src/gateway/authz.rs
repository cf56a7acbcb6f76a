//! Conversation access authorization.
//!
//! Re-derived from current store data on every event — there is no cache of
//! a prior "yes", so a revoked membership or role change is picked up on the
//! next event rather than at reconnect. Every event pays one conversation
//! lookup (plus a user/customer lookup for customer-tier callers).

use crate::models::conversation::Conversa;
use crate::store::with_deadline;
use crate::AppState;

use super::session::Session;

pub const ACCESS_DENIED: &str = "Acesso negado a esta conversa";
pub const CONVERSATION_NOT_FOUND: &str = "Conversa não encontrada";

/// Check whether the session's user may access the conversation.
///
/// Rules, in order:
/// 1. the conversation must exist;
/// 2. it must belong to the caller's empresa (tenant isolation);
/// 3. agent-tier callers may access any conversation in their empresa;
/// 4. customer-tier callers must match a Cliente record by
///    `(email, empresa)` whose id equals the conversation's `cliente_id`.
///
/// Returns the conversation on success so handlers don't re-fetch it.
pub async fn authorize_conversation(
    state: &AppState,
    chat_id: &str,
    session: &Session,
) -> Result<Conversa, String> {
    let deadline = state.config.store_timeout;

    let conversa = with_deadline(deadline, state.conversations.get_conversation(chat_id))
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| CONVERSATION_NOT_FOUND.to_string())?;

    if conversa.empresa_id != session.empresa_id {
        return Err(ACCESS_DENIED.to_string());
    }

    // Role and email come from the directory, not the cached principal, so a
    // demotion takes effect on the next event.
    let user = with_deadline(deadline, state.users.get_user(&session.user_id))
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| ACCESS_DENIED.to_string())?;

    if user.role.is_agent_tier() {
        return Ok(conversa);
    }

    let cliente = with_deadline(
        deadline,
        state
            .users
            .get_customer_by_email(&user.email, &session.empresa_id),
    )
    .await
    .map_err(|e| e.to_string())?;

    match cliente {
        Some(c) if c.id == conversa.cliente_id => Ok(conversa),
        _ => Err(ACCESS_DENIED.to_string()),
    }
}
