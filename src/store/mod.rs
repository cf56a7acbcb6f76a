//! Trait seams over the platform's persistence layer.
//!
//! The gateway never talks to the database directly; the platform API owns
//! the schema. These traits are backed by an in-memory implementation for
//! tests and local runs, and by the platform's Postgres services in
//! production.

pub mod memory;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::conversation::Conversa;
use crate::models::customer::Cliente;
use crate::models::message::{Mensagem, NewMensagem};
use crate::models::user::Usuario;

/// Failure from a directory/store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced record does not exist (or is outside the caller's empresa).
    NotFound(&'static str),
    /// The backing store failed or returned an unexpected result.
    Backend(String),
    /// The call did not complete within the configured deadline.
    Timeout,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(what) => write!(f, "{what} não encontrada"),
            StoreError::Backend(msg) => write!(f, "{msg}"),
            StoreError::Timeout => write!(f, "tempo de resposta do armazenamento esgotado"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Run a store call under the configured deadline. A timeout takes the same
/// failure path as a backend error.
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout),
    }
}

/// Lookup of platform users and customers.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<Usuario>, StoreError>;

    /// Best-effort last-seen update; callers ignore failures.
    async fn touch_last_seen(&self, user_id: &str) -> Result<(), StoreError>;

    async fn get_customer_by_email(
        &self,
        email: &str,
        empresa_id: &str,
    ) -> Result<Option<Cliente>, StoreError>;
}

/// Read-only access to conversations, for authorization.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn get_conversation(&self, conversa_id: &str) -> Result<Option<Conversa>, StoreError>;
}

/// Message persistence.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new message and return the stored record.
    async fn create_message(&self, new: NewMensagem) -> Result<Mensagem, StoreError>;

    /// Mark a message as read. The lookup is scoped by empresa: a message
    /// whose conversation belongs to another empresa is `NotFound`.
    async fn mark_read(&self, message_id: &str, empresa_id: &str) -> Result<Mensagem, StoreError>;
}
