//! In-memory store implementation for tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::id;
use crate::models::conversation::Conversa;
use crate::models::customer::Cliente;
use crate::models::message::{Mensagem, NewMensagem};
use crate::models::user::Usuario;

use super::{ConversationStore, MessageStore, StoreError, UserDirectory};

#[derive(Default)]
pub struct MemoryStore {
    usuarios: Mutex<HashMap<String, Usuario>>,
    clientes: Mutex<HashMap<String, Cliente>>,
    conversas: Mutex<HashMap<String, Conversa>>,
    mensagens: Mutex<HashMap<String, Mensagem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: Usuario) {
        self.usuarios.lock().insert(user.id.clone(), user);
    }

    pub fn insert_customer(&self, cliente: Cliente) {
        self.clientes.lock().insert(cliente.id.clone(), cliente);
    }

    pub fn insert_conversation(&self, conversa: Conversa) {
        self.conversas.lock().insert(conversa.id.clone(), conversa);
    }

    pub fn insert_message(&self, mensagem: Mensagem) {
        self.mensagens.lock().insert(mensagem.id.clone(), mensagem);
    }

    pub fn get_message(&self, id: &str) -> Option<Mensagem> {
        self.mensagens.lock().get(id).cloned()
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<Usuario>, StoreError> {
        Ok(self.usuarios.lock().get(user_id).cloned())
    }

    async fn touch_last_seen(&self, user_id: &str) -> Result<(), StoreError> {
        match self.usuarios.lock().get_mut(user_id) {
            Some(user) => {
                user.ultimo_acesso = Some(Utc::now());
                Ok(())
            }
            None => Err(StoreError::NotFound("usuário")),
        }
    }

    async fn get_customer_by_email(
        &self,
        email: &str,
        empresa_id: &str,
    ) -> Result<Option<Cliente>, StoreError> {
        Ok(self
            .clientes
            .lock()
            .values()
            .find(|c| c.email == email && c.empresa_id == empresa_id)
            .cloned())
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn get_conversation(&self, conversa_id: &str) -> Result<Option<Conversa>, StoreError> {
        Ok(self.conversas.lock().get(conversa_id).cloned())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create_message(&self, new: NewMensagem) -> Result<Mensagem, StoreError> {
        if self.conversas.lock().get(&new.conversa_id).is_none() {
            return Err(StoreError::NotFound("conversa"));
        }

        let mensagem = Mensagem {
            id: id::prefixed_ulid(id::prefix::MESSAGE),
            conversa_id: new.conversa_id,
            remetente: new.remetente,
            agente_id: new.agente_id,
            conteudo: new.conteudo,
            tipo: new.tipo,
            file_url: new.file_url,
            file_size: new.file_size,
            mime_type: new.mime_type,
            reply_to_id: new.reply_to_id,
            lida: false,
            criada_em: Utc::now(),
        };
        self.mensagens
            .lock()
            .insert(mensagem.id.clone(), mensagem.clone());
        Ok(mensagem)
    }

    async fn mark_read(&self, message_id: &str, empresa_id: &str) -> Result<Mensagem, StoreError> {
        let mut mensagens = self.mensagens.lock();
        let mensagem = mensagens
            .get_mut(message_id)
            .ok_or(StoreError::NotFound("mensagem"))?;

        // Empresa scoping happens here, not in the gateway: the owning
        // conversation must belong to the caller's empresa.
        let owns = self
            .conversas
            .lock()
            .get(&mensagem.conversa_id)
            .map(|c| c.empresa_id == empresa_id)
            .unwrap_or(false);
        if !owns {
            return Err(StoreError::NotFound("mensagem"));
        }

        mensagem.lida = true;
        Ok(mensagem.clone())
    }
}
