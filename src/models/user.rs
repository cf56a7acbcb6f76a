use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform role carried in the access token and the user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Agente,
    Cliente,
}

impl Role {
    /// Staff roles may access any conversation within their own empresa.
    pub fn is_agent_tier(self) -> bool {
        !matches!(self, Role::Cliente)
    }
}

/// A platform user, as returned by the user directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usuario {
    pub id: String,
    pub empresa_id: String,
    pub nome: String,
    pub email: String,
    pub role: Role,
    pub ativo: bool,
    pub ultimo_acesso: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_roles_are_agent_tier() {
        assert!(Role::SuperAdmin.is_agent_tier());
        assert!(Role::Admin.is_agent_tier());
        assert!(Role::Agente.is_agent_tier());
        assert!(!Role::Cliente.is_agent_tier());
    }

    #[test]
    fn role_wire_names_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::SuperAdmin).unwrap(),
            "\"super_admin\""
        );
        assert_eq!(serde_json::to_string(&Role::Cliente).unwrap(), "\"cliente\"");
    }
}
