use serde::{Deserialize, Serialize};

/// A customer of an empresa. Customer-tier callers are matched to their
/// record by `(email, empresa_id)` when authorizing conversation access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cliente {
    pub id: String,
    pub empresa_id: String,
    pub nome: String,
    pub email: String,
}
