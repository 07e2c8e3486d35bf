use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Handler {
    pub id: Uuid,
    pub form_id: String,
    pub handler_type: String,
    pub label: String,
    pub config: serde_json::Value,
    pub position: i32,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}
