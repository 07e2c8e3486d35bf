use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named case-management endpoint shared by several forms.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ContactGroup {
    pub id: String,
    pub label: String,
    pub post_url: String,
    pub auth_header: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
