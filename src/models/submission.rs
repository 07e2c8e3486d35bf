use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::submission::SubmissionData;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub form_id: String,
    #[sqlx(json)]
    pub data: SubmissionData,
    pub created_at: DateTime<Utc>,
}
