use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::submission::schema::FormSchema;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Form {
    pub id: String,
    pub title: String,
    pub category: Option<String>,
    #[sqlx(json)]
    pub elements: FormSchema,
    #[sqlx(json)]
    pub settings: FormSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FormSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_url: Option<String>,
    #[serde(default)]
    pub results_disabled: bool,
}

impl Form {
    /// Canonical path the form is served from, e.g. `/form/test-webform`.
    pub fn path(&self) -> String {
        format!("/form/{}", self.id.replace('_', "-"))
    }
}
