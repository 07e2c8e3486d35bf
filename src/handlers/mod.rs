pub mod case_management;
pub mod context;
pub mod document;
pub mod electoral;
pub mod endpoint;
pub mod grant;
pub mod submitter;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use context::HandlerContext;

/// Message shown to the submitter when a handler could not deliver.
pub const SUBMISSION_EXCEPTION_MESSAGE: &str =
    "Unable to process this submission. Please contact the site administrator.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerResult {
    pub status: HandlerStatus,
    pub response: Option<serde_json::Value>,
    /// Where to send the submitter instead of the confirmation page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<ErrorRedirect>,
    /// Cookies the response should clear.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expire_cookies: Vec<String>,
}

impl HandlerResult {
    pub fn success(response: Option<serde_json::Value>) -> Self {
        Self {
            status: HandlerStatus::Success,
            response,
            redirect: None,
            expire_cookies: Vec::new(),
        }
    }

    pub fn skipped() -> Self {
        Self {
            status: HandlerStatus::Skipped,
            response: None,
            redirect: None,
            expire_cookies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HandlerStatus {
    Success,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorRedirect {
    pub url: String,
    pub message: String,
    /// Deliver as a refresh command rather than an HTTP redirect.
    pub ajax: bool,
}

#[derive(Debug)]
pub struct HandlerError {
    pub message: String,
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for HandlerError {
    fn from(s: String) -> Self {
        HandlerError { message: s }
    }
}

impl From<&str> for HandlerError {
    fn from(s: &str) -> Self {
        HandlerError {
            message: s.to_string(),
        }
    }
}

impl From<sqlx::Error> for HandlerError {
    fn from(err: sqlx::Error) -> Self {
        HandlerError {
            message: format!("Database error: {err}"),
        }
    }
}

/// Something that runs after a submission of its form is saved.
#[async_trait]
pub trait HandlerModule: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn config_schema(&self) -> serde_json::Value;
    /// Checks a configuration and returns it with defaults applied.
    fn validate_config(
        &self,
        config: &serde_json::Value,
    ) -> Result<serde_json::Value, HandlerError>;
    async fn post_save(
        &self,
        ctx: &HandlerContext,
        config: &serde_json::Value,
    ) -> Result<HandlerResult, HandlerError>;
}

pub struct HandlerRegistry {
    modules: HashMap<String, Arc<dyn HandlerModule>>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    pub fn register(&mut self, module: Arc<dyn HandlerModule>) {
        self.modules.insert(module.id().to_string(), module);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn HandlerModule>> {
        self.modules.get(id)
    }

    pub fn list(&self) -> Vec<&Arc<dyn HandlerModule>> {
        let mut modules: Vec<_> = self.modules.values().collect();
        modules.sort_by(|a, b| a.id().cmp(b.id()));
        modules
    }
}
