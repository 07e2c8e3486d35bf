use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::Store;
use crate::files;
use crate::files::archive::{ArchiveOutcome, DocumentArchiver};
use crate::submission::token::{self, TokenContext};

use super::context::HandlerContext;
use super::{HandlerError, HandlerModule, HandlerResult};

pub const HANDLER_ID: &str = "document";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub zip_directory: String,
    pub zip_filename: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            zip_directory: "private://boomi".to_string(),
            zip_filename: "[webform_submission:values:casekey]".to_string(),
        }
    }
}

impl DocumentConfig {
    pub fn parse(config: &serde_json::Value) -> Result<Self, HandlerError> {
        let parsed: DocumentConfig = if config.is_null() {
            DocumentConfig::default()
        } else {
            serde_json::from_value(config.clone())
                .map_err(|e| HandlerError::from(format!("Invalid document config: {e}")))?
        };
        parsed.normalized()
    }

    /// Rejects directories outside the persistent schemes, drops a trailing
    /// slash from the directory and a trailing `.zip` from the file name.
    pub fn normalized(self) -> Result<Self, HandlerError> {
        if !files::is_persistent_uri(&self.zip_directory) {
            return Err(HandlerError::from(
                "Zip directory must begin with either private:// or public://",
            ));
        }
        let zip_directory = self.zip_directory.trim_end_matches('/').to_string();
        let zip_filename = self
            .zip_filename
            .strip_suffix(".zip")
            .unwrap_or(&self.zip_filename)
            .to_string();
        Ok(Self {
            zip_directory,
            zip_filename,
        })
    }
}

/// Zips the documents of each submission for the file watcher.
pub struct DocumentHandler {
    archiver: Arc<DocumentArchiver>,
    store: Arc<dyn Store>,
}

impl DocumentHandler {
    pub fn new(archiver: Arc<DocumentArchiver>, store: Arc<dyn Store>) -> Self {
        Self { archiver, store }
    }
}

/// Renders the configured names for this submission and archives its
/// documents.
pub async fn archive_submission(
    archiver: &DocumentArchiver,
    store: &dyn Store,
    ctx: &HandlerContext,
    config: &DocumentConfig,
) -> Result<ArchiveOutcome, HandlerError> {
    let tokens = TokenContext {
        submission_id: ctx.submission.id,
        form_id: &ctx.form.id,
        data: &ctx.submission.data,
    };
    let directory = token::render(&config.zip_directory, &tokens);
    let mut name = token::render(&config.zip_filename, &tokens);
    if name.is_empty() {
        name = ctx.submission.id.to_string();
    }

    archiver
        .archive(store, &ctx.submission.data, &ctx.form.elements, &directory, &name)
        .await
        .map_err(|e| HandlerError::from(format!("Document archive failed: {e}")))
}

#[async_trait]
impl HandlerModule for DocumentHandler {
    fn id(&self) -> &str {
        HANDLER_ID
    }

    fn name(&self) -> &str {
        "Case management document upload"
    }

    fn config_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "zip_directory": { "type": "string", "default": "private://boomi", "description": "Must begin with private:// or public://" },
                "zip_filename": { "type": "string", "default": "[webform_submission:values:casekey]", "description": "Archive name without .zip, tokens allowed" }
            }
        })
    }

    fn validate_config(
        &self,
        config: &serde_json::Value,
    ) -> Result<serde_json::Value, HandlerError> {
        let config = DocumentConfig::parse(config)?;
        serde_json::to_value(config).map_err(|e| HandlerError::from(e.to_string()))
    }

    async fn post_save(
        &self,
        ctx: &HandlerContext,
        config: &serde_json::Value,
    ) -> Result<HandlerResult, HandlerError> {
        let config = DocumentConfig::parse(config)?;
        let outcome =
            archive_submission(&self.archiver, self.store.as_ref(), ctx, &config).await?;

        Ok(match outcome {
            ArchiveOutcome::Archived(bundle) => HandlerResult::success(Some(json!({
                "zip": bundle.zip_uri(),
                "flag": bundle.flag_uri(),
            }))),
            ArchiveOutcome::Skipped => HandlerResult::skipped(),
        })
    }
}
