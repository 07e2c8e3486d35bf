use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::db::Store;
use crate::files::archive::{ArchiveOutcome, Bundle, DocumentArchiver};
use crate::models::NewFile;

use super::context::HandlerContext;
use super::document::{self, DocumentConfig};
use super::{HandlerError, HandlerModule, HandlerResult};

pub const HANDLER_ID: &str = "grant_document";

/// Document archive that is also retained in the retrieval folder, where
/// staff can download it later.
pub struct GrantDocumentHandler {
    archiver: Arc<DocumentArchiver>,
    store: Arc<dyn Store>,
    retrieval_folder: String,
}

impl GrantDocumentHandler {
    pub fn new(archiver: Arc<DocumentArchiver>, store: Arc<dyn Store>, retrieval_folder: &str) -> Self {
        Self {
            archiver,
            store,
            retrieval_folder: retrieval_folder.trim_end_matches('/').to_string(),
        }
    }

    /// Copies the bundle into the retrieval folder and records both copies.
    async fn retain(&self, bundle: &Bundle, ctx: &HandlerContext) -> Result<Vec<String>, HandlerError> {
        let copies = [
            (bundle.zip_uri(), format!("{}.zip", bundle.name)),
            (bundle.flag_uri(), format!("{}.flag", bundle.name)),
        ];

        let mut retained = Vec::with_capacity(copies.len());
        for (source_uri, filename) in copies {
            let target_uri = format!("{}/{filename}", self.retrieval_folder);
            let source = self.realpath(&source_uri)?;
            let target = self.realpath(&target_uri)?;

            tokio::task::spawn_blocking(move || copy_file(source, target))
                .await
                .map_err(|e| HandlerError::from(format!("Copy task failed: {e}")))?
                .map_err(|e| HandlerError::from(format!("Failed to copy {source_uri}: {e}")))?;

            let record = self
                .store
                .create_file(&NewFile::permanent(ctx.request.user, &filename, &target_uri))
                .await?;
            tracing::info!("Retained {target_uri} as file {}", record.fid);
            retained.push(target_uri);
        }

        Ok(retained)
    }

    fn realpath(&self, uri: &str) -> Result<PathBuf, HandlerError> {
        self.archiver
            .wrappers()
            .realpath(uri)
            .ok_or_else(|| HandlerError::from(format!("Invalid file URI: {uri}")))
    }
}

fn copy_file(source: PathBuf, target: PathBuf) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(source, target)?;
    Ok(())
}

#[async_trait]
impl HandlerModule for GrantDocumentHandler {
    fn id(&self) -> &str {
        HANDLER_ID
    }

    fn name(&self) -> &str {
        "Grant document upload"
    }

    fn config_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "zip_directory": { "type": "string", "default": "private://boomi" },
                "zip_filename": { "type": "string", "default": "[webform_submission:values:casekey]" }
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
            document::archive_submission(&self.archiver, self.store.as_ref(), ctx, &config).await?;

        let ArchiveOutcome::Archived(bundle) = outcome else {
            return Ok(HandlerResult::skipped());
        };

        let retained = self.retain(&bundle, ctx).await?;
        Ok(HandlerResult::success(Some(json!({
            "zip": bundle.zip_uri(),
            "flag": bundle.flag_uri(),
            "retained": retained,
        }))))
    }
}
