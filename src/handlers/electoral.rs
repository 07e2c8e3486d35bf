//! Electoral services register uploads. The CSV an authority submits is
//! moved into the drop folder under `<authority>-<timestamp>.csv` with a
//! flag file naming the uploader and the original file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::clock::Clock;
use crate::db::Store;
use crate::files::{self, StreamWrappers};
use crate::submission::SubmissionData;
use crate::submission::normalizer::{is_blank, scalar_text};

use super::context::HandlerContext;
use super::{HandlerError, HandlerModule, HandlerResult};

pub const HANDLER_ID: &str = "electoral_services";

pub const AUTHORITY_FIELD: &str = "authority";
pub const EMAIL_FIELD: &str = "email_address";
pub const FILE_FIELD: &str = "file_upload";

const UPLOAD_ISSUE: &str = "There has been an issue with your upload, please try again";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectoralConfig {
    pub directory: String,
}

impl Default for ElectoralConfig {
    fn default() -> Self {
        Self {
            directory: "private://boomi".to_string(),
        }
    }
}

impl ElectoralConfig {
    pub fn parse(config: &Value) -> Result<Self, HandlerError> {
        let parsed: ElectoralConfig = if config.is_null() {
            ElectoralConfig::default()
        } else {
            serde_json::from_value(config.clone())
                .map_err(|e| HandlerError::from(format!("Invalid electoral services config: {e}")))?
        };
        if !files::is_persistent_uri(&parsed.directory) {
            return Err(HandlerError::from(
                "Directory must begin with either private:// or public://",
            ));
        }
        Ok(Self {
            directory: parsed.directory.trim_end_matches('/').to_string(),
        })
    }
}

/// The fields an upload cannot go without.
#[derive(Debug)]
struct Upload {
    authority: String,
    email: String,
    fid: i64,
}

impl Upload {
    fn from_submission(data: &SubmissionData) -> Option<Self> {
        let field = |name: &str| {
            data.get(name)
                .filter(|value| !is_blank(Some(*value)))
                .map(scalar_text)
        };
        Some(Self {
            authority: field(AUTHORITY_FIELD)?,
            email: field(EMAIL_FIELD)?,
            fid: field(FILE_FIELD)?.trim().parse().ok()?,
        })
    }
}

pub struct ElectoralServicesHandler {
    wrappers: StreamWrappers,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl ElectoralServicesHandler {
    pub fn new(wrappers: StreamWrappers, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            wrappers,
            store,
            clock,
        }
    }

    fn realpath(&self, uri: &str) -> Result<PathBuf, HandlerError> {
        self.wrappers
            .realpath(uri)
            .ok_or_else(|| HandlerError::from(format!("Invalid file URI: {uri}")))
    }
}

fn upload_issue(detail: &str) -> HandlerError {
    HandlerError::from(format!("{UPLOAD_ISSUE} ({detail})."))
}

/// Renames `source` to `target`, copying when the two are on different
/// filesystems.
fn move_file(source: &Path, target: &Path) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if std::fs::rename(source, target).is_ok() {
        return Ok(());
    }
    std::fs::copy(source, target)?;
    std::fs::remove_file(source)
}

#[async_trait]
impl HandlerModule for ElectoralServicesHandler {
    fn id(&self) -> &str {
        HANDLER_ID
    }

    fn name(&self) -> &str {
        "Electoral services upload"
    }

    fn config_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": { "type": "string", "default": "private://boomi", "description": "Must begin with private:// or public://" }
            }
        })
    }

    fn validate_config(&self, config: &Value) -> Result<Value, HandlerError> {
        let config = ElectoralConfig::parse(config)?;
        serde_json::to_value(config).map_err(|e| HandlerError::from(e.to_string()))
    }

    async fn post_save(
        &self,
        ctx: &HandlerContext,
        config: &Value,
    ) -> Result<HandlerResult, HandlerError> {
        let config = ElectoralConfig::parse(config)?;
        let Some(upload) = Upload::from_submission(&ctx.submission.data) else {
            return Err(upload_issue("no file, email or authority"));
        };
        if !files::is_safe_segment(&upload.authority) {
            return Err(HandlerError::from(format!(
                "Authority {:?} cannot be used in a file name",
                upload.authority
            )));
        }

        let name = format!(
            "{}-{}",
            upload.authority,
            self.clock.now().format("%Y%m%d%H%M%S")
        );
        let csv_uri = format!("{}/{name}.csv", config.directory);
        let flag_uri = format!("{}/{name}.FLAG", config.directory);

        let Some(file) = self.store.find_file(upload.fid).await? else {
            tracing::warn!("Electoral upload {} has no file record", upload.fid);
            return Err(upload_issue("no file object"));
        };

        let source = self.realpath(&file.uri)?;
        let target = self.realpath(&csv_uri)?;
        let moved = tokio::task::spawn_blocking(move || move_file(&source, &target))
            .await
            .map_err(|e| HandlerError::from(format!("Move task failed: {e}")))?;
        if let Err(e) = moved {
            tracing::error!("Could not move {} to {csv_uri}: {e}", file.uri);
            return Err(upload_issue("no file object"));
        }
        self.store.relocate_file(file.fid, &csv_uri).await?;

        let flag = format!("{}\n{}", upload.email, file.filename);
        let flag_path = self.realpath(&flag_uri)?;
        let written = tokio::task::spawn_blocking(move || std::fs::write(flag_path, flag))
            .await
            .map_err(|e| HandlerError::from(format!("Flag task failed: {e}")))?;
        if let Err(e) = written {
            tracing::error!("Could not write {flag_uri}: {e}");
            return Err(upload_issue("no flag object"));
        }

        tracing::info!(
            "Electoral upload from {} for submission {} placed at {csv_uri}",
            upload.authority,
            ctx.submission.id
        );
        Ok(HandlerResult::success(Some(json!({
            "file": csv_uri,
            "flag": flag_uri,
        }))))
    }
}
