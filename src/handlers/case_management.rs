use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::clock::Clock;
use crate::config::CaseManagementDefaults;
use crate::db::Store;
use crate::submission::normalizer::{self, CITIZEN_ID_FIELD};

use super::context::HandlerContext;
use super::endpoint::{self, EndpointConfig};
use super::submitter::{CaseSubmitter, SubmitError};
use super::{
    ErrorRedirect, HandlerError, HandlerModule, HandlerResult, HandlerStatus,
    SUBMISSION_EXCEPTION_MESSAGE,
};

pub const HANDLER_ID: &str = "case_management";

/// Submissions are only ever new here; there are no drafts.
const SUBMISSION_STATE: &str = "completed";

/// Posts each submission to the case-management backend.
pub struct CaseManagementHandler {
    submitter: CaseSubmitter,
    store: Arc<dyn Store>,
    defaults: CaseManagementDefaults,
    base_url: String,
    clock: Arc<dyn Clock>,
}

impl CaseManagementHandler {
    pub fn new(
        client: reqwest::Client,
        store: Arc<dyn Store>,
        defaults: CaseManagementDefaults,
        base_url: &str,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            submitter: CaseSubmitter::new(client),
            store,
            defaults,
            base_url: base_url.trim_end_matches('/').to_string(),
            clock,
        }
    }

    fn handle_error(&self, ctx: &HandlerContext, url: &str, error: &SubmitError) -> HandlerResult {
        tracing::error!(
            "{} webform case management json post ({SUBMISSION_STATE}) to {url} failed. {}",
            ctx.form.title,
            error.message
        );

        HandlerResult {
            status: HandlerStatus::Failed,
            response: Some(json!({ "status_code": error.status })),
            redirect: Some(error_redirect(&self.base_url, &ctx.form.id, ctx.request.is_ajax)),
            expire_cookies: Vec::new(),
        }
    }
}

pub fn error_redirect(base_url: &str, form_id: &str, ajax: bool) -> ErrorRedirect {
    ErrorRedirect {
        url: format!("{base_url}/citizenid-error/{form_id}"),
        message: SUBMISSION_EXCEPTION_MESSAGE.to_string(),
        ajax,
    }
}

pub fn parse_config(config: &serde_json::Value) -> Result<EndpointConfig, HandlerError> {
    if config.is_null() {
        return Ok(EndpointConfig::default());
    }
    serde_json::from_value(config.clone())
        .map_err(|e| HandlerError::from(format!("Invalid case management config: {e}")))
}

#[async_trait]
impl HandlerModule for CaseManagementHandler {
    fn id(&self) -> &str {
        HANDLER_ID
    }

    fn name(&self) -> &str {
        "Case management post"
    }

    fn config_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "contact_management_group": { "type": "string", "description": "Contact management group id" },
                "enable_override": { "type": "boolean", "default": false },
                "override_case_management_post_url": { "type": "string", "description": "The URL to post form responses into Contact management." },
                "override_case_management_auth_header": { "type": "string", "description": "The header to add to authorize posts to Contact management." }
            }
        })
    }

    fn validate_config(
        &self,
        config: &serde_json::Value,
    ) -> Result<serde_json::Value, HandlerError> {
        let config = parse_config(config)?;
        serde_json::to_value(config).map_err(|e| HandlerError::from(e.to_string()))
    }

    async fn post_save(
        &self,
        ctx: &HandlerContext,
        config: &serde_json::Value,
    ) -> Result<HandlerResult, HandlerError> {
        let config = parse_config(config)?;
        let payload = normalizer::prepare(&ctx.form, &ctx.submission.data, self.clock.as_ref());
        let endpoint =
            endpoint::resolve_with_store(self.store.as_ref(), &config, &self.defaults).await?;

        match self.submitter.submit(&endpoint, &payload).await {
            Ok(status) => Ok(HandlerResult {
                status: HandlerStatus::Success,
                response: Some(json!({ "status_code": status })),
                redirect: None,
                expire_cookies: vec![CITIZEN_ID_FIELD.to_string()],
            }),
            Err(e) => Ok(self.handle_error(ctx, &endpoint.post_url, &e)),
        }
    }
}
