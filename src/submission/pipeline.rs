use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::context::{HandlerContext, RequestInfo};
use crate::handlers::{ErrorRedirect, HandlerStatus};
use crate::models::{Form, Submission};
use crate::state::SharedState;

use super::SubmissionData;

pub struct PipelineResult {
    pub submission_id: Uuid,
    /// False when the form keeps no results.
    pub stored: bool,
    /// First error redirect requested by a handler.
    pub redirect: Option<ErrorRedirect>,
    pub expire_cookies: Vec<String>,
}

/// Saves a submission and runs the form's enabled handlers in order. A
/// failing handler is logged and never stops the ones after it.
pub async fn run(
    state: &SharedState,
    form: &Form,
    request: RequestInfo,
    data: SubmissionData,
) -> Result<PipelineResult, AppError> {
    let submission = Submission {
        id: Uuid::now_v7(),
        form_id: form.id.clone(),
        data,
        created_at: Utc::now(),
    };

    // Handlers see the fields as submitted, not the stored row.
    let stored = !form.settings.results_disabled;
    if stored {
        state.store.create_submission(&submission).await?;
    }

    let handlers = state.store.list_handlers(&form.id).await?;

    let ctx = HandlerContext {
        submission,
        form: form.clone(),
        request,
    };

    let mut redirect = None;
    let mut expire_cookies: Vec<String> = Vec::new();

    for handler in handlers.iter().filter(|h| h.enabled) {
        let Some(module) = state.handlers.get(&handler.handler_type) else {
            tracing::warn!(
                "Handler {} on form {} has unknown type {}",
                handler.id,
                form.id,
                handler.handler_type
            );
            continue;
        };

        match module.post_save(&ctx, &handler.config).await {
            Ok(result) => {
                match result.status {
                    HandlerStatus::Failed => tracing::warn!(
                        "Handler {} ({}) failed for submission {}",
                        handler.id,
                        handler.handler_type,
                        ctx.submission.id
                    ),
                    status => tracing::info!(
                        "Handler {} ({}) finished for submission {}: {status:?}",
                        handler.id,
                        handler.handler_type,
                        ctx.submission.id
                    ),
                }
                if redirect.is_none() {
                    redirect = result.redirect;
                }
                for cookie in result.expire_cookies {
                    if !expire_cookies.contains(&cookie) {
                        expire_cookies.push(cookie);
                    }
                }
            }
            Err(e) => {
                tracing::error!(
                    "Handler {} ({}) errored for submission {}: {e}",
                    handler.id,
                    handler.handler_type,
                    ctx.submission.id
                );
            }
        }
    }

    Ok(PipelineResult {
        submission_id: ctx.submission.id,
        stored,
        redirect,
        expire_cookies,
    })
}
