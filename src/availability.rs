//! Reports whether the case-management backend behind a form answers.

use reqwest::header::AUTHORIZATION;

use crate::config::CaseManagementDefaults;
use crate::db::Store;
use crate::handlers::case_management::{self, HANDLER_ID};
use crate::handlers::endpoint::{self, Endpoint};

/// Endpoint of the form's last enabled case management handler, or the
/// defaults when it has none.
pub async fn endpoint_for_form(
    store: &dyn Store,
    form_id: &str,
    defaults: &CaseManagementDefaults,
) -> Result<Endpoint, sqlx::Error> {
    let mut resolved = Endpoint {
        post_url: defaults.post_url.clone(),
        auth_header: defaults.auth_header.clone(),
    };

    let handlers = store.list_handlers(form_id).await?;
    for handler in handlers
        .iter()
        .filter(|h| h.enabled && h.handler_type == HANDLER_ID)
    {
        match case_management::parse_config(&handler.config) {
            Ok(config) => {
                resolved = endpoint::resolve_with_store(store, &config, defaults).await?;
            }
            Err(e) => tracing::warn!("Skipping handler {}: {e}", handler.id),
        }
    }

    Ok(resolved)
}

/// GETs the endpoint with its auth header. Only a 2xx counts as available.
pub async fn check(client: &reqwest::Client, endpoint: &Endpoint) -> bool {
    let response = client
        .get(&endpoint.post_url)
        .header(AUTHORIZATION, endpoint.auth_header.as_str())
        .send()
        .await;

    match response {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            tracing::warn!("Case management availability check failed: {e}");
            false
        }
    }
}
