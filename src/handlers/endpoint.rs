//! Picks the URL and authorization header a submission is posted with.

use serde::{Deserialize, Serialize};

use crate::config::CaseManagementDefaults;
use crate::db::Store;
use crate::models::ContactGroup;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub post_url: String,
    pub auth_header: String,
}

/// Endpoint settings of one case management handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub contact_management_group: Option<String>,
    pub enable_override: bool,
    pub override_case_management_post_url: String,
    pub override_case_management_auth_header: String,
}

impl EndpointConfig {
    pub fn group_id(&self) -> Option<&str> {
        self.contact_management_group
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}

/// Override if enabled, else a non-empty group value, else the default.
/// URL and header are resolved independently.
pub fn resolve(
    config: &EndpointConfig,
    group: Option<&ContactGroup>,
    defaults: &CaseManagementDefaults,
) -> Endpoint {
    Endpoint {
        post_url: pick(
            config.enable_override,
            &config.override_case_management_post_url,
            group.map(|g| g.post_url.as_str()),
            &defaults.post_url,
        ),
        auth_header: pick(
            config.enable_override,
            &config.override_case_management_auth_header,
            group.map(|g| g.auth_header.as_str()),
            &defaults.auth_header,
        ),
    }
}

fn pick(override_enabled: bool, override_value: &str, group: Option<&str>, default: &str) -> String {
    if override_enabled {
        return override_value.to_string();
    }
    match group {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => default.to_string(),
    }
}

/// Loads the configured group, then resolves. Unknown groups count as none.
pub async fn resolve_with_store(
    store: &dyn Store,
    config: &EndpointConfig,
    defaults: &CaseManagementDefaults,
) -> Result<Endpoint, sqlx::Error> {
    let group = match config.group_id() {
        Some(id) => {
            let group = store.find_group(id).await?;
            if group.is_none() {
                tracing::warn!("Contact management group {id} not found, using defaults");
            }
            group
        }
        None => None,
    };
    Ok(resolve(config, group.as_ref(), defaults))
}
