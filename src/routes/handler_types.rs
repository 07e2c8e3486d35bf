use axum::Json;
use axum::extract::State;
use serde_json::json;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::SharedState;

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;
    let handler_types: Vec<serde_json::Value> = state
        .handlers
        .list()
        .iter()
        .map(|m| {
            json!({
                "id": m.id(),
                "name": m.name(),
                "config_schema": m.config_schema(),
            })
        })
        .collect();

    Ok(Json(json!({ "handler_types": handler_types })))
}
