use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::AuthUser;
use crate::db::GroupInput;
use crate::error::AppError;
use crate::models::ContactGroup;
use crate::state::SharedState;

use super::forms::validate_machine_name;

#[derive(Deserialize)]
pub struct UpdateGroup {
    pub label: String,
    #[serde(default)]
    pub post_url: String,
    #[serde(default)]
    pub auth_header: String,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<ContactGroup>>, AppError> {
    auth.require_admin()?;
    Ok(Json(state.store.list_groups().await?))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<GroupInput>,
) -> Result<Json<ContactGroup>, AppError> {
    auth.require_admin()?;
    validate_machine_name(&req.id)?;
    validate_label(&req.label)?;

    if state.store.find_group(&req.id).await?.is_some() {
        return Err(AppError::Conflict(
            "A contact management group with this id already exists".to_string(),
        ));
    }

    let group = state.store.create_group(&req).await.map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => AppError::Conflict(
            "A contact management group with this id already exists".to_string(),
        ),
        _ => AppError::Database(e),
    })?;

    tracing::info!("Contact management group {} created by {}", group.id, auth.user_id);
    Ok(Json(group))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ContactGroup>, AppError> {
    auth.require_admin()?;
    let group = state
        .store
        .find_group(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Contact management group not found".to_string()))?;
    Ok(Json(group))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateGroup>,
) -> Result<Json<ContactGroup>, AppError> {
    auth.require_admin()?;
    validate_label(&req.label)?;

    let input = GroupInput {
        id,
        label: req.label,
        post_url: req.post_url,
        auth_header: req.auth_header,
    };
    let group = state
        .store
        .update_group(&input)
        .await?
        .ok_or_else(|| AppError::NotFound("Contact management group not found".to_string()))?;

    tracing::info!("Contact management group {} updated by {}", group.id, auth.user_id);
    Ok(Json(group))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    auth.require_admin()?;
    if !state.store.delete_group(&id).await? {
        return Err(AppError::NotFound(
            "Contact management group not found".to_string(),
        ));
    }
    tracing::info!("Contact management group {id} deleted by {}", auth.user_id);
    Ok(Json(json!({ "message": "Deleted" })))
}

fn validate_label(label: &str) -> Result<(), AppError> {
    if label.trim().is_empty() {
        return Err(AppError::BadRequest("Label is required".to_string()));
    }
    Ok(())
}
