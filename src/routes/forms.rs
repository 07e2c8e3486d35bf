use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::availability;
use crate::db::{FormInput, HandlerInput};
use crate::error::AppError;
use crate::models::{Form, FormSettings, Handler, Submission};
use crate::state::SharedState;
use crate::submission::schema::FormSchema;

#[derive(Deserialize)]
pub struct UpdateForm {
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub elements: FormSchema,
    #[serde(default)]
    pub settings: FormSettings,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Form>>, AppError> {
    auth.require_admin()?;
    Ok(Json(state.store.list_forms().await?))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<FormInput>,
) -> Result<Json<Form>, AppError> {
    auth.require_admin()?;
    validate_machine_name(&req.id)?;
    validate_title(&req.title)?;

    if state.store.find_form(&req.id).await?.is_some() {
        return Err(AppError::Conflict(
            "A form with this id already exists".to_string(),
        ));
    }

    let form = state.store.create_form(&req).await.map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("A form with this id already exists".to_string())
        }
        _ => AppError::Database(e),
    })?;

    tracing::info!("Form {} created by {}", form.id, auth.user_id);
    Ok(Json(form))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Form>, AppError> {
    auth.require_admin()?;
    Ok(Json(find_form(&state, &id).await?))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateForm>,
) -> Result<Json<Form>, AppError> {
    auth.require_admin()?;
    validate_title(&req.title)?;

    let input = FormInput {
        id,
        title: req.title,
        category: req.category,
        elements: req.elements,
        settings: req.settings,
    };
    let form = state
        .store
        .update_form(&input)
        .await?
        .ok_or_else(|| AppError::NotFound("Form not found".to_string()))?;

    tracing::info!("Form {} updated by {}", form.id, auth.user_id);
    Ok(Json(form))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    auth.require_admin()?;
    if !state.store.delete_form(&id).await? {
        return Err(AppError::NotFound("Form not found".to_string()));
    }
    tracing::info!("Form {id} deleted by {}", auth.user_id);
    Ok(Json(json!({ "message": "Deleted" })))
}

pub async fn list_handlers(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Handler>>, AppError> {
    auth.require_admin()?;
    find_form(&state, &id).await?;
    Ok(Json(state.store.list_handlers(&id).await?))
}

pub async fn create_handler(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(mut req): Json<HandlerInput>,
) -> Result<Json<Handler>, AppError> {
    auth.require_admin()?;
    find_form(&state, &id).await?;

    let module = state.handlers.get(&req.handler_type).ok_or_else(|| {
        AppError::BadRequest(format!("Unknown handler type: {}", req.handler_type))
    })?;
    req.config = module
        .validate_config(&req.config)
        .map_err(|e| AppError::BadRequest(e.message))?;
    if req.label.is_empty() {
        req.label = module.name().to_string();
    }

    let handler = state.store.create_handler(&id, &req).await?;
    tracing::info!(
        "Handler {} ({}) added to form {id} by {}",
        handler.id,
        handler.handler_type,
        auth.user_id
    );
    Ok(Json(handler))
}

pub async fn delete_handler(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((id, handler_id)): Path<(String, Uuid)>,
) -> Result<Json<Value>, AppError> {
    auth.require_admin()?;
    if !state.store.delete_handler(&id, handler_id).await? {
        return Err(AppError::NotFound("Handler not found".to_string()));
    }
    Ok(Json(json!({ "message": "Deleted" })))
}

pub async fn list_submissions(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Submission>>, AppError> {
    auth.require_admin()?;
    find_form(&state, &id).await?;
    Ok(Json(state.store.list_submissions(&id).await?))
}

pub async fn availability(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    find_form(&state, &id).await?;
    let endpoint = availability::endpoint_for_form(
        state.store.as_ref(),
        &id,
        &state.config.case_management,
    )
    .await?;
    let available = availability::check(&state.http, &endpoint).await;
    Ok(Json(json!({ "available": available })))
}

async fn find_form(state: &SharedState, id: &str) -> Result<Form, AppError> {
    state
        .store
        .find_form(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Form not found".to_string()))
}

pub(crate) fn validate_machine_name(id: &str) -> Result<(), AppError> {
    if id.is_empty() || id.len() > 128 {
        return Err(AppError::BadRequest(
            "Id must be between 1 and 128 characters".to_string(),
        ));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(AppError::BadRequest(
            "Id must contain only lowercase letters, numbers, and underscores".to_string(),
        ));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    Ok(())
}
