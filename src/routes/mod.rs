pub mod citizen_id;
pub mod files;
pub mod forms;
pub mod groups;
pub mod handler_types;
pub mod ingest;

use axum::Router;
use axum::routing::{delete, get, post};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Forms
        .route("/api/v1/forms", get(forms::list).post(forms::create))
        .route(
            "/api/v1/forms/{id}",
            get(forms::get).put(forms::update).delete(forms::delete),
        )
        .route(
            "/api/v1/forms/{id}/handlers",
            get(forms::list_handlers).post(forms::create_handler),
        )
        .route(
            "/api/v1/forms/{id}/handlers/{handler_id}",
            delete(forms::delete_handler),
        )
        .route("/api/v1/forms/{id}/submissions", get(forms::list_submissions))
        .route("/api/v1/forms/{id}/availability", get(forms::availability))
        // Contact management groups
        .route("/api/v1/groups", get(groups::list).post(groups::create))
        .route(
            "/api/v1/groups/{id}",
            get(groups::get).put(groups::update).delete(groups::delete),
        )
        // Handler types
        .route("/api/v1/handler-types", get(handler_types::list))
        // Retained bundles
        .route("/casemanagement/grants/retrieve", get(files::retrieve))
}

pub fn ingest_routes() -> Router<SharedState> {
    Router::new()
        .route("/v1/forms/{id}/submit", post(ingest::submit))
        .route("/v1/files", post(files::upload))
}

pub fn citizen_id_routes() -> Router<SharedState> {
    Router::new()
        .route("/citizenid/verify", get(citizen_id::verify))
        .route("/citizenid-error", get(citizen_id::error))
        .route("/citizenid-error/{form_id}", get(citizen_id::form_error))
}
