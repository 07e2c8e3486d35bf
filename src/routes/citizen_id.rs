use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use crate::citizen_id::{self, COOKIE_NAME, ERROR_PATH};
use crate::error::AppError;
use crate::handlers::submitter::html_escape;
use crate::state::SharedState;

/// Accepts a Citizen ID token and sends the user on to the form they came
/// for. The token itself is never checked here.
pub async fn verify(
    State(state): State<SharedState>,
    Query(params): Query<Vec<(String, String)>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let query_token = params
        .iter()
        .find(|(k, _)| k == COOKIE_NAME)
        .map(|(_, v)| v.as_str());
    let destination = params
        .iter()
        .find(|(k, _)| k == "destination")
        .map(|(_, v)| v.as_str());

    let token = citizen_id::token_from(query_token, &jar);
    let path = citizen_id::destination_path(destination);
    let form = citizen_id::form_at(state.store.as_ref(), &path).await?;

    let (Some(token), Some(form)) = (token, form) else {
        tracing::info!("Citizen ID verification failed for destination {path}");
        return Ok(Redirect::to(ERROR_PATH).into_response());
    };

    let passthrough: Vec<&(String, String)> = params
        .iter()
        .filter(|(k, _)| k != COOKIE_NAME && k != "destination")
        .collect();
    let mut target = form.path();
    if !passthrough.is_empty() {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(passthrough.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish();
        target = format!("{target}?{query}");
    }

    let jar = jar.add(citizen_id::token_cookie(&token));
    Ok((jar, Redirect::to(&target)).into_response())
}

pub async fn error() -> Html<&'static str> {
    Html(citizen_id::error_page())
}

pub async fn form_error(
    State(state): State<SharedState>,
    Path(form_id): Path<String>,
) -> Result<Response, AppError> {
    let Some(form) = state.store.find_form(&form_id).await? else {
        return Ok((StatusCode::NOT_FOUND, Html(citizen_id::error_page())).into_response());
    };

    let page = format!(
        "<h1>Error with {} and Citizen ID</h1>{}",
        html_escape(&form.title),
        citizen_id::form_error_page()
    );
    Ok(Html(page).into_response())
}
