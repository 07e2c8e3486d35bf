use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use serde_json::json;

use crate::auth::AuthUser;
use crate::citizen_id;
use crate::error::AppError;
use crate::handlers::context::RequestInfo;
use crate::state::SharedState;
use crate::submission::{parser, pipeline};

pub async fn submit(
    State(state): State<SharedState>,
    Path(form_id): Path<String>,
    user: Option<AuthUser>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let form = state
        .store
        .find_form(&form_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Form not found".to_string()))?;

    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok());

    let mut data = if content_type.is_some_and(|ct| ct.contains("multipart/form-data")) {
        parser::parse_multipart(&headers, body)
            .await
            .map_err(AppError::BadRequest)?
    } else {
        parser::parse_body(content_type, &body).map_err(AppError::BadRequest)?
    };

    citizen_id::fill_token(&form, &mut data, &jar);

    let request = RequestInfo {
        is_ajax: is_ajax(&headers),
        user: user.map(|u| u.user_id),
    };

    let result = pipeline::run(&state, &form, request, data).await?;

    let jar = result
        .expire_cookies
        .iter()
        .fold(jar, |jar, name| jar.add(citizen_id::expired_cookie(name)));

    if let Some(redirect) = result.redirect {
        if redirect.ajax {
            return Ok((
                jar,
                Json(json!({
                    "command": "webformRefresh",
                    "url": redirect.url,
                    "message": redirect.message,
                })),
            )
                .into_response());
        }
        return Ok((jar, Redirect::to(&redirect.url)).into_response());
    }

    if let Some(ref url) = form.settings.confirmation_url {
        if content_type.is_some_and(|ct| ct.contains("form")) {
            return Ok((jar, Redirect::to(url)).into_response());
        }
    }

    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({
            "status": "created",
            "submission_id": result.submission_id,
        })),
    )
        .into_response())
}

fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}
