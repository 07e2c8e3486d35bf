//! Citizen ID pass-through: the identity token arrives on the query string
//! or as a cookie and is handed to the case-management backend untouched.

use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::Value;

use crate::db::Store;
use crate::models::Form;
use crate::submission::SubmissionData;
use crate::submission::normalizer::{CITIZEN_ID_FIELD, is_blank, is_blank_text};

pub const COOKIE_NAME: &str = CITIZEN_ID_FIELD;
pub const COOKIE_LIFETIME_HOURS: i64 = 3;
pub const ERROR_PATH: &str = "/citizenid-error";

/// Query value if present, otherwise the cookie. Blank values (empty or
/// `"0"`) count as absent.
pub fn token_from(query: Option<&str>, jar: &CookieJar) -> Option<String> {
    query
        .filter(|token| !is_blank_text(token))
        .map(str::to_string)
        .or_else(|| {
            jar.get(COOKIE_NAME)
                .map(|cookie| cookie.value().to_string())
                .filter(|token| !is_blank_text(token))
        })
}

/// Destination as an absolute path, without any query string.
pub fn destination_path(raw: Option<&str>) -> String {
    let raw = raw.unwrap_or_default();
    let path = raw.split(['?', '#']).next().unwrap_or_default();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// The form served at `path`, if any.
pub async fn form_at(store: &dyn Store, path: &str) -> Result<Option<Form>, sqlx::Error> {
    let path = path.trim_end_matches('/');
    Ok(store
        .list_forms()
        .await?
        .into_iter()
        .find(|form| form.path() == path))
}

pub fn token_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token.to_string()))
        .path("/")
        .max_age(time::Duration::hours(COOKIE_LIFETIME_HOURS))
        .build()
}

/// A cookie that makes the browser drop `name`.
pub fn expired_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), String::new()))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

/// Fills the form's citizen id element from the cookie when the submission
/// did not carry one.
pub fn fill_token(form: &Form, data: &mut SubmissionData, jar: &CookieJar) {
    if !form.elements.contains(CITIZEN_ID_FIELD) || !is_blank(data.get(CITIZEN_ID_FIELD)) {
        return;
    }
    if let Some(token) = token_from(None, jar) {
        data.insert(CITIZEN_ID_FIELD.to_string(), Value::String(token));
    }
}

pub fn error_page() -> &'static str {
    "<p>There was an error with Citizen ID</p>"
}

pub fn form_error_page() -> &'static str {
    "<p>You cannot access the form at this time.</p>"
}
