use reqwest::header::AUTHORIZATION;

use crate::submission::payload::CasePayload;

use super::endpoint::Endpoint;

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitError {
    /// Status of the failed response, `0` when none arrived.
    pub status: u16,
    /// HTML-safe description of the failure.
    pub message: String,
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.status)
    }
}

/// Posts case payloads to the case-management backend. Never retries.
pub struct CaseSubmitter {
    client: reqwest::Client,
}

impl CaseSubmitter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn submit(
        &self,
        endpoint: &Endpoint,
        payload: &CasePayload,
    ) -> Result<u16, SubmitError> {
        let citizen_id = payload.citizen_id.as_deref().unwrap_or_default();

        let response = self
            .client
            .post(&endpoint.post_url)
            .header(AUTHORIZATION, endpoint.auth_header.as_str())
            .json(payload)
            .send()
            .await
            .and_then(|resp| resp.error_for_status());

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                let status = e.status().map(|s| s.as_u16()).unwrap_or(0);
                tracing::error!(
                    "Error posting to case management. Citizen ID token: {citizen_id}. Status code: {status}"
                );
                return Err(SubmitError {
                    status,
                    message: nl2br(&html_escape(&e.to_string())),
                });
            }
        };

        let status = response.status().as_u16();
        tracing::info!(
            "Posted to case management. Citizen ID token: {citizen_id}. Status code: {status}"
        );

        if !response.status().is_success() {
            return Err(SubmitError {
                status,
                message: format!("Remote post request return {status} status code."),
            });
        }

        Ok(status)
    }
}

pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Inserts `<br />` before every line break, keeping the break itself.
pub fn nl2br(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                out.push_str("<br />\r\n");
            }
            '\r' | '\n' => {
                out.push_str("<br />");
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}
