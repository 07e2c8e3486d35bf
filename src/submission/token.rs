use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

use super::SubmissionData;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(webform_submission|webform):(\w+(?::\w+)*)\]").unwrap());

pub struct TokenContext<'a> {
    pub submission_id: Uuid,
    pub form_id: &'a str,
    pub data: &'a SubmissionData,
}

/// Replace `[webform_submission:values:key]`-style tokens with submission values.
///
/// Unknown tokens resolve to nothing. Substituted values are used in file
/// paths, so separators in them are replaced with `-`.
pub fn render(template: &str, ctx: &TokenContext) -> String {
    TOKEN_RE
        .replace_all(template, |caps: &regex::Captures| {
            resolve(&caps[1], &caps[2], ctx)
                .map(|value| path_safe(&value))
                .unwrap_or_default()
        })
        .to_string()
}

fn resolve(scope: &str, path: &str, ctx: &TokenContext) -> Option<String> {
    let parts: Vec<&str> = path.split(':').collect();
    match (scope, parts.as_slice()) {
        ("webform_submission", ["sid"]) | ("webform_submission", ["uuid"]) => {
            Some(ctx.submission_id.to_string())
        }
        ("webform_submission", ["values", field, rest @ ..]) => {
            let mut value = ctx.data.get(*field)?;
            for key in rest {
                value = value.get(*key)?;
            }
            json_string_field(value)
        }
        ("webform", ["id"]) => Some(ctx.form_id.to_string()),
        _ => None,
    }
}

fn json_string_field(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn path_safe(value: &str) -> String {
    value.replace(['/', '\\'], "-").replace("..", "")
}
