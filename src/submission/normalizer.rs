//! Turns raw submission values into the question/answer tree expected by the
//! case-management backend.

use serde_json::Value;

use crate::clock::Clock;
use crate::models::Form;

use super::SubmissionData;
use super::payload::{CasePayload, PayloadNode};
use super::schema::{Element, ElementKind, FormSchema};

pub const CITIZEN_ID_FIELD: &str = "citizenidtoken";
pub const CASE_KEY_FIELD: &str = "casekey";
pub const SERVICE_FIELD: &str = "serviceselector";

/// How an answer is shaped for the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerPolicy {
    /// Plain value, posted as-is.
    Scalar,
    /// List of plain values (checkboxes), joined one per line.
    MultiValue,
    /// Day/month/year parts, formatted `YYYY-MM-DD`.
    Date,
    /// Anything else structured: one group of sub-answers per instance.
    Composite,
}

/// Picks the policy for a value. The first matching rule wins.
pub fn classify(value: &Value, element: &Element) -> AnswerPolicy {
    if !value.is_array() && !value.is_object() {
        return AnswerPolicy::Scalar;
    }
    if first_item(value).is_some_and(|first| !first.is_array() && !first.is_object()) {
        return AnswerPolicy::MultiValue;
    }
    if element.kind.is_date() {
        return AnswerPolicy::Date;
    }
    AnswerPolicy::Composite
}

/// Builds the full case payload for a submission of `form`.
pub fn prepare(form: &Form, data: &SubmissionData, clock: &dyn Clock) -> CasePayload {
    let mut data = data.clone();
    let mut payload = Vec::new();

    if !data.is_empty() {
        has_document_files(&mut data, &form.elements);
        payload = normalize(&data, &form.elements, clock);
    }

    let service = data.get(SERVICE_FIELD).and_then(scalar_string);
    let title = match service.as_deref() {
        Some(service) if !service.is_empty() && service != "0" => {
            format!("{} - {service}", form.title)
        }
        _ => form.title.clone(),
    };

    CasePayload {
        id: form.id.clone(),
        title,
        url: form.path(),
        citizen_id: data.get(CITIZEN_ID_FIELD).and_then(scalar_string),
        category: form.category.clone(),
        service,
        payload,
    }
}

/// Reports whether any document upload field carries a file.
///
/// Without documents the case key means nothing downstream, so it is dropped
/// from `data`.
pub fn has_document_files(data: &mut SubmissionData, schema: &FormSchema) -> bool {
    let has_files = data.iter().any(|(key, value)| {
        schema
            .get(key)
            .is_some_and(|element| element.kind == ElementKind::DocumentFile)
            && !is_blank(Some(value))
    });

    if !has_files {
        data.shift_remove(CASE_KEY_FIELD);
    }

    has_files
}

/// Normalizes every field in submission order, skipping the citizen id token.
pub fn normalize(data: &SubmissionData, schema: &FormSchema, clock: &dyn Clock) -> Vec<PayloadNode> {
    let fallback = Element::default();
    data.iter()
        .filter(|(key, _)| key.as_str() != CITIZEN_ID_FIELD)
        .map(|(key, value)| {
            let element = schema.get(key).unwrap_or(&fallback);
            let question = element.title.clone().unwrap_or_default();
            response_node(question, value, key, element, clock)
        })
        .collect()
}

/// Builds the node for one answer. `element` is the field's own element, or
/// the parent composite's element for sub-answers.
pub fn response_node(
    question: String,
    value: &Value,
    machine_name: &str,
    element: &Element,
    clock: &dyn Clock,
) -> PayloadNode {
    let (answer, changed) = match classify(value, element) {
        AnswerPolicy::Scalar => return PayloadNode::leaf(question, value.clone(), machine_name),
        AnswerPolicy::MultiValue => join_multi_value(value),
        AnswerPolicy::Date => format_date_answer(value, clock),
        AnswerPolicy::Composite => (value.clone(), false),
    };

    if changed {
        PayloadNode::leaf(question, answer, machine_name)
    } else {
        PayloadNode::group(question, composite_payload(value, element, clock), machine_name)
    }
}

/// Joins a list of plain values with newlines.
pub fn join_multi_value(value: &Value) -> (Value, bool) {
    let transformed = match value {
        Value::Array(items) if first_item(value).is_some_and(|f| !f.is_array() && !f.is_object()) => {
            Value::String(items.iter().map(scalar_text).collect::<Vec<_>>().join("\n"))
        }
        other => other.clone(),
    };
    let changed = transformed != *value;
    (transformed, changed)
}

/// Formats a date answer, or a list of them one per line.
pub fn format_date_answer(value: &Value, clock: &dyn Clock) -> (Value, bool) {
    let transformed = match value {
        Value::Array(items) if first_item(value).is_some() => Value::String(
            items
                .iter()
                .map(|item| format_date(item, clock).unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        other => format_date(other, clock).map(Value::String).unwrap_or(Value::Null),
    };
    let changed = transformed != *value;
    (transformed, changed)
}

/// `YYYY-MM-DD` for a `{day, month, year}` map. Missing parts come from
/// today's date; all parts missing means no date at all.
pub fn format_date(value: &Value, clock: &dyn Clock) -> Option<String> {
    let year = value.get("year");
    let month = value.get("month");
    let day = value.get("day");

    if is_blank(year) && is_blank(month) && is_blank(day) {
        return None;
    }

    let today = clock.today();
    let year = part_or(year, || today.format("%Y").to_string());
    let month = padded_part_or(month, || today.format("%m").to_string());
    let day = padded_part_or(day, || today.format("%d").to_string());

    Some(format!("{year}-{month}-{day}"))
}

/// Titled address parts for a single address, or for each address in a list.
pub fn address_case(value: &Value, element: &Element) -> (Vec<PayloadNode>, bool) {
    let nodes: Vec<PayloadNode> = match value {
        Value::Array(items) if first_item(value).is_some() => items
            .iter()
            .flat_map(|item| address_parts(item, element))
            .collect(),
        other => address_parts(other, element),
    };
    let changed = serde_json::to_value(&nodes).map_or(true, |as_value| as_value != *value);
    (nodes, changed)
}

fn address_parts(instance: &Value, element: &Element) -> Vec<PayloadNode> {
    entries(instance)
        .into_iter()
        .filter_map(|(key, answer)| {
            element
                .address_part_title(&key)
                .map(|title| PayloadNode::leaf(title, answer.clone(), key))
        })
        .collect()
}

/// Groups of sub-answers, one group per composite instance.
pub fn composite_payload(value: &Value, element: &Element, clock: &dyn Clock) -> Vec<Vec<PayloadNode>> {
    let groups: Vec<&Value> = match value {
        Value::Array(items) if first_item(value).is_some() => items.iter().collect(),
        single => vec![single],
    };

    groups
        .into_iter()
        .map(|group| {
            if element.kind == ElementKind::AddressLookup {
                let (nodes, changed) = address_case(group, element);
                if changed {
                    return nodes;
                }
            }
            entries(group)
                .into_iter()
                .map(|(key, answer)| {
                    response_node(element.child_title(&key), answer, &key, element, clock)
                })
                .collect()
        })
        .collect()
}

/// First list item, if the value is a list whose first slot is filled.
fn first_item(value: &Value) -> Option<&Value> {
    value
        .as_array()
        .and_then(|items| items.first())
        .filter(|first| !first.is_null())
}

fn entries(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

fn part_or(part: Option<&Value>, default: impl FnOnce() -> String) -> String {
    if is_blank(part) {
        default()
    } else {
        part.map(scalar_text).unwrap_or_default()
    }
}

fn padded_part_or(part: Option<&Value>, default: impl FnOnce() -> String) -> String {
    if is_blank(part) {
        return default();
    }
    let padded: Vec<char> = format!("0{}", part.map(scalar_text).unwrap_or_default())
        .chars()
        .collect();
    padded[padded.len().saturating_sub(2)..].iter().collect()
}

/// True for missing, null, false, zero, `""`, `"0"` and empty collections.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => is_blank_text(s),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
    }
}

pub fn is_blank_text(text: &str) -> bool {
    text.is_empty() || text == "0"
}

/// Text form of a value, as used when joining answers.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        other => Some(scalar_text(other)),
    }
}
