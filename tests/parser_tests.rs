use axum::http::HeaderMap;
use serde_json::{Value, json};

use casebridge::submission::SubmissionData;
use casebridge::submission::parser::{parse_body, parse_multipart};

const URLENCODED: Option<&str> = Some("application/x-www-form-urlencoded");

fn urlencoded(body: &str) -> SubmissionData {
    parse_body(URLENCODED, body.as_bytes()).unwrap()
}

fn keys(value: &Value) -> Vec<&str> {
    value
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect()
}

// ── Urlencoded field names ──────────────────────────────────────

#[test]
fn plain_names_stay_flat() {
    let data = urlencoded("name=Ada&town=Hove");
    assert_eq!(Value::Object(data.clone()), json!({ "name": "Ada", "town": "Hove" }));
    assert_eq!(keys(&Value::Object(data)), ["name", "town"]);
}

#[test]
fn empty_brackets_collect_into_a_list() {
    let data = urlencoded("topics[]=Bins&topics[]=Parking&topics[]=Roads");
    assert_eq!(data["topics"], json!(["Bins", "Parking", "Roads"]));
}

#[test]
fn named_brackets_build_an_object_in_order() {
    let data = urlencoded("dob[day]=01&dob[month]=02&dob[year]=1980");
    assert_eq!(data["dob"], json!({ "day": "01", "month": "02", "year": "1980" }));
    assert_eq!(keys(&data["dob"]), ["day", "month", "year"]);
}

#[test]
fn percent_encoded_brackets_are_expanded() {
    let data = urlencoded("dob%5Bday%5D=01&dob%5Byear%5D=1980");
    assert_eq!(data["dob"], json!({ "day": "01", "year": "1980" }));
}

#[test]
fn indexed_groups_become_a_list_of_objects() {
    let data = urlencoded(
        "people[0][name]=Ada&people[0][role]=Chair&people[1][role]=Clerk&people[1][name]=Bob",
    );
    assert_eq!(
        data["people"],
        json!([
            { "name": "Ada", "role": "Chair" },
            { "role": "Clerk", "name": "Bob" }
        ])
    );
    assert_eq!(keys(&data["people"][0]), ["name", "role"]);
    assert_eq!(keys(&data["people"][1]), ["role", "name"]);
}

#[test]
fn appended_groups_nest_lists() {
    let data = urlencoded("grid[a][]=1&grid[a][]=2&grid[b][]=3");
    assert_eq!(data["grid"], json!({ "a": ["1", "2"], "b": ["3"] }));
}

#[test]
fn sparse_or_out_of_order_indices_stay_keyed() {
    let data = urlencoded("rows[1]=b&rows[0]=a&cols[0]=x&cols[2]=z");
    assert_eq!(data["rows"], json!({ "1": "b", "0": "a" }));
    assert_eq!(data["cols"], json!({ "0": "x", "2": "z" }));
}

#[test]
fn malformed_brackets_are_taken_literally() {
    let data = urlencoded("a[b=1&[c]=2&d[e]f=3");
    assert_eq!(Value::Object(data), json!({ "a[b": "1", "[c]": "2", "d[e]f": "3" }));
}

#[test]
fn field_order_follows_first_appearance() {
    let data = urlencoded("zeta=1&alpha[x]=2&mid=3&alpha[y]=4");
    assert_eq!(keys(&Value::Object(data.clone())), ["zeta", "alpha", "mid"]);
    assert_eq!(keys(&data["alpha"]), ["x", "y"]);
}

#[test]
fn later_scalar_is_replaced_by_nested_value() {
    let data = urlencoded("a=plain&a[b]=nested");
    assert_eq!(data["a"], json!({ "b": "nested" }));
}

// ── Other bodies ────────────────────────────────────────────────

#[test]
fn json_body_must_be_an_object() {
    let data = parse_body(Some("application/json"), br#"{"b":1,"a":2}"#).unwrap();
    assert_eq!(keys(&Value::Object(data)), ["b", "a"]);
    assert!(parse_body(Some("application/json"), b"[1,2]").is_err());
    assert!(parse_body(Some("application/json"), b"{nope").is_err());
}

#[test]
fn multipart_body_is_deferred() {
    assert_eq!(
        parse_body(Some("multipart/form-data; boundary=x"), b"").unwrap_err(),
        "multipart"
    );
}

#[tokio::test]
async fn multipart_fields_use_bracket_names_and_skip_files() {
    let boundary = "casebridge-parser-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"dob[day]\"\r\n\r\n\
         01\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"dob[year]\"\r\n\r\n\
         1980\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"proof\"; filename=\"proof.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         ignored\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"topics[]\"\r\n\r\n\
         Bins\r\n\
         --{boundary}--\r\n"
    );
    let mut headers = HeaderMap::new();
    headers.insert(
        "content-type",
        format!("multipart/form-data; boundary={boundary}").parse().unwrap(),
    );

    let data = parse_multipart(&headers, body.into()).await.unwrap();

    assert_eq!(
        Value::Object(data),
        json!({ "dob": { "day": "01", "year": "1980" }, "topics": ["Bins"] })
    );
}
