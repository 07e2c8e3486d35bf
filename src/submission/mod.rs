pub mod normalizer;
pub mod parser;
pub mod payload;
pub mod pipeline;
pub mod schema;
pub mod token;

/// Submitted values keyed by element machine name, in submission order.
pub type SubmissionData = serde_json::Map<String, serde_json::Value>;
