use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Temporary = 0,
    Permanent = 1,
}

/// A file known to the store: an uploaded document or a retained bundle.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ManagedFile {
    pub fid: i64,
    pub owner: Option<Uuid>,
    pub filename: String,
    pub uri: String,
    pub filemime: String,
    pub status: FileStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFile {
    pub owner: Option<Uuid>,
    pub filename: String,
    pub uri: String,
    pub filemime: String,
    pub status: FileStatus,
}

impl NewFile {
    pub fn permanent(owner: Option<Uuid>, filename: &str, uri: &str) -> Self {
        Self {
            owner,
            filename: filename.to_string(),
            uri: uri.to_string(),
            filemime: guess_mime(filename).to_string(),
            status: FileStatus::Permanent,
        }
    }
}

pub fn guess_mime(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "zip" => "application/zip",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "txt" | "flag" => "text/plain",
        "csv" => "text/csv",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}
