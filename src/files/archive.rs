//! Zips the documents of a submission and drops a flag file next to the
//! archive for the downstream file watcher.

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::db::Store;
use crate::submission::SubmissionData;
use crate::submission::schema::{ElementKind, FormSchema};

use super::{StreamWrappers, TEMPORARY};

#[derive(Debug)]
pub enum ArchiveError {
    Io(io::Error),
    Zip(zip::result::ZipError),
    InvalidUri(String),
    Database(sqlx::Error),
    Task(tokio::task::JoinError),
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveError::Io(err) => write!(f, "I/O error: {err}"),
            ArchiveError::Zip(err) => write!(f, "Zip error: {err}"),
            ArchiveError::InvalidUri(uri) => write!(f, "Invalid file URI: {uri}"),
            ArchiveError::Database(err) => write!(f, "Database error: {err}"),
            ArchiveError::Task(err) => write!(f, "Archive task failed: {err}"),
        }
    }
}

impl std::error::Error for ArchiveError {}

impl From<io::Error> for ArchiveError {
    fn from(err: io::Error) -> Self {
        ArchiveError::Io(err)
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        ArchiveError::Zip(err)
    }
}

impl From<sqlx::Error> for ArchiveError {
    fn from(err: sqlx::Error) -> Self {
        ArchiveError::Database(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveOutcome {
    Archived(Bundle),
    /// Nothing to archive: no documents, or the archive could not be built.
    Skipped,
}

/// A zip and its flag file, both placed in `directory`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub directory: String,
    /// Final archive name without `.zip`; differs from the requested name
    /// after a collision.
    pub name: String,
    /// Name the archive was requested under.
    pub requested_name: String,
}

impl Bundle {
    pub fn zip_uri(&self) -> String {
        format!("{}/{}.zip", self.directory, self.name)
    }

    pub fn flag_uri(&self) -> String {
        format!("{}/{}.FLAG", self.directory, self.name)
    }
}

/// A document to place in the archive.
#[derive(Debug, Clone)]
struct Entry {
    source: PathBuf,
    name: String,
}

pub struct DocumentArchiver {
    wrappers: StreamWrappers,
}

impl DocumentArchiver {
    pub fn new(wrappers: StreamWrappers) -> Self {
        Self { wrappers }
    }

    pub fn wrappers(&self) -> &StreamWrappers {
        &self.wrappers
    }

    /// Archives the documents referenced by `data` into
    /// `<directory>/<name>.zip`. `directory` and `name` are already
    /// token-rendered.
    pub async fn archive(
        &self,
        store: &dyn Store,
        data: &SubmissionData,
        schema: &FormSchema,
        directory: &str,
        name: &str,
    ) -> Result<ArchiveOutcome, ArchiveError> {
        let entries = self.collect_entries(store, data, schema).await?;
        if entries.is_empty() {
            return Ok(ArchiveOutcome::Skipped);
        }

        let temp_uri = format!("{TEMPORARY}{}", Uuid::now_v7());
        let temp_path = self.resolve(&temp_uri)?;
        let dir_path = self.resolve(directory)?;

        let zip_path = temp_path.clone();
        let built = tokio::task::spawn_blocking(move || write_zip(&zip_path, &entries))
            .await
            .map_err(ArchiveError::Task)?;
        if let Err(e) = built {
            tracing::warn!("Could not build archive {temp_uri}: {e}");
            let _ = std::fs::remove_file(&temp_path);
            return Ok(ArchiveOutcome::Skipped);
        }

        let requested = name.to_string();
        let final_name = tokio::task::spawn_blocking(move || {
            place_bundle(&temp_path, &dir_path, &requested)
        })
        .await
        .map_err(ArchiveError::Task)??;

        tracing::info!("Archived documents to {directory}/{final_name}.zip");

        Ok(ArchiveOutcome::Archived(Bundle {
            directory: directory.to_string(),
            name: final_name,
            requested_name: name.to_string(),
        }))
    }

    async fn collect_entries(
        &self,
        store: &dyn Store,
        data: &SubmissionData,
        schema: &FormSchema,
    ) -> Result<Vec<Entry>, ArchiveError> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();

        for (field, fid) in document_file_ids(data, schema) {
            let Some(file) = store.find_file(fid).await? else {
                tracing::warn!("Document {fid} in field {field} has no file record, skipping");
                continue;
            };
            let Some(source) = self.wrappers.realpath(&file.uri) else {
                tracing::warn!("Document {fid} has an unresolvable URI {}, skipping", file.uri);
                continue;
            };
            if !source.is_file() {
                tracing::warn!("Document {fid} is missing on disk at {}, skipping", source.display());
                continue;
            }
            let name = format!("{field}/{}", file.filename);
            if !seen.insert(name.clone()) {
                continue;
            }
            entries.push(Entry { source, name });
        }

        Ok(entries)
    }

    fn resolve(&self, uri: &str) -> Result<PathBuf, ArchiveError> {
        self.wrappers
            .realpath(uri)
            .ok_or_else(|| ArchiveError::InvalidUri(uri.to_string()))
    }
}

/// `(field, fid)` for every file referenced by a document upload field, in
/// submission order. Ids may be integers or numeric strings, nested in lists.
pub fn document_file_ids(data: &SubmissionData, schema: &FormSchema) -> Vec<(String, i64)> {
    let mut ids = Vec::new();
    for (key, value) in data {
        let is_document = schema
            .get(key)
            .is_some_and(|element| element.kind == ElementKind::DocumentFile);
        if is_document {
            push_file_ids(key, value, &mut ids);
        }
    }
    ids
}

fn push_file_ids(field: &str, value: &Value, ids: &mut Vec<(String, i64)>) {
    match value {
        Value::Number(n) => {
            if let Some(fid) = n.as_i64() {
                ids.push((field.to_string(), fid));
            }
        }
        Value::String(s) => {
            if let Ok(fid) = s.trim().parse::<i64>() {
                ids.push((field.to_string(), fid));
            }
        }
        Value::Array(items) => items.iter().for_each(|item| push_file_ids(field, item, ids)),
        Value::Object(map) => map.values().for_each(|item| push_file_ids(field, item, ids)),
        _ => {}
    }
}

fn write_zip(path: &Path, entries: &[Entry]) -> Result<(), ArchiveError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut zip = ZipWriter::new(File::create(path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        zip.start_file(entry.name.as_str(), options)?;
        let mut source = File::open(&entry.source)?;
        io::copy(&mut source, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}

/// Moves the temporary archive into `dir` and writes its flag file.
/// Returns the final archive name without extension. The temporary file is
/// gone afterwards whether or not placement succeeded.
fn place_bundle(temp: &Path, dir: &Path, name: &str) -> Result<String, ArchiveError> {
    let placed = copy_and_flag(temp, dir, name);
    if let Err(e) = std::fs::remove_file(temp) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!("Could not remove temporary archive {}: {e}", temp.display());
        }
    }
    placed
}

fn copy_and_flag(temp: &Path, dir: &Path, name: &str) -> Result<String, ArchiveError> {
    std::fs::create_dir_all(dir)?;

    let final_name = available_name(dir, name, "zip");
    std::fs::copy(temp, dir.join(format!("{final_name}.zip")))?;

    let flag = format!("{final_name}.zip\n{name}");
    std::fs::write(dir.join(format!("{final_name}.FLAG")), flag)?;

    Ok(final_name)
}

/// `name`, or `name_0`, `name_1`, … whichever is free first.
pub fn available_name(dir: &Path, name: &str, extension: &str) -> String {
    if !dir.join(format!("{name}.{extension}")).exists() {
        return name.to_string();
    }
    (0..)
        .map(|n| format!("{name}_{n}"))
        .find(|candidate| !dir.join(format!("{candidate}.{extension}")).exists())
        .unwrap_or_else(|| name.to_string())
}
