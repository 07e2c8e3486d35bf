use sqlx::PgPool;

use crate::models::{FileStatus, ManagedFile, NewFile};

pub async fn find_by_id(pool: &PgPool, fid: i64) -> Result<Option<ManagedFile>, sqlx::Error> {
    sqlx::query_as::<_, ManagedFile>("SELECT * FROM managed_files WHERE fid = $1")
        .bind(fid)
        .fetch_optional(pool)
        .await
}

/// Most recent record for a URI. Re-registered bundles may share one.
pub async fn find_by_uri(pool: &PgPool, uri: &str) -> Result<Option<ManagedFile>, sqlx::Error> {
    sqlx::query_as::<_, ManagedFile>(
        "SELECT * FROM managed_files WHERE uri = $1 ORDER BY fid DESC LIMIT 1",
    )
    .bind(uri)
    .fetch_optional(pool)
    .await
}

pub async fn create(pool: &PgPool, file: &NewFile) -> Result<ManagedFile, sqlx::Error> {
    sqlx::query_as::<_, ManagedFile>(
        "INSERT INTO managed_files (owner, filename, uri, filemime, status)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(file.owner)
    .bind(&file.filename)
    .bind(&file.uri)
    .bind(&file.filemime)
    .bind(file.status)
    .fetch_one(pool)
    .await
}

pub async fn relocate(pool: &PgPool, fid: i64, uri: &str) -> Result<Option<ManagedFile>, sqlx::Error> {
    sqlx::query_as::<_, ManagedFile>(
        "UPDATE managed_files SET uri = $2, status = $3 WHERE fid = $1 RETURNING *",
    )
    .bind(fid)
    .bind(uri)
    .bind(FileStatus::Permanent)
    .fetch_optional(pool)
    .await
}
