use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Handler;

use super::HandlerInput;

pub async fn list_by_form(pool: &PgPool, form_id: &str) -> Result<Vec<Handler>, sqlx::Error> {
    sqlx::query_as::<_, Handler>(
        "SELECT * FROM form_handlers WHERE form_id = $1 ORDER BY position, created_at",
    )
    .bind(form_id)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    form_id: &str,
    input: &HandlerInput,
) -> Result<Handler, sqlx::Error> {
    sqlx::query_as::<_, Handler>(
        "INSERT INTO form_handlers (id, form_id, handler_type, label, config, position, enabled)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(form_id)
    .bind(&input.handler_type)
    .bind(&input.label)
    .bind(&input.config)
    .bind(input.position)
    .bind(input.enabled)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, form_id: &str, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM form_handlers WHERE id = $1 AND form_id = $2")
        .bind(id)
        .bind(form_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
