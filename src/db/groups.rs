use sqlx::PgPool;

use crate::models::ContactGroup;

use super::GroupInput;

pub async fn list(pool: &PgPool) -> Result<Vec<ContactGroup>, sqlx::Error> {
    sqlx::query_as::<_, ContactGroup>("SELECT * FROM contact_groups ORDER BY label")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<ContactGroup>, sqlx::Error> {
    sqlx::query_as::<_, ContactGroup>("SELECT * FROM contact_groups WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(pool: &PgPool, input: &GroupInput) -> Result<ContactGroup, sqlx::Error> {
    sqlx::query_as::<_, ContactGroup>(
        "INSERT INTO contact_groups (id, label, post_url, auth_header)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(&input.id)
    .bind(&input.label)
    .bind(&input.post_url)
    .bind(&input.auth_header)
    .fetch_one(pool)
    .await
}

pub async fn update(pool: &PgPool, input: &GroupInput) -> Result<Option<ContactGroup>, sqlx::Error> {
    sqlx::query_as::<_, ContactGroup>(
        "UPDATE contact_groups SET label = $2, post_url = $3, auth_header = $4, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(&input.id)
    .bind(&input.label)
    .bind(&input.post_url)
    .bind(&input.auth_header)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM contact_groups WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
