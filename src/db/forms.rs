use sqlx::PgPool;

use crate::models::Form;

use super::FormInput;

pub async fn list(pool: &PgPool) -> Result<Vec<Form>, sqlx::Error> {
    sqlx::query_as::<_, Form>("SELECT * FROM forms ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Form>, sqlx::Error> {
    sqlx::query_as::<_, Form>("SELECT * FROM forms WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(pool: &PgPool, input: &FormInput) -> Result<Form, sqlx::Error> {
    sqlx::query_as::<_, Form>(
        "INSERT INTO forms (id, title, category, elements, settings)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(&input.id)
    .bind(&input.title)
    .bind(&input.category)
    .bind(sqlx::types::Json(&input.elements))
    .bind(sqlx::types::Json(&input.settings))
    .fetch_one(pool)
    .await
}

pub async fn update(pool: &PgPool, input: &FormInput) -> Result<Option<Form>, sqlx::Error> {
    sqlx::query_as::<_, Form>(
        "UPDATE forms SET title = $2, category = $3, elements = $4, settings = $5,
                          updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(&input.id)
    .bind(&input.title)
    .bind(&input.category)
    .bind(sqlx::types::Json(&input.elements))
    .bind(sqlx::types::Json(&input.settings))
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM forms WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
