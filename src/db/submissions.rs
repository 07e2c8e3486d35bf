use sqlx::PgPool;

use crate::models::Submission;

pub async fn create(pool: &PgPool, submission: &Submission) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "INSERT INTO submissions (id, form_id, data, created_at)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(submission.id)
    .bind(&submission.form_id)
    .bind(sqlx::types::Json(&submission.data))
    .bind(submission.created_at)
    .fetch_one(pool)
    .await
}

pub async fn list_by_form(pool: &PgPool, form_id: &str) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "SELECT * FROM submissions WHERE form_id = $1 ORDER BY created_at DESC",
    )
    .bind(form_id)
    .fetch_all(pool)
    .await
}
