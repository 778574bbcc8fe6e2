use sqlx::PgPool;

use crate::contact::repo_types::{ContactSubmission, NewContactSubmission};

pub async fn insert(
    db: &PgPool,
    c: &NewContactSubmission,
) -> Result<ContactSubmission, sqlx::Error> {
    sqlx::query_as::<_, ContactSubmission>(
        r#"
        INSERT INTO contact_submissions (first_name, last_name, email, subject, message)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, first_name, last_name, email, subject, message, created_at
        "#,
    )
    .bind(&c.first_name)
    .bind(&c.last_name)
    .bind(&c.email)
    .bind(&c.subject)
    .bind(&c.message)
    .fetch_one(db)
    .await
}
