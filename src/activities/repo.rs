use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};

use super::dto::{ActivityFilter, NewActivity};

#[derive(Debug, Clone, FromRow)]
pub struct Activity {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub category: String,
    pub minutes: i64,
    pub date: Date,
    pub created_at: OffsetDateTime,
}

/// Append-only insert; the database assigns `id` and `created_at`. Business
/// validation happened at the handler boundary, the FK enforces the owner.
pub async fn insert(db: &PgPool, user_id: i64, new: &NewActivity) -> sqlx::Result<Activity> {
    sqlx::query_as::<_, Activity>(
        r#"
        INSERT INTO activities (user_id, title, category, minutes, date)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, title, category, minutes, date, created_at
        "#,
    )
    .bind(user_id)
    .bind(&new.title)
    .bind(&new.category)
    .bind(new.minutes)
    .bind(new.date)
    .fetch_one(db)
    .await
}

/// Lists activities for one owner, newest date first with `id` as the stable
/// tie-break. Every query is scoped by `user_id`; there is no unscoped path.
pub async fn list(
    db: &PgPool,
    user_id: i64,
    filter: &ActivityFilter,
) -> sqlx::Result<Vec<Activity>> {
    sqlx::query_as::<_, Activity>(
        r#"
        SELECT id, user_id, title, category, minutes, date, created_at
        FROM activities
        WHERE user_id = $1
          AND ($2::text IS NULL OR category = $2)
          AND ($3::date IS NULL OR date >= $3)
          AND ($4::date IS NULL OR date <= $4)
        ORDER BY date DESC, id ASC
        "#,
    )
    .bind(user_id)
    .bind(filter.category.as_deref())
    .bind(filter.start_date)
    .bind(filter.end_date)
    .fetch_all(db)
    .await
}
