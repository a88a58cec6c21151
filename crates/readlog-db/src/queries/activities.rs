use crate::connection::Database;
use crate::error::{DbError, Result};
use crate::models::{DbActivity, NewActivity};
use chrono::Utc;
use readlog_common::window::whole_seconds;

pub struct ActivityQueries;

impl ActivityQueries {
    pub async fn create(db: &Database, activity: NewActivity) -> Result<i64> {
        let pool = db.pool()?;

        let metadata = serde_json::to_string(&activity.metadata)?;

        let result = sqlx::query(
            r#"
            INSERT INTO reading_activities (user_id, activity_type, book_isbn, metadata, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&activity.user_id)
        .bind(activity.activity_type.as_str())
        .bind(&activity.book_isbn)
        .bind(&metadata)
        .bind(whole_seconds(Utc::now()))
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn list_for_user(db: &Database, user_id: &str, limit: i64) -> Result<Vec<DbActivity>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbActivity>(
            "SELECT * FROM reading_activities WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(DbError::Sqlx)
    }
}
