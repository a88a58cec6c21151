use crate::connection::Database;
use crate::error::{DbError, Result};
use crate::models::{DbUserBook, NewUserBook};
use chrono::{DateTime, Utc};
use readlog_common::window::whole_seconds;
use readlog_common::BookStatus;
use sqlx::{QueryBuilder, Sqlite};

pub struct UserBookQueries;

impl UserBookQueries {
    pub async fn create(
        db: &Database,
        book: NewUserBook,
        now: DateTime<Utc>,
    ) -> Result<DbUserBook> {
        let pool = db.pool()?;

        let now = whole_seconds(now);
        let finished = (book.status == BookStatus::Read).then_some(now);
        let authors = serde_json::to_string(&book.authors)?;

        let result = sqlx::query(
            r#"
            INSERT INTO user_books (
                user_id, isbn, title, authors, pages, status,
                current_page, user_rating, date_added, date_updated, date_finished
            )
            VALUES (?, ?, ?, ?, ?, ?, NULL, NULL, ?, ?, ?)
            "#,
        )
        .bind(&book.user_id)
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&authors)
        .bind(book.pages.map(i64::from))
        .bind(book.status.as_str())
        .bind(now)
        .bind(now)
        .bind(finished)
        .execute(pool)
        .await;

        match result {
            Ok(_) => Self::get(db, &book.user_id, &book.isbn).await,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(DbError::Duplicate(
                format!("Book {} is already on the shelf of {}", book.isbn, book.user_id),
            )),
            Err(e) => Err(DbError::Sqlx(e)),
        }
    }

    pub async fn get(db: &Database, user_id: &str, isbn: &str) -> Result<DbUserBook> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbUserBook>("SELECT * FROM user_books WHERE user_id = ? AND isbn = ?")
            .bind(user_id)
            .bind(isbn)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Book {} not found for {}", isbn, user_id)))
    }

    pub async fn list_for_user(db: &Database, user_id: &str) -> Result<Vec<DbUserBook>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbUserBook>(
            "SELECT * FROM user_books WHERE user_id = ? ORDER BY date_added DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(DbError::Sqlx)
    }

    /// Changes the status; `date_finished` follows it. Moving to `read` stamps
    /// it unless a stamp already exists, any other status clears it.
    pub async fn update_status(
        db: &Database,
        user_id: &str,
        isbn: &str,
        status: BookStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let pool = db.pool()?;

        let now = whole_seconds(now);

        let result = sqlx::query(
            r#"
            UPDATE user_books
            SET status = ?,
                date_updated = ?,
                date_finished = CASE WHEN ? = 'read' THEN COALESCE(date_finished, ?) ELSE NULL END
            WHERE user_id = ? AND isbn = ?
            "#,
        )
        .bind(status.as_str())
        .bind(now)
        .bind(status.as_str())
        .bind(now)
        .bind(user_id)
        .bind(isbn)
        .execute(pool)
        .await?;

        Self::expect_row(result.rows_affected(), user_id, isbn)
    }

    pub async fn update_progress(
        db: &Database,
        user_id: &str,
        isbn: &str,
        current_page: u32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let pool = db.pool()?;

        let result = sqlx::query(
            "UPDATE user_books SET current_page = ?, date_updated = ? WHERE user_id = ? AND isbn = ?",
        )
        .bind(i64::from(current_page))
        .bind(whole_seconds(now))
        .bind(user_id)
        .bind(isbn)
        .execute(pool)
        .await?;

        Self::expect_row(result.rows_affected(), user_id, isbn)
    }

    pub async fn update_total_pages(
        db: &Database,
        user_id: &str,
        isbn: &str,
        pages: u32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let pool = db.pool()?;

        let result = sqlx::query(
            "UPDATE user_books SET pages = ?, date_updated = ? WHERE user_id = ? AND isbn = ?",
        )
        .bind(i64::from(pages))
        .bind(whole_seconds(now))
        .bind(user_id)
        .bind(isbn)
        .execute(pool)
        .await?;

        Self::expect_row(result.rows_affected(), user_id, isbn)
    }

    pub async fn update_rating(
        db: &Database,
        user_id: &str,
        isbn: &str,
        rating: Option<u8>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let pool = db.pool()?;

        if let Some(r) = rating {
            if !(1..=5).contains(&r) {
                return Err(DbError::InvalidData(format!("Rating must be 1-5, got {}", r)));
            }
        }

        let result = sqlx::query(
            "UPDATE user_books SET user_rating = ?, date_updated = ? WHERE user_id = ? AND isbn = ?",
        )
        .bind(rating.map(i64::from))
        .bind(whole_seconds(now))
        .bind(user_id)
        .bind(isbn)
        .execute(pool)
        .await?;

        Self::expect_row(result.rows_affected(), user_id, isbn)
    }

    pub async fn delete(db: &Database, user_id: &str, isbn: &str) -> Result<()> {
        let pool = db.pool()?;

        let result = sqlx::query("DELETE FROM user_books WHERE user_id = ? AND isbn = ?")
            .bind(user_id)
            .bind(isbn)
            .execute(pool)
            .await?;

        Self::expect_row(result.rows_affected(), user_id, isbn)
    }

    /// Books with status `read`, optionally limited to an inclusive finish window.
    pub async fn list_finished_in_range(
        db: &Database,
        user_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<DbUserBook>> {
        let pool = db.pool()?;

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT * FROM user_books WHERE status = 'read' AND date_finished IS NOT NULL AND user_id = ",
        );
        query.push_bind(user_id.to_string());

        if let Some(start) = start {
            query.push(" AND date_finished >= ").push_bind(start);
        }
        if let Some(end) = end {
            query.push(" AND date_finished <= ").push_bind(end);
        }
        query.push(" ORDER BY date_finished ASC");

        query.build_query_as::<DbUserBook>().fetch_all(pool).await.map_err(DbError::Sqlx)
    }

    fn expect_row(rows_affected: u64, user_id: &str, isbn: &str) -> Result<()> {
        if rows_affected == 0 {
            Err(DbError::NotFound(format!("Book {} not found for {}", isbn, user_id)))
        } else {
            Ok(())
        }
    }
}
