use crate::connection::Database;
use crate::error::{DbError, Result};
use crate::models::DbProgressEntry;
use chrono::{DateTime, Utc};
use readlog_common::window::whole_seconds;
use readlog_common::{NewProgressEntry, ProgressFilter, SortOrder};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

pub struct ProgressQueries;

impl ProgressQueries {
    pub async fn create(db: &Database, entry: NewProgressEntry) -> Result<DbProgressEntry> {
        let pool = db.pool()?;

        let result = sqlx::query(
            r#"
            INSERT INTO reading_progress (
                user_id, book_isbn, absolute_page, session_delta,
                session_minutes, total_pages, recorded_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.user_id)
        .bind(&entry.book_isbn)
        .bind(i64::from(entry.absolute_page))
        .bind(i64::from(entry.session_delta))
        .bind(entry.session_minutes.map(i64::from))
        .bind(entry.total_pages.map(i64::from))
        .bind(whole_seconds(entry.recorded_at))
        .execute(pool)
        .await?;

        Self::get_by_id(db, result.last_insert_rowid()).await
    }

    pub async fn get_by_id(db: &Database, id: i64) -> Result<DbProgressEntry> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbProgressEntry>("SELECT * FROM reading_progress WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Progress entry {} not found", id)))
    }

    /// Entries for a user matching `filter`, ordered by `recorded_at`.
    pub async fn list(
        db: &Database,
        user_id: &str,
        filter: &ProgressFilter,
    ) -> Result<Vec<DbProgressEntry>> {
        let pool = db.pool()?;

        let mut query =
            QueryBuilder::<Sqlite>::new("SELECT * FROM reading_progress WHERE user_id = ");
        query.push_bind(user_id.to_string());

        if let Some(isbn) = &filter.book_isbn {
            query.push(" AND book_isbn = ").push_bind(isbn.clone());
        }

        if let Some(window) = &filter.window {
            query
                .push(" AND recorded_at >= ")
                .push_bind(window.start)
                .push(" AND recorded_at <= ")
                .push_bind(window.end);
        }

        let order = match filter.order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        query.push(format!(" ORDER BY recorded_at {order}, id {order}"));

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(i64::from(limit));
        }

        debug!("Listing progress for {} with {:?}", user_id, filter);

        query.build_query_as::<DbProgressEntry>().fetch_all(pool).await.map_err(DbError::Sqlx)
    }

    pub async fn latest_for_book(
        db: &Database,
        user_id: &str,
        book_isbn: &str,
    ) -> Result<Option<DbProgressEntry>> {
        let entries = Self::list(db, user_id, &ProgressFilter::latest_for_book(book_isbn)).await?;
        Ok(entries.into_iter().next())
    }

    pub async fn list_for_book(
        db: &Database,
        user_id: &str,
        book_isbn: &str,
        limit: u32,
    ) -> Result<Vec<DbProgressEntry>> {
        Self::list(db, user_id, &ProgressFilter::for_book(book_isbn).with_limit(limit)).await
    }

    pub async fn list_in_range(
        db: &Database,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DbProgressEntry>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbProgressEntry>(
            "SELECT * FROM reading_progress WHERE user_id = ? AND recorded_at >= ? AND recorded_at <= ? ORDER BY recorded_at ASC, id ASC"
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
        .map_err(DbError::Sqlx)
    }

    pub async fn list_recent(
        db: &Database,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DbProgressEntry>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbProgressEntry>(
            "SELECT * FROM reading_progress WHERE user_id = ? AND recorded_at >= ? ORDER BY recorded_at ASC, id ASC"
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(pool)
        .await
        .map_err(DbError::Sqlx)
    }

    /// Sum of session deltas, optionally bounded on either side (inclusive).
    pub async fn total_pages_in_range(
        db: &Database,
        user_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<i64> {
        let pool = db.pool()?;

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT COALESCE(SUM(session_delta), 0) FROM reading_progress WHERE user_id = ",
        );
        query.push_bind(user_id.to_string());

        if let Some(start) = start {
            query.push(" AND recorded_at >= ").push_bind(start);
        }
        if let Some(end) = end {
            query.push(" AND recorded_at <= ").push_bind(end);
        }

        let row = query.build().fetch_one(pool).await?;

        Ok(row.get(0))
    }

    pub async fn total_minutes(db: &Database, user_id: &str) -> Result<i64> {
        let pool = db.pool()?;

        let row = sqlx::query(
            "SELECT COALESCE(SUM(session_minutes), 0) FROM reading_progress WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(row.get(0))
    }
}
