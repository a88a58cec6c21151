use crate::connection::Database;
use crate::error::{DbError, Result};
use crate::models::{DbBookNote, NewBookNote};
use chrono::{DateTime, Utc};
use readlog_common::window::whole_seconds;

pub struct NoteQueries;

impl NoteQueries {
    pub async fn create(db: &Database, note: NewBookNote, now: DateTime<Utc>) -> Result<DbBookNote> {
        let pool = db.pool()?;

        let text = Self::checked_text(&note.note)?;
        let now = whole_seconds(now);

        let result = sqlx::query(
            r#"
            INSERT INTO book_notes (user_id, book_isbn, title, note, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&note.user_id)
        .bind(&note.book_isbn)
        .bind(&note.title)
        .bind(text)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Self::get(db, &note.user_id, result.last_insert_rowid()).await
    }

    pub async fn get(db: &Database, user_id: &str, note_id: i64) -> Result<DbBookNote> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbBookNote>("SELECT * FROM book_notes WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(note_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Note {} not found for {}", note_id, user_id)))
    }

    /// Notes on a book, newest first.
    pub async fn list_for_book(
        db: &Database,
        user_id: &str,
        book_isbn: &str,
    ) -> Result<Vec<DbBookNote>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbBookNote>(
            "SELECT * FROM book_notes WHERE user_id = ? AND book_isbn = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .bind(book_isbn)
        .fetch_all(pool)
        .await
        .map_err(DbError::Sqlx)
    }

    pub async fn update(
        db: &Database,
        user_id: &str,
        note_id: i64,
        note: &str,
        title: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DbBookNote> {
        let pool = db.pool()?;

        let text = Self::checked_text(note)?;

        let result = sqlx::query(
            "UPDATE book_notes SET note = ?, title = ?, updated_at = ? WHERE user_id = ? AND id = ?",
        )
        .bind(text)
        .bind(title)
        .bind(whole_seconds(now))
        .bind(user_id)
        .bind(note_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Note {} not found for {}", note_id, user_id)));
        }
        Self::get(db, user_id, note_id).await
    }

    pub async fn delete(db: &Database, user_id: &str, note_id: i64) -> Result<()> {
        let pool = db.pool()?;

        let result = sqlx::query("DELETE FROM book_notes WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(note_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Note {} not found for {}", note_id, user_id)));
        }
        Ok(())
    }

    fn checked_text(note: &str) -> Result<&str> {
        let note = note.trim();
        if note.is_empty() {
            return Err(DbError::InvalidData("Note text must not be empty".to_string()));
        }
        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::DatabaseConfig;
    use tempfile::tempdir;

    async fn setup_test_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let config = DatabaseConfig { path: db_path.to_str().unwrap().to_string() };

        let db = Database::new(config).await.unwrap();
        db.run_migrations().await.unwrap();
        (db, dir)
    }

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn note(isbn: &str, text: &str) -> NewBookNote {
        NewBookNote::new("reader".to_string(), isbn.to_string(), text.to_string())
    }

    #[tokio::test]
    async fn test_create_and_list_newest_first() {
        let (db, _dir) = setup_test_db().await;

        NoteQueries::create(&db, note("isbn-a", "Slow start"), ts("2024-01-02T10:00:00Z"))
            .await
            .unwrap();
        NoteQueries::create(
            &db,
            note("isbn-a", "The desert chapters are great").with_title("Arrakis"),
            ts("2024-01-05T10:00:00Z"),
        )
        .await
        .unwrap();
        NoteQueries::create(&db, note("isbn-b", "Other book"), ts("2024-01-06T10:00:00Z"))
            .await
            .unwrap();

        let notes = NoteQueries::list_for_book(&db, "reader", "isbn-a").await.unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].title.as_deref(), Some("Arrakis"));
        assert_eq!(notes[1].note, "Slow start");
        assert_eq!(notes[1].title, None);
    }

    #[tokio::test]
    async fn test_update_changes_text_and_title() {
        let (db, _dir) = setup_test_db().await;

        let created = NoteQueries::create(&db, note("isbn-a", "draft"), ts("2024-01-02T10:00:00Z"))
            .await
            .unwrap();

        let later = ts("2024-01-03T10:00:00Z");
        let updated =
            NoteQueries::update(&db, "reader", created.id, "final", Some("Thoughts"), later)
                .await
                .unwrap();
        assert_eq!(updated.note, "final");
        assert_eq!(updated.title.as_deref(), Some("Thoughts"));
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.created_at, created.created_at);

        assert!(matches!(
            NoteQueries::update(&db, "other", created.id, "hijack", None, later).await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_and_empty_text() {
        let (db, _dir) = setup_test_db().await;

        assert!(matches!(
            NoteQueries::create(&db, note("isbn-a", "  "), ts("2024-01-02T10:00:00Z")).await,
            Err(DbError::InvalidData(_))
        ));

        let created = NoteQueries::create(&db, note("isbn-a", "keep"), ts("2024-01-02T10:00:00Z"))
            .await
            .unwrap();
        NoteQueries::delete(&db, "reader", created.id).await.unwrap();

        assert!(NoteQueries::list_for_book(&db, "reader", "isbn-a").await.unwrap().is_empty());
        assert!(matches!(
            NoteQueries::delete(&db, "reader", created.id).await,
            Err(DbError::NotFound(_))
        ));
    }
}
