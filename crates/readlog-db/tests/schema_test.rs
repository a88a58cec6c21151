use chrono::{DateTime, Utc};
use readlog_common::{BookStatus, NewProgressEntry, ProgressFilter};
use readlog_db::queries::{ProgressQueries, UserBookQueries};
use readlog_db::{Database, DatabaseConfig, DbError, NewUserBook};
use tempfile::tempdir;

fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

async fn open_db(dir: &tempfile::TempDir) -> Database {
    let db_path = dir.path().join("readlog.db");
    let config = DatabaseConfig { path: db_path.to_str().unwrap().to_string() };
    Database::open(config).await.unwrap()
}

#[tokio::test]
async fn test_migrations_create_expected_tables() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir).await;

    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )
    .fetch_all(db.pool().unwrap())
    .await
    .unwrap();

    let table_names: Vec<String> = tables.into_iter().map(|(name,)| name).collect();
    assert!(table_names.contains(&"user_books".to_string()));
    assert!(table_names.contains(&"reading_progress".to_string()));
    assert!(table_names.contains(&"reading_activities".to_string()));
    assert!(table_names.contains(&"lists".to_string()));
    assert!(table_names.contains(&"books_in_lists".to_string()));
    assert!(table_names.contains(&"book_notes".to_string()));
}

#[tokio::test]
async fn test_list_membership_requires_existing_list() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir).await;

    let result = sqlx::query(
        "INSERT INTO books_in_lists (list_id, user_id, isbn, added_at)
         VALUES (42, 'reader', 'isbn-a', '2024-01-01T00:00:00+00:00')",
    )
    .execute(db.pool().unwrap())
    .await;

    assert!(result.is_err(), "memberships must point at a list");
}

#[tokio::test]
async fn test_schema_rejects_negative_pages() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir).await;

    let result = sqlx::query(
        "INSERT INTO reading_progress (user_id, book_isbn, absolute_page, session_delta, recorded_at)
         VALUES ('reader', 'isbn-a', 10, -5, '2024-01-01T00:00:00+00:00')",
    )
    .execute(db.pool().unwrap())
    .await;

    assert!(result.is_err(), "negative session deltas must be rejected");
}

#[tokio::test]
async fn test_schema_rejects_unknown_status() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir).await;

    let result = sqlx::query(
        "INSERT INTO user_books (user_id, isbn, title, status, date_added, date_updated)
         VALUES ('reader', 'isbn-a', 'Title', 'abandoned', '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00')",
    )
    .execute(db.pool().unwrap())
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let dir = tempdir().unwrap();

    {
        let db = open_db(&dir).await;
        let book = NewUserBook::new(
            "reader".to_string(),
            "isbn-a".to_string(),
            "Dune".to_string(),
            BookStatus::CurrentlyReading,
        );
        UserBookQueries::create(&db, book, ts("2024-01-01T09:00:00Z")).await.unwrap();
        let entry = NewProgressEntry::new(
            "reader".to_string(),
            "isbn-a".to_string(),
            40,
            40,
            ts("2024-01-02T21:15:00Z"),
        );
        ProgressQueries::create(&db, entry).await.unwrap();
        db.close().await;
    }

    let db = open_db(&dir).await;
    let book = UserBookQueries::get(&db, "reader", "isbn-a").await.unwrap();
    assert_eq!(book.title, "Dune");

    let rows = ProgressQueries::list(&db, "reader", &ProgressFilter::for_book("isbn-a"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].recorded_at, ts("2024-01-02T21:15:00Z"));
}

#[tokio::test]
async fn test_duplicate_book_per_user() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir).await;
    let now = ts("2024-01-01T09:00:00Z");

    let book = |user: &str| {
        NewUserBook::new(user.to_string(), "isbn-a".to_string(), "Dune".to_string(), BookStatus::WantToRead)
    };

    UserBookQueries::create(&db, book("reader"), now).await.unwrap();
    UserBookQueries::create(&db, book("someone-else"), now).await.unwrap();

    let result = UserBookQueries::create(&db, book("reader"), now).await;
    assert!(matches!(result, Err(DbError::Duplicate(_))));
}
