use crate::connection::Database;
use crate::error::{DbError, Result};
use crate::models::{DbReadingList, DbUserBook, ListWithBooks};
use chrono::{DateTime, Utc};
use readlog_common::window::whole_seconds;
use tracing::debug;

pub struct ListQueries;

impl ListQueries {
    pub async fn create(
        db: &Database,
        user_id: &str,
        name: &str,
        details: &str,
        now: DateTime<Utc>,
    ) -> Result<DbReadingList> {
        let pool = db.pool()?;

        let name = Self::checked_name(name)?;
        let now = whole_seconds(now);

        let result = sqlx::query(
            r#"
            INSERT INTO lists (user_id, name, details, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(details)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await;

        match result {
            Ok(done) => {
                debug!("Created list {} for {}", name, user_id);
                Self::get(db, user_id, done.last_insert_rowid()).await
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DbError::Duplicate(format!("A list named {} already exists", name)))
            }
            Err(e) => Err(DbError::Sqlx(e)),
        }
    }

    pub async fn get(db: &Database, user_id: &str, list_id: i64) -> Result<DbReadingList> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbReadingList>("SELECT * FROM lists WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(list_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("List {} not found for {}", list_id, user_id)))
    }

    pub async fn find_by_name(db: &Database, user_id: &str, name: &str) -> Result<DbReadingList> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbReadingList>("SELECT * FROM lists WHERE user_id = ? AND name = ?")
            .bind(user_id)
            .bind(name.trim())
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("List {} not found for {}", name, user_id)))
    }

    /// Newest list first.
    pub async fn list_for_user(db: &Database, user_id: &str) -> Result<Vec<DbReadingList>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbReadingList>(
            "SELECT * FROM lists WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(DbError::Sqlx)
    }

    pub async fn update(
        db: &Database,
        user_id: &str,
        list_id: i64,
        name: &str,
        details: &str,
        now: DateTime<Utc>,
    ) -> Result<DbReadingList> {
        let pool = db.pool()?;

        let name = Self::checked_name(name)?;

        let result = sqlx::query(
            "UPDATE lists SET name = ?, details = ?, updated_at = ? WHERE user_id = ? AND id = ?",
        )
        .bind(name)
        .bind(details)
        .bind(whole_seconds(now))
        .bind(user_id)
        .bind(list_id)
        .execute(pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => {
                Err(DbError::NotFound(format!("List {} not found for {}", list_id, user_id)))
            }
            Ok(_) => Self::get(db, user_id, list_id).await,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DbError::Duplicate(format!("A list named {} already exists", name)))
            }
            Err(e) => Err(DbError::Sqlx(e)),
        }
    }

    /// Deletes the list; its memberships go with it.
    pub async fn delete(db: &Database, user_id: &str, list_id: i64) -> Result<()> {
        let pool = db.pool()?;

        let result = sqlx::query("DELETE FROM lists WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(list_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("List {} not found for {}", list_id, user_id)));
        }
        Ok(())
    }

    pub async fn add_book(
        db: &Database,
        user_id: &str,
        list_id: i64,
        isbn: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let pool = db.pool()?;

        // Membership rows carry the owner, so the list must be the caller's
        Self::get(db, user_id, list_id).await?;

        let result = sqlx::query(
            "INSERT INTO books_in_lists (list_id, user_id, isbn, added_at) VALUES (?, ?, ?, ?)",
        )
        .bind(list_id)
        .bind(user_id)
        .bind(isbn)
        .bind(whole_seconds(now))
        .execute(pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DbError::Duplicate(format!("Book {} is already in list {}", isbn, list_id)))
            }
            Err(e) => Err(DbError::Sqlx(e)),
        }
    }

    pub async fn remove_book(db: &Database, user_id: &str, list_id: i64, isbn: &str) -> Result<()> {
        let pool = db.pool()?;

        let result =
            sqlx::query("DELETE FROM books_in_lists WHERE user_id = ? AND list_id = ? AND isbn = ?")
                .bind(user_id)
                .bind(list_id)
                .bind(isbn)
                .execute(pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Book {} is not in list {}", isbn, list_id)));
        }
        Ok(())
    }

    pub async fn contains_book(
        db: &Database,
        user_id: &str,
        list_id: i64,
        isbn: &str,
    ) -> Result<bool> {
        let pool = db.pool()?;

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books_in_lists WHERE user_id = ? AND list_id = ? AND isbn = ?",
        )
        .bind(user_id)
        .bind(list_id)
        .bind(isbn)
        .fetch_one(pool)
        .await?;

        Ok(count > 0)
    }

    /// Shelf rows for the list's members in the order they were added.
    /// Members no longer on the shelf are skipped.
    pub async fn books_in_list(
        db: &Database,
        user_id: &str,
        list_id: i64,
    ) -> Result<Vec<DbUserBook>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbUserBook>(
            r#"
            SELECT ub.* FROM books_in_lists bil
            JOIN user_books ub ON ub.user_id = bil.user_id AND ub.isbn = bil.isbn
            WHERE bil.user_id = ? AND bil.list_id = ?
            ORDER BY bil.added_at ASC, bil.id ASC
            "#,
        )
        .bind(user_id)
        .bind(list_id)
        .fetch_all(pool)
        .await
        .map_err(DbError::Sqlx)
    }

    pub async fn lists_with_books(db: &Database, user_id: &str) -> Result<Vec<ListWithBooks>> {
        let lists = Self::list_for_user(db, user_id).await?;

        let mut result = Vec::with_capacity(lists.len());
        for list in lists {
            let books = Self::books_in_list(db, user_id, list.id).await?;
            result.push(ListWithBooks { list, books });
        }

        Ok(result)
    }

    fn checked_name(name: &str) -> Result<&str> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DbError::InvalidData("List name must not be empty".to_string()));
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::DatabaseConfig;
    use crate::models::NewUserBook;
    use crate::queries::UserBookQueries;
    use readlog_common::BookStatus;
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

    async fn shelve(db: &Database, isbn: &str, title: &str) {
        let book = NewUserBook::new(
            "reader".to_string(),
            isbn.to_string(),
            title.to_string(),
            BookStatus::WantToRead,
        );
        UserBookQueries::create(db, book, ts("2024-01-01T09:00:00Z")).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_and_find_list() {
        let (db, _dir) = setup_test_db().await;

        let created =
            ListQueries::create(&db, "reader", "  Summer  ", "Beach reads", ts("2024-06-01T10:00:00Z"))
                .await
                .unwrap();
        assert_eq!(created.name, "Summer");
        assert_eq!(created.details, "Beach reads");

        let found = ListQueries::find_by_name(&db, "reader", "Summer").await.unwrap();
        assert_eq!(found.id, created.id);
        assert!(matches!(
            ListQueries::find_by_name(&db, "someone-else", "Summer").await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_names_are_unique_per_user() {
        let (db, _dir) = setup_test_db().await;
        let now = ts("2024-06-01T10:00:00Z");

        ListQueries::create(&db, "reader", "Summer", "", now).await.unwrap();
        assert!(matches!(
            ListQueries::create(&db, "reader", "Summer", "", now).await,
            Err(DbError::Duplicate(_))
        ));
        ListQueries::create(&db, "other", "Summer", "", now).await.unwrap();

        assert!(matches!(
            ListQueries::create(&db, "reader", "   ", "", now).await,
            Err(DbError::InvalidData(_))
        ));
    }

    #[tokio::test]
    async fn test_update_renames_and_rejects_taken_name() {
        let (db, _dir) = setup_test_db().await;
        let now = ts("2024-06-01T10:00:00Z");

        let summer = ListQueries::create(&db, "reader", "Summer", "", now).await.unwrap();
        ListQueries::create(&db, "reader", "Winter", "", now).await.unwrap();

        let later = ts("2024-07-01T10:00:00Z");
        let renamed =
            ListQueries::update(&db, "reader", summer.id, "Holiday", "Trips", later).await.unwrap();
        assert_eq!(renamed.name, "Holiday");
        assert_eq!(renamed.details, "Trips");
        assert_eq!(renamed.updated_at, later);
        assert_eq!(renamed.created_at, now);

        assert!(matches!(
            ListQueries::update(&db, "reader", summer.id, "Winter", "", later).await,
            Err(DbError::Duplicate(_))
        ));
        assert!(matches!(
            ListQueries::update(&db, "reader", 999, "Other", "", later).await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_lists_are_newest_first() {
        let (db, _dir) = setup_test_db().await;

        ListQueries::create(&db, "reader", "Older", "", ts("2024-01-01T10:00:00Z")).await.unwrap();
        ListQueries::create(&db, "reader", "Newer", "", ts("2024-02-01T10:00:00Z")).await.unwrap();

        let names: Vec<String> = ListQueries::list_for_user(&db, "reader")
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Newer", "Older"]);
    }

    #[tokio::test]
    async fn test_membership_lifecycle() {
        let (db, _dir) = setup_test_db().await;
        shelve(&db, "isbn-a", "Dune").await;
        shelve(&db, "isbn-b", "Emma").await;

        let list = ListQueries::create(&db, "reader", "Classics", "", ts("2024-06-01T10:00:00Z"))
            .await
            .unwrap();
        ListQueries::add_book(&db, "reader", list.id, "isbn-b", ts("2024-06-01T11:00:00Z"))
            .await
            .unwrap();
        ListQueries::add_book(&db, "reader", list.id, "isbn-a", ts("2024-06-01T12:00:00Z"))
            .await
            .unwrap();

        assert!(ListQueries::contains_book(&db, "reader", list.id, "isbn-a").await.unwrap());
        assert!(matches!(
            ListQueries::add_book(&db, "reader", list.id, "isbn-a", ts("2024-06-02T10:00:00Z")).await,
            Err(DbError::Duplicate(_))
        ));

        let titles: Vec<String> = ListQueries::books_in_list(&db, "reader", list.id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Emma", "Dune"]);

        ListQueries::remove_book(&db, "reader", list.id, "isbn-a").await.unwrap();
        assert!(!ListQueries::contains_book(&db, "reader", list.id, "isbn-a").await.unwrap());
        assert!(matches!(
            ListQueries::remove_book(&db, "reader", list.id, "isbn-a").await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_books_removed_from_shelf_are_skipped() {
        let (db, _dir) = setup_test_db().await;
        shelve(&db, "isbn-a", "Dune").await;
        shelve(&db, "isbn-b", "Emma").await;

        let list = ListQueries::create(&db, "reader", "Classics", "", ts("2024-06-01T10:00:00Z"))
            .await
            .unwrap();
        let now = ts("2024-06-01T11:00:00Z");
        ListQueries::add_book(&db, "reader", list.id, "isbn-a", now).await.unwrap();
        ListQueries::add_book(&db, "reader", list.id, "isbn-b", now).await.unwrap();

        UserBookQueries::delete(&db, "reader", "isbn-a").await.unwrap();

        let grouped = ListQueries::lists_with_books(&db, "reader").await.unwrap();
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].books.len(), 1);
        assert_eq!(grouped[0].books[0].isbn, "isbn-b");
    }

    #[tokio::test]
    async fn test_delete_list_drops_memberships() {
        let (db, _dir) = setup_test_db().await;
        shelve(&db, "isbn-a", "Dune").await;

        let list = ListQueries::create(&db, "reader", "Classics", "", ts("2024-06-01T10:00:00Z"))
            .await
            .unwrap();
        ListQueries::add_book(&db, "reader", list.id, "isbn-a", ts("2024-06-01T11:00:00Z"))
            .await
            .unwrap();

        ListQueries::delete(&db, "reader", list.id).await.unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books_in_lists")
            .fetch_one(db.pool().unwrap())
            .await
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(matches!(
            ListQueries::delete(&db, "reader", list.id).await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cannot_add_to_another_users_list() {
        let (db, _dir) = setup_test_db().await;

        let theirs = ListQueries::create(&db, "other", "Theirs", "", ts("2024-06-01T10:00:00Z"))
            .await
            .unwrap();
        assert!(matches!(
            ListQueries::add_book(&db, "reader", theirs.id, "isbn-a", ts("2024-06-01T11:00:00Z"))
                .await,
            Err(DbError::NotFound(_))
        ));
    }
}
