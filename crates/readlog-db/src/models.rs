use chrono::{DateTime, Utc};
use readlog_common::{
    ActivityMetadata, ActivityType, BookNote, BookStatus, ProgressEntry, ReadingList, UserBook,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{DbError, Result};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbUserBook {
    pub id: i64,
    pub user_id: String,
    pub isbn: String,
    pub title: String,
    pub authors: String, // JSON array
    pub pages: Option<i64>,
    pub status: String,
    pub current_page: Option<i64>,
    pub user_rating: Option<i64>,
    pub date_added: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    pub date_finished: Option<DateTime<Utc>>,
}

impl DbUserBook {
    pub fn into_user_book(self) -> Result<UserBook> {
        let status = self
            .status
            .parse::<BookStatus>()
            .map_err(|e| DbError::InvalidData(e.to_string()))?;
        let authors: Vec<String> = serde_json::from_str(&self.authors)?;
        let user_rating = self
            .user_rating
            .map(|r| {
                u8::try_from(r)
                    .map_err(|_| DbError::InvalidData(format!("Rating out of range: {}", r)))
            })
            .transpose()?;

        Ok(UserBook {
            user_id: self.user_id,
            isbn: self.isbn,
            title: self.title,
            authors,
            pages: self.pages.map(|p| column_u32(p, "pages")).transpose()?,
            status,
            current_page: self.current_page.map(|p| column_u32(p, "current_page")).transpose()?,
            user_rating,
            date_added: self.date_added,
            date_updated: self.date_updated,
            date_finished: self.date_finished,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserBook {
    pub user_id: String,
    pub isbn: String,
    pub title: String,
    pub authors: Vec<String>,
    pub pages: Option<u32>,
    pub status: BookStatus,
}

impl NewUserBook {
    pub fn new(user_id: String, isbn: String, title: String, status: BookStatus) -> Self {
        Self { user_id, isbn, title, authors: Vec::new(), pages: None, status }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbProgressEntry {
    pub id: i64,
    pub user_id: String,
    pub book_isbn: String,
    pub absolute_page: i64,
    pub session_delta: i64,
    pub session_minutes: Option<i64>,
    pub total_pages: Option<i64>,
    pub recorded_at: DateTime<Utc>,
}

impl DbProgressEntry {
    pub fn into_entry(self) -> Result<ProgressEntry> {
        Ok(ProgressEntry {
            id: self.id,
            user_id: self.user_id,
            book_isbn: self.book_isbn,
            absolute_page: column_u32(self.absolute_page, "absolute_page")?,
            session_delta: column_u32(self.session_delta, "session_delta")?,
            session_minutes: self
                .session_minutes
                .map(|m| column_u32(m, "session_minutes"))
                .transpose()?,
            total_pages: self.total_pages.map(|p| column_u32(p, "total_pages")).transpose()?,
            recorded_at: self.recorded_at,
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbActivity {
    pub id: i64,
    pub user_id: String,
    pub activity_type: String,
    pub book_isbn: Option<String>,
    pub metadata: String, // JSON object
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewActivity {
    pub user_id: String,
    pub activity_type: ActivityType,
    pub book_isbn: Option<String>,
    pub metadata: ActivityMetadata,
}

impl NewActivity {
    pub fn new(user_id: String, activity_type: ActivityType, book_isbn: Option<String>) -> Self {
        Self { user_id, activity_type, book_isbn, metadata: ActivityMetadata::default() }
    }

    pub fn with_metadata(mut self, metadata: ActivityMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbReadingList {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbReadingList> for ReadingList {
    fn from(row: DbReadingList) -> Self {
        ReadingList {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            details: row.details,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbBookNote {
    pub id: i64,
    pub user_id: String,
    pub book_isbn: String,
    pub title: Option<String>,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbBookNote> for BookNote {
    fn from(row: DbBookNote) -> Self {
        BookNote {
            id: row.id,
            user_id: row.user_id,
            book_isbn: row.book_isbn,
            title: row.title,
            note: row.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBookNote {
    pub user_id: String,
    pub book_isbn: String,
    pub title: Option<String>,
    pub note: String,
}

impl NewBookNote {
    pub fn new(user_id: String, book_isbn: String, note: String) -> Self {
        Self { user_id, book_isbn, title: None, note }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A list together with the shelf books it currently holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListWithBooks {
    pub list: DbReadingList,
    pub books: Vec<DbUserBook>,
}

fn column_u32(value: i64, column: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| DbError::InvalidData(format!("{} out of range: {}", column, value)))
}
