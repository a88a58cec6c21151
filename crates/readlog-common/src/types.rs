use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::window::DateWindow;

/// Where a book sits on the user's shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookStatus {
    WantToRead,
    CurrentlyReading,
    Read,
    DidNotFinish,
}

impl BookStatus {
    pub const ALL: [BookStatus; 4] = [
        BookStatus::WantToRead,
        BookStatus::CurrentlyReading,
        BookStatus::Read,
        BookStatus::DidNotFinish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::WantToRead => "want-to-read",
            BookStatus::CurrentlyReading => "currently-reading",
            BookStatus::Read => "read",
            BookStatus::DidNotFinish => "did-not-finish",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BookStatus::WantToRead => "Want To Read",
            BookStatus::CurrentlyReading => "Currently Reading",
            BookStatus::Read => "Read",
            BookStatus::DidNotFinish => "Did Not Finish",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "want-to-read" => Ok(BookStatus::WantToRead),
            "currently-reading" => Ok(BookStatus::CurrentlyReading),
            "read" => Ok(BookStatus::Read),
            "did-not-finish" => Ok(BookStatus::DidNotFinish),
            other => Err(Error::InvalidInput(format!("Unknown book status: {}", other))),
        }
    }
}

/// A book on a user's shelf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBook {
    pub user_id: String,
    pub isbn: String,
    pub title: String,
    pub authors: Vec<String>,
    pub pages: Option<u32>,
    pub status: BookStatus,
    pub current_page: Option<u32>,
    pub user_rating: Option<u8>,
    pub date_added: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    /// Set when the status became `read`, cleared on any other status.
    pub date_finished: Option<DateTime<Utc>>,
}

/// One recorded reading session for a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub id: i64,
    pub user_id: String,
    pub book_isbn: String,
    /// Page the reader reported being at when the entry was recorded
    pub absolute_page: u32,
    /// Pages read since the previous entry for the same book
    pub session_delta: u32,
    pub session_minutes: Option<u32>,
    pub total_pages: Option<u32>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProgressEntry {
    pub user_id: String,
    pub book_isbn: String,
    pub absolute_page: u32,
    pub session_delta: u32,
    pub session_minutes: Option<u32>,
    pub total_pages: Option<u32>,
    pub recorded_at: DateTime<Utc>,
}

impl NewProgressEntry {
    pub fn new(
        user_id: String,
        book_isbn: String,
        absolute_page: u32,
        session_delta: u32,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            book_isbn,
            absolute_page,
            session_delta,
            session_minutes: None,
            total_pages: None,
            recorded_at: crate::window::whole_seconds(recorded_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Selection applied by the store when listing progress entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressFilter {
    pub book_isbn: Option<String>,
    pub window: Option<DateWindow>,
    pub limit: Option<u32>,
    pub order: SortOrder,
}

impl ProgressFilter {
    pub fn for_book(isbn: impl Into<String>) -> Self {
        Self { book_isbn: Some(isbn.into()), ..Default::default() }
    }

    pub fn in_window(window: DateWindow) -> Self {
        Self { window: Some(window), ..Default::default() }
    }

    /// Most recent entry for a book.
    pub fn latest_for_book(isbn: impl Into<String>) -> Self {
        Self {
            book_isbn: Some(isbn.into()),
            limit: Some(1),
            order: SortOrder::Descending,
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedBook {
    pub isbn: String,
    pub date_finished: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RangeTotals {
    pub total_pages_read: u64,
    pub total_minutes_read: u64,
    pub total_books_finished: u64,
}

/// Totals for one calendar window, labelled for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateBucket {
    pub label: String,
    pub window: DateWindow,
    #[serde(flatten)]
    pub totals: RangeTotals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    BookAdded,
    BookStatusChanged,
    BookProgressUpdated,
    BookTotalPagesUpdated,
    BookRated,
    BookDeleted,
    BookAddedToList,
    BookRemovedFromList,
    ListDeleted,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::BookAdded => "BOOK_ADDED",
            ActivityType::BookStatusChanged => "BOOK_STATUS_CHANGED",
            ActivityType::BookProgressUpdated => "BOOK_PROGRESS_UPDATED",
            ActivityType::BookTotalPagesUpdated => "BOOK_TOTAL_PAGES_UPDATED",
            ActivityType::BookRated => "BOOK_RATED",
            ActivityType::BookDeleted => "BOOK_DELETED",
            ActivityType::BookAddedToList => "BOOK_ADDED_TO_LIST",
            ActivityType::BookRemovedFromList => "BOOK_REMOVED_FROM_LIST",
            ActivityType::ListDeleted => "LIST_DELETED",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra detail attached to an activity feed row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_status: Option<BookStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<BookStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
}

/// A named, user-curated collection of books from the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingList {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookNote {
    pub id: i64,
    pub user_id: String,
    pub book_isbn: String,
    pub title: Option<String>,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
