use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use readlog_common::{NewProgressEntry, ProgressEntry, ProgressFilter, Result};
use tracing::info;

use crate::delta::session_delta;
use crate::store::{bounded, ReadingStore};

/// A new page position reported by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub book_isbn: String,
    pub absolute_page: u32,
    pub session_minutes: Option<u32>,
    pub total_pages: Option<u32>,
}

impl ProgressUpdate {
    pub fn new(book_isbn: impl Into<String>, absolute_page: u32) -> Self {
        Self { book_isbn: book_isbn.into(), absolute_page, session_minutes: None, total_pages: None }
    }

    pub fn with_minutes(mut self, minutes: u32) -> Self {
        self.session_minutes = Some(minutes);
        self
    }

    pub fn with_total_pages(mut self, pages: u32) -> Self {
        self.total_pages = Some(pages);
        self
    }
}

/// Records progress rows, deriving each row's session delta from the
/// latest stored position of the same book.
#[derive(Clone)]
pub struct ProgressTracker {
    store: Arc<dyn ReadingStore>,
    fetch_timeout: Duration,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn ReadingStore>, fetch_timeout: Duration) -> Self {
        Self { store, fetch_timeout }
    }

    pub async fn record(
        &self,
        user_id: &str,
        update: ProgressUpdate,
        recorded_at: DateTime<Utc>,
    ) -> Result<ProgressEntry> {
        let previous = bounded(
            "fetch_progress_entries",
            self.fetch_timeout,
            self.store
                .fetch_progress_entries(user_id, &ProgressFilter::latest_for_book(&update.book_isbn)),
        )
        .await?
        .into_iter()
        .next();

        let previous_page = previous.as_ref().map(|e| e.absolute_page);
        let delta = session_delta(previous_page, update.absolute_page);

        let entry = NewProgressEntry {
            session_minutes: update.session_minutes,
            total_pages: update.total_pages,
            ..NewProgressEntry::new(
                user_id.to_string(),
                update.book_isbn,
                update.absolute_page,
                delta,
                recorded_at,
            )
        };

        let saved = bounded(
            "insert_progress_entry",
            self.fetch_timeout,
            self.store.insert_progress_entry(entry),
        )
        .await?;

        info!(
            "Recorded progress for {} on {}: page {} ({} pages this session)",
            user_id, saved.book_isbn, saved.absolute_page, saved.session_delta
        );

        Ok(saved)
    }
}
