use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use readlog_common::{
    DateWindow, Error, FinishedBook, NewProgressEntry, ProgressEntry, ProgressFilter, Result,
    SortOrder,
};
use readlog_db::queries::{ProgressQueries, UserBookQueries};
use readlog_db::{Database, DbError};
use tokio::sync::RwLock;
use tracing::debug;

/// Where progress entries and finished books come from.
///
/// Implementations return progress entries ordered by `recorded_at`
/// (ascending unless the filter asks otherwise) and never modify stored rows.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn fetch_progress_entries(
        &self,
        user_id: &str,
        filter: &ProgressFilter,
    ) -> Result<Vec<ProgressEntry>>;

    async fn insert_progress_entry(&self, entry: NewProgressEntry) -> Result<ProgressEntry>;

    /// Books the user marked as read, limited to an inclusive finish window if given.
    async fn fetch_finished_books(
        &self,
        user_id: &str,
        window: Option<DateWindow>,
    ) -> Result<Vec<FinishedBook>>;
}

/// Runs a store call under a deadline; expiry surfaces as [`Error::Timeout`].
pub(crate) async fn bounded<T, F>(operation: &str, limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout { operation: operation.to_string(), after: limit }),
    }
}

fn fetch_failure(err: DbError) -> Error {
    Error::DataFetch(err.to_string())
}

#[async_trait]
impl ReadingStore for Database {
    async fn fetch_progress_entries(
        &self,
        user_id: &str,
        filter: &ProgressFilter,
    ) -> Result<Vec<ProgressEntry>> {
        let rows = ProgressQueries::list(self, user_id, filter).await.map_err(fetch_failure)?;
        rows.into_iter().map(|row| row.into_entry().map_err(fetch_failure)).collect()
    }

    async fn insert_progress_entry(&self, entry: NewProgressEntry) -> Result<ProgressEntry> {
        let row = ProgressQueries::create(self, entry).await.map_err(fetch_failure)?;
        row.into_entry().map_err(fetch_failure)
    }

    async fn fetch_finished_books(
        &self,
        user_id: &str,
        window: Option<DateWindow>,
    ) -> Result<Vec<FinishedBook>> {
        let rows = UserBookQueries::list_finished_in_range(
            self,
            user_id,
            window.map(|w| w.start),
            window.map(|w| w.end),
        )
        .await
        .map_err(fetch_failure)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                row.date_finished.map(|date_finished| FinishedBook { isbn: row.isbn, date_finished })
            })
            .collect())
    }
}

/// In-process store, handy for tests and for callers without a database.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<Vec<ProgressEntry>>,
    finished: RwLock<HashMap<String, Vec<FinishedBook>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mark_finished(&self, user_id: &str, isbn: &str, date_finished: DateTime<Utc>) {
        let mut finished = self.finished.write().await;
        finished
            .entry(user_id.to_string())
            .or_default()
            .push(FinishedBook { isbn: isbn.to_string(), date_finished });
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn fetch_progress_entries(
        &self,
        user_id: &str,
        filter: &ProgressFilter,
    ) -> Result<Vec<ProgressEntry>> {
        let entries = self.entries.read().await;

        let mut selected: Vec<ProgressEntry> = entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| filter.book_isbn.as_ref().map_or(true, |isbn| &e.book_isbn == isbn))
            .filter(|e| filter.window.map_or(true, |w| w.contains(e.recorded_at)))
            .cloned()
            .collect();

        selected.sort_by_key(|e| (e.recorded_at, e.id));
        if filter.order == SortOrder::Descending {
            selected.reverse();
        }
        if let Some(limit) = filter.limit {
            selected.truncate(limit as usize);
        }

        debug!("Memory store returned {} entries for {}", selected.len(), user_id);
        Ok(selected)
    }

    async fn insert_progress_entry(&self, entry: NewProgressEntry) -> Result<ProgressEntry> {
        let mut entries = self.entries.write().await;

        let saved = ProgressEntry {
            id: entries.len() as i64 + 1,
            user_id: entry.user_id,
            book_isbn: entry.book_isbn,
            absolute_page: entry.absolute_page,
            session_delta: entry.session_delta,
            session_minutes: entry.session_minutes,
            total_pages: entry.total_pages,
            recorded_at: readlog_common::window::whole_seconds(entry.recorded_at),
        };
        entries.push(saved.clone());

        Ok(saved)
    }

    async fn fetch_finished_books(
        &self,
        user_id: &str,
        window: Option<DateWindow>,
    ) -> Result<Vec<FinishedBook>> {
        let finished = self.finished.read().await;

        Ok(finished
            .get(user_id)
            .map(|books| {
                books
                    .iter()
                    .filter(|b| window.map_or(true, |w| w.contains(b.date_finished)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
