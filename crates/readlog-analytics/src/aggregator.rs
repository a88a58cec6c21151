use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use readlog_common::{
    DateWindow, FinishedBook, ProgressEntry, ProgressFilter, RangeTotals, Result,
};
use tracing::debug;

use crate::store::{bounded, ReadingStore};

/// Sums reading activity over inclusive date windows.
#[derive(Clone)]
pub struct RangeAggregator {
    store: Arc<dyn ReadingStore>,
    fetch_timeout: Duration,
}

impl RangeAggregator {
    pub fn new(store: Arc<dyn ReadingStore>, fetch_timeout: Duration) -> Self {
        Self { store, fetch_timeout }
    }

    pub async fn aggregate_between(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<RangeTotals> {
        let window = DateWindow::new(start, end)?;
        self.aggregate(user_id, window).await
    }

    pub async fn aggregate(&self, user_id: &str, window: DateWindow) -> Result<RangeTotals> {
        let filter = ProgressFilter::in_window(window);

        let (entries, finished) = tokio::try_join!(
            bounded(
                "fetch_progress_entries",
                self.fetch_timeout,
                self.store.fetch_progress_entries(user_id, &filter),
            ),
            bounded(
                "fetch_finished_books",
                self.fetch_timeout,
                self.store.fetch_finished_books(user_id, Some(window)),
            ),
        )?;

        let totals = summarize(&entries, &finished, Some(&window));
        debug!(
            "Aggregated {} entries for {} between {} and {}: {:?}",
            entries.len(),
            user_id,
            window.start,
            window.end,
            totals
        );

        Ok(totals)
    }

    /// Totals over everything the user ever recorded.
    pub async fn aggregate_all(&self, user_id: &str) -> Result<RangeTotals> {
        let filter = ProgressFilter::default();

        let (entries, finished) = tokio::try_join!(
            bounded(
                "fetch_progress_entries",
                self.fetch_timeout,
                self.store.fetch_progress_entries(user_id, &filter),
            ),
            bounded(
                "fetch_finished_books",
                self.fetch_timeout,
                self.store.fetch_finished_books(user_id, None),
            ),
        )?;

        Ok(summarize(&entries, &finished, None))
    }
}

/// Folds entries and finished books into totals. With a window, anything
/// outside it is ignored; a book finished more than once counts once.
pub fn summarize(
    entries: &[ProgressEntry],
    finished: &[FinishedBook],
    window: Option<&DateWindow>,
) -> RangeTotals {
    let in_window = |ts: DateTime<Utc>| window.map_or(true, |w| w.contains(ts));

    let mut totals = RangeTotals::default();
    for entry in entries.iter().filter(|e| in_window(e.recorded_at)) {
        totals.total_pages_read += u64::from(entry.session_delta);
        totals.total_minutes_read += u64::from(entry.session_minutes.unwrap_or(0));
    }

    let books: HashSet<&str> = finished
        .iter()
        .filter(|b| in_window(b.date_finished))
        .map(|b| b.isbn.as_str())
        .collect();
    totals.total_books_finished = books.len() as u64;

    totals
}
