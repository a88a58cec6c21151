use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use readlog_common::config::AnalyticsConfig;
use readlog_common::{
    AggregateBucket, DateWindow, ProgressEntry, ProgressFilter, RangeTotals, Result,
};
use serde::{Deserialize, Serialize};

use crate::aggregator::RangeAggregator;
use crate::rollup::{RollupSeriesBuilder, RollupSpan};
use crate::store::{bounded, ReadingStore};

/// Totals for a period next to the same-length period before it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub current: AggregateBucket,
    pub previous: AggregateBucket,
}

impl PeriodComparison {
    /// Percentage change in pages read, `None` when the previous period had none.
    pub fn pages_change_percentage(&self) -> Option<f64> {
        let previous = self.previous.totals.total_pages_read;
        if previous == 0 {
            return None;
        }
        let current = self.current.totals.total_pages_read;
        Some((current as f64 - previous as f64) / previous as f64 * 100.0)
    }
}

/// Read side of the reading log: range totals, rollups and history views.
#[derive(Clone)]
pub struct Analytics {
    store: Arc<dyn ReadingStore>,
    fetch_timeout: Duration,
    aggregator: RangeAggregator,
    rollups: RollupSeriesBuilder,
}

impl Analytics {
    pub fn new(store: Arc<dyn ReadingStore>, config: &AnalyticsConfig) -> Self {
        let fetch_timeout = config.fetch_timeout();
        let aggregator = RangeAggregator::new(store.clone(), fetch_timeout);
        let rollups = RollupSeriesBuilder::new(aggregator.clone());

        Self { store, fetch_timeout, aggregator, rollups }
    }

    pub async fn range_totals(&self, user_id: &str, window: DateWindow) -> Result<RangeTotals> {
        self.aggregator.aggregate(user_id, window).await
    }

    pub async fn month_totals(&self, user_id: &str, year: i32, month: u32) -> Result<RangeTotals> {
        self.range_totals(user_id, DateWindow::month(year, month)?).await
    }

    pub async fn year_totals(&self, user_id: &str, year: i32) -> Result<RangeTotals> {
        self.range_totals(user_id, DateWindow::year(year)?).await
    }

    pub async fn lifetime_totals(&self, user_id: &str) -> Result<RangeTotals> {
        self.aggregator.aggregate_all(user_id).await
    }

    pub async fn rollup(&self, user_id: &str, span: RollupSpan) -> Result<Vec<AggregateBucket>> {
        self.rollups.build(user_id, span).await
    }

    pub async fn rollup_at(
        &self,
        user_id: &str,
        span: RollupSpan,
        anchor: NaiveDate,
    ) -> Result<Vec<AggregateBucket>> {
        self.rollups.build_at(user_id, span, anchor).await
    }

    pub async fn compare(
        &self,
        user_id: &str,
        span: RollupSpan,
        anchor: NaiveDate,
    ) -> Result<PeriodComparison> {
        let (current_label, current_window) = span.covering_window(anchor)?;
        let (previous_label, previous_window) =
            span.covering_window(span.preceding_anchor(anchor)?)?;

        let (current, previous) = tokio::try_join!(
            self.aggregator.aggregate(user_id, current_window),
            self.aggregator.aggregate(user_id, previous_window),
        )?;

        Ok(PeriodComparison {
            current: AggregateBucket {
                label: current_label,
                window: current_window,
                totals: current,
            },
            previous: AggregateBucket {
                label: previous_label,
                window: previous_window,
                totals: previous,
            },
        })
    }

    /// Entries from the trailing `days` days, oldest first.
    pub async fn recent_progress(
        &self,
        user_id: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProgressEntry>> {
        let filter = ProgressFilter::in_window(DateWindow::last_days(now, days));
        bounded(
            "fetch_progress_entries",
            self.fetch_timeout,
            self.store.fetch_progress_entries(user_id, &filter),
        )
        .await
    }

    /// The first `limit` entries recorded for a book, oldest first.
    pub async fn book_history(
        &self,
        user_id: &str,
        book_isbn: &str,
        limit: u32,
    ) -> Result<Vec<ProgressEntry>> {
        let filter = ProgressFilter::for_book(book_isbn).with_limit(limit);
        bounded(
            "fetch_progress_entries",
            self.fetch_timeout,
            self.store.fetch_progress_entries(user_id, &filter),
        )
        .await
    }
}
