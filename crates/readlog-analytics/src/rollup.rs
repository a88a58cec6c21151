use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Utc};
use futures::future::try_join_all;
use readlog_common::window::{month_label, shift_month};
use readlog_common::{AggregateBucket, DateWindow, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregator::RangeAggregator;

/// Preset periods offered by the analytics views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodKind {
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "3months")]
    ThreeMonths,
    #[serde(rename = "6months")]
    SixMonths,
    #[serde(rename = "by-year")]
    ByYear,
}

impl PeriodKind {
    pub fn span(&self) -> RollupSpan {
        match self {
            PeriodKind::Month => RollupSpan::Months(1),
            PeriodKind::ThreeMonths => RollupSpan::Months(3),
            PeriodKind::SixMonths => RollupSpan::Months(6),
            PeriodKind::ByYear => RollupSpan::Years(5),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::Month => "month",
            PeriodKind::ThreeMonths => "3months",
            PeriodKind::SixMonths => "6months",
            PeriodKind::ByYear => "by-year",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "month" => Ok(PeriodKind::Month),
            "3months" => Ok(PeriodKind::ThreeMonths),
            "6months" => Ok(PeriodKind::SixMonths),
            "by-year" => Ok(PeriodKind::ByYear),
            other => Err(Error::InvalidInput(format!(
                "Unknown period: {} (expected month, 3months, 6months or by-year)",
                other
            ))),
        }
    }
}

/// A run of consecutive calendar windows ending at the anchor's month or year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollupSpan {
    Months(u32),
    Years(u32),
}

impl RollupSpan {
    pub fn len(&self) -> u32 {
        match *self {
            RollupSpan::Months(n) | RollupSpan::Years(n) => n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Labelled windows, oldest first, the last one containing `anchor`.
    pub fn windows(&self, anchor: NaiveDate) -> Result<Vec<(String, DateWindow)>> {
        match *self {
            RollupSpan::Months(count) => (0..count)
                .map(|i| {
                    let offset = i as i32 - (count as i32 - 1);
                    let (year, month) = shift_month(anchor.year(), anchor.month(), offset);
                    Ok((month_label(year, month)?, DateWindow::month(year, month)?))
                })
                .collect(),
            RollupSpan::Years(count) => (0..count)
                .map(|i| {
                    let year = anchor.year() - (count as i32 - 1) + i as i32;
                    Ok((year.to_string(), DateWindow::year(year)?))
                })
                .collect(),
        }
    }

    /// One window spanning every period of the run.
    pub fn covering_window(&self, anchor: NaiveDate) -> Result<(String, DateWindow)> {
        let windows = self.windows(anchor)?;
        match (windows.first(), windows.last()) {
            (Some((first_label, first)), Some((last_label, last))) => {
                let label = if windows.len() == 1 {
                    first_label.clone()
                } else {
                    format!("{} to {}", first_label, last_label)
                };
                Ok((label, DateWindow::new(first.start, last.end)?))
            }
            _ => Err(Error::InvalidInput("Rollup span must cover at least one period".to_string())),
        }
    }

    /// Anchor of the run of the same length that ends right before this one.
    pub fn preceding_anchor(&self, anchor: NaiveDate) -> Result<NaiveDate> {
        let (year, month) = match *self {
            RollupSpan::Months(n) => shift_month(anchor.year(), anchor.month(), -(n as i32)),
            RollupSpan::Years(n) => (anchor.year() - n as i32, anchor.month()),
        };
        readlog_common::window::month_start(year, month)
    }
}

impl From<PeriodKind> for RollupSpan {
    fn from(kind: PeriodKind) -> Self {
        kind.span()
    }
}

/// Builds one bucket per calendar window of a [`RollupSpan`].
#[derive(Clone)]
pub struct RollupSeriesBuilder {
    aggregator: RangeAggregator,
}

impl RollupSeriesBuilder {
    pub fn new(aggregator: RangeAggregator) -> Self {
        Self { aggregator }
    }

    /// Series ending at the current UTC month or year.
    pub async fn build(&self, user_id: &str, span: RollupSpan) -> Result<Vec<AggregateBucket>> {
        self.build_at(user_id, span, Utc::now().date_naive()).await
    }

    pub async fn build_at(
        &self,
        user_id: &str,
        span: RollupSpan,
        anchor: NaiveDate,
    ) -> Result<Vec<AggregateBucket>> {
        let windows = span.windows(anchor)?;

        // try_join_all keeps input order regardless of completion order
        let buckets = try_join_all(windows.into_iter().map(|(label, window)| async move {
            let totals = self.aggregator.aggregate(user_id, window).await?;
            Ok::<_, Error>(AggregateBucket { label, window, totals })
        }))
        .await?;

        info!("Built {} rollup buckets for {} ending {}", buckets.len(), user_id, anchor);
        Ok(buckets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ReadingStore;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use readlog_common::{FinishedBook, NewProgressEntry, ProgressEntry, ProgressFilter};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Answers later windows first: each fetch sleeps one second per day
    /// between the window start and `reference`.
    struct StaggeredStore {
        reference: DateTime<Utc>,
        completed: Mutex<Vec<DateTime<Utc>>>,
    }

    #[async_trait]
    impl ReadingStore for StaggeredStore {
        async fn fetch_progress_entries(
            &self,
            user_id: &str,
            filter: &ProgressFilter,
        ) -> Result<Vec<ProgressEntry>> {
            let window = filter.window.ok_or_else(|| Error::InvalidInput("no window".into()))?;
            let days = (self.reference - window.start).num_days().max(0) as u64;
            tokio::time::sleep(Duration::from_secs(days)).await;
            self.completed.lock().unwrap().push(window.start);

            Ok(vec![ProgressEntry {
                id: 1,
                user_id: user_id.to_string(),
                book_isbn: "isbn-a".to_string(),
                absolute_page: window.start.month(),
                session_delta: window.start.month(),
                session_minutes: None,
                total_pages: None,
                recorded_at: window.start,
            }])
        }

        async fn insert_progress_entry(&self, _entry: NewProgressEntry) -> Result<ProgressEntry> {
            Err(Error::DataFetch("read only".to_string()))
        }

        async fn fetch_finished_books(
            &self,
            _user_id: &str,
            _window: Option<DateWindow>,
        ) -> Result<Vec<FinishedBook>> {
            Ok(Vec::new())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_kind_parsing() {
        assert_eq!("month".parse::<PeriodKind>().unwrap(), PeriodKind::Month);
        assert_eq!("3months".parse::<PeriodKind>().unwrap(), PeriodKind::ThreeMonths);
        assert_eq!("6months".parse::<PeriodKind>().unwrap(), PeriodKind::SixMonths);
        assert_eq!("by-year".parse::<PeriodKind>().unwrap(), PeriodKind::ByYear);
        assert!(matches!("weekly".parse::<PeriodKind>(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_period_kind_counts() {
        assert_eq!(PeriodKind::Month.span().len(), 1);
        assert_eq!(PeriodKind::ThreeMonths.span().len(), 3);
        assert_eq!(PeriodKind::SixMonths.span().len(), 6);
        assert_eq!(PeriodKind::ByYear.span(), RollupSpan::Years(5));
    }

    #[test]
    fn test_month_windows_cross_year_boundary() {
        let windows = RollupSpan::Months(6).windows(date(2024, 3, 17)).unwrap();
        let labels: Vec<&str> = windows.iter().map(|(l, _)| l.as_str()).collect();

        assert_eq!(labels, vec!["Oct 2023", "Nov 2023", "Dec 2023", "Jan 2024", "Feb 2024", "Mar 2024"]);
        for pair in windows.windows(2) {
            assert!(pair[0].1.end < pair[1].1.start);
        }
    }

    #[test]
    fn test_year_windows() {
        let windows = RollupSpan::Years(5).windows(date(2024, 6, 1)).unwrap();
        let labels: Vec<&str> = windows.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["2020", "2021", "2022", "2023", "2024"]);
    }

    #[test]
    fn test_covering_window() {
        let (label, window) = RollupSpan::Months(3).covering_window(date(2024, 2, 10)).unwrap();
        assert_eq!(label, "Dec 2023 to Feb 2024");
        assert_eq!(window.start, DateWindow::month(2023, 12).unwrap().start);
        assert_eq!(window.end, DateWindow::month(2024, 2).unwrap().end);

        assert!(RollupSpan::Months(0).covering_window(date(2024, 2, 10)).is_err());
    }

    #[test]
    fn test_preceding_anchor() {
        assert_eq!(RollupSpan::Months(3).preceding_anchor(date(2024, 2, 10)).unwrap(), date(2023, 11, 1));
        assert_eq!(RollupSpan::Years(5).preceding_anchor(date(2024, 2, 10)).unwrap(), date(2019, 2, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_buckets_keep_window_order_when_fetches_finish_out_of_order() {
        let store = Arc::new(StaggeredStore {
            reference: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
            completed: Mutex::new(Vec::new()),
        });
        let aggregator = RangeAggregator::new(store.clone(), Duration::from_secs(3600));
        let builder = RollupSeriesBuilder::new(aggregator);

        let buckets = builder.build_at("reader", RollupSpan::Months(3), date(2024, 3, 10)).await.unwrap();

        let completed = store.completed.lock().unwrap().clone();
        let months: Vec<u32> = completed.iter().map(|start| start.month()).collect();
        assert_eq!(months, vec![3, 2, 1]);

        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Jan 2024", "Feb 2024", "Mar 2024"]);
        let pages: Vec<u64> = buckets.iter().map(|b| b.totals.total_pages_read).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }
}
