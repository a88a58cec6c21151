use anyhow::{Context as _, Result};
use readlog_analytics::{Analytics, ProgressTracker, ReadingStore};
use readlog_common::RangeTotals;
use readlog_db::queries::ActivityQueries;
use readlog_db::{Database, NewActivity};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ReadlogConfig;

pub mod activity;
pub mod book;
pub mod lists;
pub mod notes;
pub mod progress;
pub mod report;

/// Everything a command needs, opened once per invocation.
pub struct Context {
    pub db: Database,
    pub user_id: String,
    pub analytics: Analytics,
    pub tracker: ProgressTracker,
}

impl Context {
    pub async fn open(config: &ReadlogConfig, user_override: Option<String>) -> Result<Self> {
        let db = Database::open(config.database.to_db_config())
            .await
            .with_context(|| format!("Failed to open database at {}", config.database.path))?;

        let store: Arc<dyn ReadingStore> = Arc::new(db.clone());
        let analytics = Analytics::new(store.clone(), &config.analytics);
        let tracker = ProgressTracker::new(store, config.analytics.fetch_timeout());
        let user_id = user_override.unwrap_or_else(|| config.general.user_id.clone());

        Ok(Self { db, user_id, analytics, tracker })
    }

    /// Appends to the activity feed. The feed is informational, so a failed
    /// write is logged and the command carries on.
    pub async fn log_activity(&self, activity: NewActivity) {
        let activity_type = activity.activity_type;
        match ActivityQueries::create(&self.db, activity).await {
            Ok(id) => debug!("Logged {} activity {}", activity_type, id),
            Err(e) => warn!("Failed to log {} activity: {}", activity_type, e),
        }
    }

    pub async fn close(self) {
        self.db.close().await;
    }
}

pub(crate) fn format_minutes(total: u64) -> String {
    format!("{}h {}m", total / 60, total % 60)
}

pub(crate) fn print_totals(totals: &RangeTotals) {
    println!("  Pages read:     {}", totals.total_pages_read);
    println!("  Time reading:   {}", format_minutes(totals.total_minutes_read));
    println!("  Books finished: {}", totals.total_books_finished);
}
