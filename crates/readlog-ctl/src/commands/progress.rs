use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use readlog_analytics::ProgressUpdate;
use readlog_common::{ActivityMetadata, ActivityType, ProgressEntry, UserBook};
use readlog_db::queries::UserBookQueries;
use readlog_db::NewActivity;

use super::{format_minutes, Context};

pub async fn log(ctx: &Context, isbn: &str, page: u32, minutes: Option<u32>) -> Result<()> {
    let book = UserBookQueries::get(&ctx.db, &ctx.user_id, isbn)
        .await
        .with_context(|| format!("Book {} is not on your shelf", isbn))?
        .into_user_book()?;

    let entry = record_progress(ctx, &book, page, minutes, Utc::now()).await?;

    ctx.log_activity(
        NewActivity::new(ctx.user_id.clone(), ActivityType::BookProgressUpdated, Some(isbn.to_string()))
            .with_metadata(ActivityMetadata {
                current_page: Some(page),
                total_pages: book.pages,
                book_title: Some(book.title.clone()),
                ..Default::default()
            }),
    )
    .await;

    match book.pages {
        Some(total) => println!(
            "\"{}\": page {}/{} (+{} pages)",
            book.title, entry.absolute_page, total, entry.session_delta
        ),
        None => println!(
            "\"{}\": page {} (+{} pages)",
            book.title, entry.absolute_page, entry.session_delta
        ),
    }
    Ok(())
}

/// Moves the shelf row to `page`, then appends the progress entry. A failed
/// shelf update leaves the progress log untouched.
async fn record_progress(
    ctx: &Context,
    book: &UserBook,
    page: u32,
    minutes: Option<u32>,
    now: DateTime<Utc>,
) -> Result<ProgressEntry> {
    UserBookQueries::update_progress(&ctx.db, &ctx.user_id, &book.isbn, page, now).await?;

    let mut update = ProgressUpdate::new(book.isbn.as_str(), page);
    if let Some(minutes) = minutes {
        update = update.with_minutes(minutes);
    }
    if let Some(pages) = book.pages {
        update = update.with_total_pages(pages);
    }

    Ok(ctx.tracker.record(&ctx.user_id, update, now).await?)
}

pub async fn history(ctx: &Context, isbn: &str, limit: u32) -> Result<()> {
    let entries = ctx.analytics.book_history(&ctx.user_id, isbn, limit).await?;

    if entries.is_empty() {
        println!("No progress recorded for {}", isbn);
        return Ok(());
    }

    println!("\nProgress for {}", isbn);
    println!("─────────────────────────────────────────────");
    print_entries(&entries);
    Ok(())
}

pub async fn recent(ctx: &Context, days: u32) -> Result<()> {
    let entries = ctx.analytics.recent_progress(&ctx.user_id, days, Utc::now()).await?;

    if entries.is_empty() {
        println!("No reading in the last {} days", days);
        return Ok(());
    }

    let pages: u64 = entries.iter().map(|e| u64::from(e.session_delta)).sum();
    let minutes: u64 = entries.iter().map(|e| u64::from(e.session_minutes.unwrap_or(0))).sum();

    println!("\nLast {} days: {} pages, {}", days, pages, format_minutes(minutes));
    println!("─────────────────────────────────────────────");
    print_entries(&entries);
    Ok(())
}

fn print_entries(entries: &[ProgressEntry]) {
    for entry in entries {
        let minutes = entry.session_minutes.map(|m| format!(", {} min", m)).unwrap_or_default();
        println!(
            "  {}  {:<16} page {:>5}  +{}{}",
            entry.recorded_at.format("%Y-%m-%d %H:%M"),
            entry.book_isbn,
            entry.absolute_page,
            entry.session_delta,
            minutes
        );
    }
    println!();
}
