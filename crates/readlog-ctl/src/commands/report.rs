use anyhow::Result;
use chrono::{NaiveDate, Utc};
use readlog_analytics::PeriodKind;
use readlog_common::{AggregateBucket, DateWindow};

use super::{format_minutes, print_totals, Context};

/// Totals between two calendar days, both included.
pub async fn range(ctx: &Context, first: NaiveDate, last: NaiveDate) -> Result<()> {
    let window = DateWindow::days(first, last)?;
    let totals = ctx.analytics.range_totals(&ctx.user_id, window).await?;

    println!("\nReading from {} to {}", first, last);
    println!("═══════════════════════════════════════════════\n");
    print_totals(&totals);
    println!();
    Ok(())
}

pub async fn rollup(ctx: &Context, period: PeriodKind) -> Result<()> {
    let buckets = ctx.analytics.rollup(&ctx.user_id, period.into()).await?;

    println!("\nReading by period ({})", period);
    println!("═══════════════════════════════════════════════\n");
    print_buckets(&buckets);
    Ok(())
}

pub async fn compare(ctx: &Context, period: PeriodKind) -> Result<()> {
    let comparison =
        ctx.analytics.compare(&ctx.user_id, period.into(), Utc::now().date_naive()).await?;

    println!("\n{} vs {}", comparison.current.label, comparison.previous.label);
    println!("═══════════════════════════════════════════════\n");

    println!("{}", comparison.current.label);
    print_totals(&comparison.current.totals);
    println!("\n{}", comparison.previous.label);
    print_totals(&comparison.previous.totals);

    match comparison.pages_change_percentage() {
        Some(change) => println!("\nPages read changed by {:+.1}%", change),
        None => println!("\nNo pages read in the previous period"),
    }
    println!();
    Ok(())
}

pub async fn lifetime(ctx: &Context) -> Result<()> {
    let totals = ctx.analytics.lifetime_totals(&ctx.user_id).await?;

    println!("\nLifetime reading for {}", ctx.user_id);
    println!("═══════════════════════════════════════════════\n");
    print_totals(&totals);
    println!();
    Ok(())
}

fn print_buckets(buckets: &[AggregateBucket]) {
    let widest = buckets.iter().map(|b| b.totals.total_pages_read).max().unwrap_or(0);

    for bucket in buckets {
        let totals = &bucket.totals;
        println!(
            "  {:<10} {:>6} pages  {:>8}  {:>3} finished  {}",
            bucket.label,
            totals.total_pages_read,
            format_minutes(totals.total_minutes_read),
            totals.total_books_finished,
            bar(totals.total_pages_read, widest)
        );
    }
    println!();
}

fn bar(value: u64, widest: u64) -> String {
    const WIDTH: u64 = 30;
    if widest == 0 {
        return String::new();
    }
    "█".repeat((value * WIDTH / widest) as usize)
}
