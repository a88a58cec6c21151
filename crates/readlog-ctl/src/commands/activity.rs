use anyhow::{Context as _, Result};
use readlog_common::ActivityMetadata;
use readlog_db::queries::ActivityQueries;
use readlog_db::DbActivity;

use super::Context;

pub async fn list(ctx: &Context, limit: u32) -> Result<()> {
    let activities =
        ActivityQueries::list_for_user(&ctx.db, &ctx.user_id, i64::from(limit)).await?;

    if activities.is_empty() {
        println!("No activity yet.");
        return Ok(());
    }

    println!("\nRecent activity");
    println!("─────────────────────────────────────────────");
    for activity in &activities {
        println!("  {}", describe(activity)?);
    }
    println!();
    Ok(())
}

fn describe(activity: &DbActivity) -> Result<String> {
    let metadata: ActivityMetadata = serde_json::from_str(&activity.metadata)
        .with_context(|| format!("Malformed metadata on activity {}", activity.id))?;

    let subject = metadata
        .book_title
        .clone()
        .or_else(|| activity.book_isbn.clone())
        .unwrap_or_else(|| "-".to_string());

    let detail = match activity.activity_type.as_str() {
        "BOOK_ADDED" => format!("added {}", subject),
        "BOOK_STATUS_CHANGED" => match (metadata.old_status, metadata.new_status) {
            (Some(old), Some(new)) => {
                format!("moved {} from {} to {}", subject, old.display_name(), new.display_name())
            }
            _ => format!("changed status of {}", subject),
        },
        "BOOK_PROGRESS_UPDATED" => match (metadata.current_page, metadata.total_pages) {
            (Some(page), Some(total)) => format!("reached page {}/{} of {}", page, total, subject),
            (Some(page), None) => format!("reached page {} of {}", page, subject),
            _ => format!("read {}", subject),
        },
        "BOOK_TOTAL_PAGES_UPDATED" => match metadata.total_pages {
            Some(total) => format!("set {} to {} pages", subject, total),
            None => format!("updated page count of {}", subject),
        },
        "BOOK_RATED" => match metadata.rating {
            Some(rating) => format!("rated {} {}/5", subject, rating),
            None => format!("cleared rating of {}", subject),
        },
        "BOOK_DELETED" => format!("removed {}", subject),
        "BOOK_ADDED_TO_LIST" => match &metadata.list_name {
            Some(list) => format!("added {} to list {}", subject, list),
            None => format!("listed {}", subject),
        },
        "BOOK_REMOVED_FROM_LIST" => match &metadata.list_name {
            Some(list) => format!("removed {} from list {}", subject, list),
            None => format!("unlisted {}", subject),
        },
        "LIST_DELETED" => format!("deleted list {}", metadata.list_name.as_deref().unwrap_or("-")),
        other => format!("{} {}", other, subject),
    };

    Ok(format!("{}  {}", activity.created_at.format("%Y-%m-%d %H:%M"), detail))
}
