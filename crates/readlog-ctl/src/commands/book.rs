use anyhow::{Context as _, Result};
use chrono::Utc;
use readlog_analytics::{group_by_status, ProgressUpdate};
use readlog_common::{ActivityMetadata, ActivityType, BookStatus, UserBook};
use readlog_db::queries::UserBookQueries;
use readlog_db::{NewActivity, NewUserBook};

use super::Context;

pub(super) async fn load_book(ctx: &Context, isbn: &str) -> Result<UserBook> {
    let row = UserBookQueries::get(&ctx.db, &ctx.user_id, isbn)
        .await
        .with_context(|| format!("Book {} is not on your shelf", isbn))?;
    Ok(row.into_user_book()?)
}

pub async fn add(
    ctx: &Context,
    isbn: &str,
    title: &str,
    authors: Vec<String>,
    pages: Option<u32>,
    status: BookStatus,
) -> Result<()> {
    let book = NewUserBook {
        authors,
        pages,
        ..NewUserBook::new(ctx.user_id.clone(), isbn.to_string(), title.to_string(), status)
    };

    let now = Utc::now();
    let saved = UserBookQueries::create(&ctx.db, book, now).await?.into_user_book()?;

    // Page 0 baseline so the first logged session counts from the start of the book
    if let Some(total) = saved.pages {
        let baseline = ProgressUpdate::new(saved.isbn.clone(), 0).with_total_pages(total);
        ctx.tracker.record(&ctx.user_id, baseline, now).await?;
    }

    ctx.log_activity(
        NewActivity::new(ctx.user_id.clone(), ActivityType::BookAdded, Some(saved.isbn.clone()))
            .with_metadata(ActivityMetadata {
                new_status: Some(saved.status),
                book_title: Some(saved.title.clone()),
                ..Default::default()
            }),
    )
    .await;

    println!("Added \"{}\" ({}) to {}", saved.title, saved.isbn, saved.status.display_name());
    Ok(())
}

pub async fn set_status(ctx: &Context, isbn: &str, status: BookStatus) -> Result<()> {
    let book = load_book(ctx, isbn).await?;
    if book.status == status {
        println!("\"{}\" is already {}", book.title, status.display_name());
        return Ok(());
    }

    UserBookQueries::update_status(&ctx.db, &ctx.user_id, isbn, status, Utc::now()).await?;

    ctx.log_activity(
        NewActivity::new(ctx.user_id.clone(), ActivityType::BookStatusChanged, Some(isbn.to_string()))
            .with_metadata(ActivityMetadata {
                old_status: Some(book.status),
                new_status: Some(status),
                book_title: Some(book.title.clone()),
                ..Default::default()
            }),
    )
    .await;

    println!("\"{}\": {} -> {}", book.title, book.status.display_name(), status.display_name());
    Ok(())
}

pub async fn rate(ctx: &Context, isbn: &str, rating: Option<u8>) -> Result<()> {
    let book = load_book(ctx, isbn).await?;

    UserBookQueries::update_rating(&ctx.db, &ctx.user_id, isbn, rating, Utc::now()).await?;

    ctx.log_activity(
        NewActivity::new(ctx.user_id.clone(), ActivityType::BookRated, Some(isbn.to_string()))
            .with_metadata(ActivityMetadata {
                rating,
                book_title: Some(book.title.clone()),
                ..Default::default()
            }),
    )
    .await;

    match rating {
        Some(stars) => println!("Rated \"{}\" {}/5", book.title, stars),
        None => println!("Cleared rating for \"{}\"", book.title),
    }
    Ok(())
}

pub async fn set_pages(ctx: &Context, isbn: &str, pages: u32) -> Result<()> {
    let book = load_book(ctx, isbn).await?;

    UserBookQueries::update_total_pages(&ctx.db, &ctx.user_id, isbn, pages, Utc::now()).await?;

    ctx.log_activity(
        NewActivity::new(
            ctx.user_id.clone(),
            ActivityType::BookTotalPagesUpdated,
            Some(isbn.to_string()),
        )
        .with_metadata(ActivityMetadata {
            total_pages: Some(pages),
            book_title: Some(book.title.clone()),
            ..Default::default()
        }),
    )
    .await;

    println!("\"{}\" now has {} pages", book.title, pages);
    Ok(())
}

pub async fn list(ctx: &Context) -> Result<()> {
    let books = UserBookQueries::list_for_user(&ctx.db, &ctx.user_id)
        .await?
        .into_iter()
        .map(|row| row.into_user_book())
        .collect::<readlog_db::Result<Vec<_>>>()?;

    let shelf = group_by_status(books);
    if shelf.total() == 0 {
        println!("Your shelf is empty.");
        return Ok(());
    }

    for (status, books) in shelf.iter() {
        if books.is_empty() {
            continue;
        }

        println!("\n{} ({})", status.display_name(), books.len());
        println!("─────────────────────────────────────────────");
        for book in books {
            println!("  {}", describe(book));
        }
    }

    println!();
    Ok(())
}

pub async fn remove(ctx: &Context, isbn: &str) -> Result<()> {
    let book = load_book(ctx, isbn).await?;

    UserBookQueries::delete(&ctx.db, &ctx.user_id, isbn).await?;

    ctx.log_activity(
        NewActivity::new(ctx.user_id.clone(), ActivityType::BookDeleted, Some(isbn.to_string()))
            .with_metadata(ActivityMetadata {
                book_title: Some(book.title.clone()),
                ..Default::default()
            }),
    )
    .await;

    println!("Removed \"{}\" from your shelf", book.title);
    Ok(())
}

fn describe(book: &UserBook) -> String {
    let mut line = format!("{} [{}]", book.title, book.isbn);

    if !book.authors.is_empty() {
        line.push_str(&format!(" by {}", book.authors.join(", ")));
    }

    match (book.current_page, book.pages) {
        (Some(current), Some(total)) => line.push_str(&format!(", page {}/{}", current, total)),
        (Some(current), None) => line.push_str(&format!(", page {}", current)),
        (None, Some(total)) => line.push_str(&format!(", {} pages", total)),
        (None, None) => {}
    }

    if let Some(rating) = book.user_rating {
        line.push_str(&format!(", {}/5", rating));
    }

    if let Some(finished) = book.date_finished {
        line.push_str(&format!(", finished {}", finished.format("%Y-%m-%d")));
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::test_context;
    use readlog_db::queries::ActivityQueries;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_add_and_change_status() {
        let dir = tempdir().unwrap();
        let ctx = test_context(&dir).await;

        add(&ctx, "isbn-a", "Dune", vec!["Frank Herbert".into()], Some(412), BookStatus::WantToRead)
            .await
            .unwrap();
        set_status(&ctx, "isbn-a", BookStatus::Read).await.unwrap();

        let book = load_book(&ctx, "isbn-a").await.unwrap();
        assert_eq!(book.status, BookStatus::Read);
        assert!(book.date_finished.is_some());
        assert_eq!(book.authors, vec!["Frank Herbert".to_string()]);

        let feed = ActivityQueries::list_for_user(&ctx.db, "reader", 10).await.unwrap();
        let types: Vec<&str> = feed.iter().map(|a| a.activity_type.as_str()).collect();
        assert!(types.contains(&"BOOK_ADDED"));
        assert!(types.contains(&"BOOK_STATUS_CHANGED"));
    }

    #[tokio::test]
    async fn test_same_status_is_a_no_op() {
        let dir = tempdir().unwrap();
        let ctx = test_context(&dir).await;

        add(&ctx, "isbn-a", "Dune", Vec::new(), None, BookStatus::CurrentlyReading).await.unwrap();
        set_status(&ctx, "isbn-a", BookStatus::Read).await.unwrap();
        let first = load_book(&ctx, "isbn-a").await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        set_status(&ctx, "isbn-a", BookStatus::Read).await.unwrap();
        let second = load_book(&ctx, "isbn-a").await.unwrap();

        assert!(first.date_finished.is_some());
        assert_eq!(second.date_finished, first.date_finished);
        assert_eq!(second.date_updated, first.date_updated);

        let feed = ActivityQueries::list_for_user(&ctx.db, "reader", 10).await.unwrap();
        let status_changes =
            feed.iter().filter(|a| a.activity_type == "BOOK_STATUS_CHANGED").count();
        assert_eq!(status_changes, 1);
    }

    #[tokio::test]
    async fn test_add_with_pages_records_baseline() {
        let dir = tempdir().unwrap();
        let ctx = test_context(&dir).await;

        add(&ctx, "isbn-a", "Dune", Vec::new(), Some(412), BookStatus::CurrentlyReading)
            .await
            .unwrap();
        add(&ctx, "isbn-b", "Unknown length", Vec::new(), None, BookStatus::WantToRead)
            .await
            .unwrap();

        let history = ctx.analytics.book_history("reader", "isbn-a", 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].absolute_page, 0);
        assert_eq!(history[0].session_delta, 0);
        assert_eq!(history[0].total_pages, Some(412));

        assert!(ctx.analytics.book_history("reader", "isbn-b", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rate_and_remove() {
        let dir = tempdir().unwrap();
        let ctx = test_context(&dir).await;

        add(&ctx, "isbn-a", "Dune", Vec::new(), None, BookStatus::Read).await.unwrap();
        rate(&ctx, "isbn-a", Some(5)).await.unwrap();
        assert_eq!(load_book(&ctx, "isbn-a").await.unwrap().user_rating, Some(5));

        rate(&ctx, "isbn-a", None).await.unwrap();
        assert_eq!(load_book(&ctx, "isbn-a").await.unwrap().user_rating, None);

        remove(&ctx, "isbn-a").await.unwrap();
        assert!(load_book(&ctx, "isbn-a").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_book_is_an_error() {
        let dir = tempdir().unwrap();
        let ctx = test_context(&dir).await;

        let err = set_status(&ctx, "missing", BookStatus::Read).await.unwrap_err();
        assert!(err.to_string().contains("not on your shelf"));
    }

    #[test]
    fn test_describe_includes_progress() {
        let now = Utc::now();
        let book = UserBook {
            user_id: "reader".into(),
            isbn: "isbn-a".into(),
            title: "Dune".into(),
            authors: vec!["Frank Herbert".into()],
            pages: Some(412),
            status: BookStatus::CurrentlyReading,
            current_page: Some(100),
            user_rating: None,
            date_added: now,
            date_updated: now,
            date_finished: None,
        };

        assert_eq!(describe(&book), "Dune [isbn-a] by Frank Herbert, page 100/412");
    }
}
