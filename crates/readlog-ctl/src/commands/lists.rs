use anyhow::{Context as _, Result};
use chrono::Utc;
use readlog_common::{ActivityMetadata, ActivityType, ReadingList};
use readlog_db::queries::{ListQueries, UserBookQueries};
use readlog_db::{DbUserBook, NewActivity};

use super::book::load_book;
use super::Context;

async fn load_list(ctx: &Context, name: &str) -> Result<ReadingList> {
    let row = ListQueries::find_by_name(&ctx.db, &ctx.user_id, name)
        .await
        .with_context(|| format!("No list named {}", name))?;
    Ok(row.into())
}

pub async fn create(ctx: &Context, name: &str, details: &str) -> Result<()> {
    let list: ReadingList =
        ListQueries::create(&ctx.db, &ctx.user_id, name, details, Utc::now()).await?.into();

    println!("Created list \"{}\"", list.name);
    Ok(())
}

pub async fn rename(
    ctx: &Context,
    name: &str,
    new_name: &str,
    details: Option<String>,
) -> Result<()> {
    let list = load_list(ctx, name).await?;
    let details = details.unwrap_or(list.details);

    let updated: ReadingList =
        ListQueries::update(&ctx.db, &ctx.user_id, list.id, new_name, &details, Utc::now())
            .await?
            .into();

    println!("Renamed \"{}\" to \"{}\"", list.name, updated.name);
    Ok(())
}

pub async fn delete(ctx: &Context, name: &str) -> Result<()> {
    let list = load_list(ctx, name).await?;

    ListQueries::delete(&ctx.db, &ctx.user_id, list.id).await?;

    ctx.log_activity(
        NewActivity::new(ctx.user_id.clone(), ActivityType::ListDeleted, None).with_metadata(
            ActivityMetadata {
                list_id: Some(list.id),
                list_name: Some(list.name.clone()),
                ..Default::default()
            },
        ),
    )
    .await;

    println!("Deleted list \"{}\"", list.name);
    Ok(())
}

pub async fn add_book(ctx: &Context, name: &str, isbn: &str) -> Result<()> {
    let list = load_list(ctx, name).await?;
    let book = load_book(ctx, isbn).await?;

    ListQueries::add_book(&ctx.db, &ctx.user_id, list.id, isbn, Utc::now()).await?;

    ctx.log_activity(
        NewActivity::new(ctx.user_id.clone(), ActivityType::BookAddedToList, Some(isbn.to_string()))
            .with_metadata(ActivityMetadata {
                list_id: Some(list.id),
                list_name: Some(list.name.clone()),
                book_title: Some(book.title.clone()),
                ..Default::default()
            }),
    )
    .await;

    println!("Added \"{}\" to \"{}\"", book.title, list.name);
    Ok(())
}

pub async fn remove_book(ctx: &Context, name: &str, isbn: &str) -> Result<()> {
    let list = load_list(ctx, name).await?;

    ListQueries::remove_book(&ctx.db, &ctx.user_id, list.id, isbn)
        .await
        .with_context(|| format!("{} is not in \"{}\"", isbn, list.name))?;

    // The book may have left the shelf since it was listed
    let title = UserBookQueries::get(&ctx.db, &ctx.user_id, isbn).await.ok().map(|b| b.title);

    ctx.log_activity(
        NewActivity::new(
            ctx.user_id.clone(),
            ActivityType::BookRemovedFromList,
            Some(isbn.to_string()),
        )
        .with_metadata(ActivityMetadata {
            list_id: Some(list.id),
            list_name: Some(list.name.clone()),
            book_title: title.clone(),
            ..Default::default()
        }),
    )
    .await;

    println!("Removed \"{}\" from \"{}\"", title.as_deref().unwrap_or(isbn), list.name);
    Ok(())
}

/// Prints one list, or every list when no name is given.
pub async fn show(ctx: &Context, name: Option<&str>) -> Result<()> {
    if let Some(name) = name {
        let list = load_list(ctx, name).await?;
        let books = ListQueries::books_in_list(&ctx.db, &ctx.user_id, list.id).await?;
        print_list(&list, &books);
        println!();
        return Ok(());
    }

    let lists = ListQueries::lists_with_books(&ctx.db, &ctx.user_id).await?;
    if lists.is_empty() {
        println!("You have no lists.");
        return Ok(());
    }

    for entry in lists {
        let list: ReadingList = entry.list.into();
        print_list(&list, &entry.books);
    }
    println!();
    Ok(())
}

fn print_list(list: &ReadingList, books: &[DbUserBook]) {
    println!("\n{} ({})", list.name, books.len());
    if !list.details.is_empty() {
        println!("  {}", list.details);
    }
    println!("─────────────────────────────────────────────");
    if books.is_empty() {
        println!("  (empty)");
    }
    for book in books {
        println!("  {} [{}]", book.title, book.isbn);
    }
}
