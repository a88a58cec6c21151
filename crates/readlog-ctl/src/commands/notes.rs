use anyhow::{Context as _, Result};
use chrono::Utc;
use readlog_common::BookNote;
use readlog_db::queries::NoteQueries;
use readlog_db::NewBookNote;

use super::book::load_book;
use super::Context;

pub async fn add(ctx: &Context, isbn: &str, text: &str, title: Option<String>) -> Result<()> {
    let book = load_book(ctx, isbn).await?;

    let mut note = NewBookNote::new(ctx.user_id.clone(), book.isbn.clone(), text.to_string());
    if let Some(title) = title {
        note = note.with_title(title);
    }

    let saved: BookNote = NoteQueries::create(&ctx.db, note, Utc::now()).await?.into();
    println!("Added note {} to \"{}\"", saved.id, book.title);
    Ok(())
}

/// Replaces the text of a note. The title is kept unless a new one is given.
pub async fn edit(ctx: &Context, id: i64, text: &str, title: Option<String>) -> Result<()> {
    let existing: BookNote = NoteQueries::get(&ctx.db, &ctx.user_id, id)
        .await
        .with_context(|| format!("No note with id {}", id))?
        .into();
    let title = title.or(existing.title);

    NoteQueries::update(&ctx.db, &ctx.user_id, id, text, title.as_deref(), Utc::now()).await?;
    println!("Updated note {}", id);
    Ok(())
}

pub async fn delete(ctx: &Context, id: i64) -> Result<()> {
    NoteQueries::delete(&ctx.db, &ctx.user_id, id)
        .await
        .with_context(|| format!("No note with id {}", id))?;
    println!("Deleted note {}", id);
    Ok(())
}

pub async fn list(ctx: &Context, isbn: &str) -> Result<()> {
    let notes: Vec<BookNote> = NoteQueries::list_for_book(&ctx.db, &ctx.user_id, isbn)
        .await?
        .into_iter()
        .map(BookNote::from)
        .collect();

    if notes.is_empty() {
        println!("No notes for {}", isbn);
        return Ok(());
    }

    println!("\nNotes for {}", isbn);
    println!("─────────────────────────────────────────────");
    for note in &notes {
        println!("  {}", describe(note));
    }
    println!();
    Ok(())
}

fn describe(note: &BookNote) -> String {
    let heading = match &note.title {
        Some(title) => format!("{}: ", title),
        None => String::new(),
    };
    format!("#{}  {}  {}{}", note.id, note.created_at.format("%Y-%m-%d"), heading, note.note)
}
