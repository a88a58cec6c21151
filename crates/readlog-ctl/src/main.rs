use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use readlog_analytics::PeriodKind;
use readlog_common::BookStatus;
use std::path::PathBuf;
use tracing::debug;

mod commands;
mod config;

use commands::Context;
use config::ReadlogConfig;

#[derive(Parser)]
#[command(name = "readlog")]
#[command(about = "Keep a reading log and see how much you read", long_about = None)]
struct Cli {
    #[arg(long, global = true, help = "Path to the configuration file")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Act on this user instead of the configured one")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Book {
        #[command(subcommand)]
        action: BookAction,
    },

    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },

    Report {
        #[command(subcommand)]
        action: ReportAction,
    },

    List {
        #[command(subcommand)]
        action: ListAction,
    },

    Note {
        #[command(subcommand)]
        action: NoteAction,
    },

    Activity {
        #[arg(short, long, default_value_t = 50)]
        limit: u32,
    },
}

#[derive(Subcommand)]
enum BookAction {
    Add {
        isbn: String,
        #[arg(short, long)]
        title: String,
        #[arg(short, long = "author", help = "Author name, repeatable")]
        authors: Vec<String>,
        #[arg(short, long, help = "Total number of pages")]
        pages: Option<u32>,
        #[arg(short, long, default_value = "want-to-read")]
        status: BookStatus,
    },
    Status {
        isbn: String,
        #[arg(help = "want-to-read, currently-reading, read or did-not-finish")]
        status: BookStatus,
    },
    Rate {
        isbn: String,
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5), help = "1 to 5, omit to clear")]
        rating: Option<u8>,
    },
    Pages {
        isbn: String,
        pages: u32,
    },
    List,
    Remove {
        isbn: String,
    },
}

#[derive(Subcommand)]
enum ProgressAction {
    Log {
        isbn: String,
        page: u32,
        #[arg(short, long, help = "Minutes spent in this session")]
        minutes: Option<u32>,
    },
    History {
        isbn: String,
        #[arg(short, long, default_value_t = 100)]
        limit: u32,
    },
    Recent {
        #[arg(short, long, default_value_t = 28)]
        days: u32,
    },
}

#[derive(Subcommand)]
enum ListAction {
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        details: String,
    },
    Rename {
        name: String,
        new_name: String,
        #[arg(short, long, help = "Replace the description")]
        details: Option<String>,
    },
    Delete {
        name: String,
    },
    Add {
        name: String,
        isbn: String,
    },
    Remove {
        name: String,
        isbn: String,
    },
    Show {
        #[arg(help = "List to show, all lists when omitted")]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
enum NoteAction {
    Add {
        isbn: String,
        text: String,
        #[arg(short, long)]
        title: Option<String>,
    },
    Edit {
        id: i64,
        text: String,
        #[arg(short, long)]
        title: Option<String>,
    },
    Delete {
        id: i64,
    },
    List {
        isbn: String,
    },
}

#[derive(Subcommand)]
enum ReportAction {
    Range {
        #[arg(help = "First day, YYYY-MM-DD")]
        start: NaiveDate,
        #[arg(help = "Last day, YYYY-MM-DD")]
        end: NaiveDate,
    },
    Rollup {
        #[arg(help = "month, 3months, 6months or by-year")]
        period: PeriodKind,
    },
    Compare {
        #[arg(help = "month, 3months, 6months or by-year")]
        period: PeriodKind,
    },
    Lifetime,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ReadlogConfig::load_from_path(path)?,
        None => ReadlogConfig::load()?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    config.validate()?;
    debug!("Using database at {}", config.database.path);

    let ctx = Context::open(&config, cli.user).await?;
    let result = run(&ctx, cli.command).await;
    ctx.close().await;

    result
}

async fn run(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Book { action } => match action {
            BookAction::Add { isbn, title, authors, pages, status } => {
                commands::book::add(ctx, &isbn, &title, authors, pages, status).await?
            }
            BookAction::Status { isbn, status } => {
                commands::book::set_status(ctx, &isbn, status).await?
            }
            BookAction::Rate { isbn, rating } => commands::book::rate(ctx, &isbn, rating).await?,
            BookAction::Pages { isbn, pages } => {
                commands::book::set_pages(ctx, &isbn, pages).await?
            }
            BookAction::List => commands::book::list(ctx).await?,
            BookAction::Remove { isbn } => commands::book::remove(ctx, &isbn).await?,
        },
        Commands::Progress { action } => match action {
            ProgressAction::Log { isbn, page, minutes } => {
                commands::progress::log(ctx, &isbn, page, minutes).await?
            }
            ProgressAction::History { isbn, limit } => {
                commands::progress::history(ctx, &isbn, limit).await?
            }
            ProgressAction::Recent { days } => commands::progress::recent(ctx, days).await?,
        },
        Commands::Report { action } => match action {
            ReportAction::Range { start, end } => commands::report::range(ctx, start, end).await?,
            ReportAction::Rollup { period } => commands::report::rollup(ctx, period).await?,
            ReportAction::Compare { period } => commands::report::compare(ctx, period).await?,
            ReportAction::Lifetime => commands::report::lifetime(ctx).await?,
        },
        Commands::List { action } => match action {
            ListAction::Create { name, details } => {
                commands::lists::create(ctx, &name, &details).await?
            }
            ListAction::Rename { name, new_name, details } => {
                commands::lists::rename(ctx, &name, &new_name, details).await?
            }
            ListAction::Delete { name } => commands::lists::delete(ctx, &name).await?,
            ListAction::Add { name, isbn } => commands::lists::add_book(ctx, &name, &isbn).await?,
            ListAction::Remove { name, isbn } => {
                commands::lists::remove_book(ctx, &name, &isbn).await?
            }
            ListAction::Show { name } => commands::lists::show(ctx, name.as_deref()).await?,
        },
        Commands::Note { action } => match action {
            NoteAction::Add { isbn, text, title } => {
                commands::notes::add(ctx, &isbn, &text, title).await?
            }
            NoteAction::Edit { id, text, title } => {
                commands::notes::edit(ctx, id, &text, title).await?
            }
            NoteAction::Delete { id } => commands::notes::delete(ctx, id).await?,
            NoteAction::List { isbn } => commands::notes::list(ctx, &isbn).await?,
        },
        Commands::Activity { limit } => commands::activity::list(ctx, limit).await?,
    }

    Ok(())
}
