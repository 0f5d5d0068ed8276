use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use larder_common::alerts::expiring_soon;
use larder_common::countdown::{trash_label, DEFAULT_TRASH_RETENTION_DAYS};
use larder_common::item::{Category, FoodItemDraft, FoodItemPatch};
use larder_common::{FoodItem, ItemId};
use tracing_subscriber::EnvFilter;

use larder_client::{watch, ApiClient, Notice, Session, WatchOptions};

#[derive(Parser)]
#[command(name = "larder", about = "Food expiry tracker client")]
struct Cli {
    /// Tracker server origin.
    #[arg(long, env = "LARDER_SERVER", default_value = "http://localhost:5000")]
    server: String,

    /// Admin password, sent only for items more than 15 days from expiry.
    #[arg(long, env = "LARDER_ADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show active items with their countdowns
    List,
    /// Show trashed items
    Trash,
    /// Add an item
    Add {
        #[arg(long)]
        name: String,
        /// RFC 3339 timestamp or YYYY-MM-DD.
        #[arg(long)]
        expiry: String,
        /// None, LSSD, GM, RTE or any other label.
        #[arg(long, default_value = "None")]
        category: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change fields of an active item
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        expiry: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, conflicts_with = "clear_notes")]
        notes: Option<String>,
        #[arg(long)]
        clear_notes: bool,
    },
    /// Move an item to the trash
    Delete { id: String },
    /// Bring an item back from the trash
    Restore { id: String },
    /// Permanently remove a trashed item
    Purge { id: String },
    /// Permanently remove everything in the trash
    ClearTrash,
    /// Check the admin password against the server
    Verify,
    /// Server status
    Health,
    /// Keep refreshing, sweeping expired items and printing alerts
    Watch {
        /// Seconds between refreshes.
        #[arg(long, default_value_t = 60)]
        poll_secs: u64,
        /// Leave expired items in place and alert on them instead.
        #[arg(long)]
        no_auto_delete: bool,
    },
}

fn print_active(items: &[FoodItem], now: &DateTime<Local>) {
    if items.is_empty() {
        println!("No items.");
        return;
    }
    for item in items {
        let countdown = item.countdown(now);
        println!(
            "{:<36}  {:<24}  {:<6}  {:<10}  {:>9}  {}",
            item.id,
            item.name,
            item.category,
            item.expiry_date
                .with_timezone(&Local)
                .format("%Y-%m-%d")
                .to_string(),
            countdown.label(),
            countdown.status().as_str(),
        );
    }
    let soon: Vec<&str> = expiring_soon(items, now)
        .into_iter()
        .map(|item| item.name.as_str())
        .collect();
    if !soon.is_empty() {
        println!("\nExpiring soon: {}", soon.join(", "));
    }
}

fn print_trash(items: &[FoodItem], now: &DateTime<Local>) {
    if items.is_empty() {
        println!("Trash is empty.");
        return;
    }
    for item in items {
        let clear = item
            .deleted_at
            .map(|at| trash_label(&at, now, DEFAULT_TRASH_RETENTION_DAYS))
            .unwrap_or_default();
        println!("{:<36}  {:<24}  {}", item.id, item.name, clear);
    }
}

fn print_notice(notice: Notice) {
    match notice {
        Notice::Alert(alert) => println!("! {}", alert.message()),
        Notice::AutoDeleted(summary) => println!("{summary}"),
        Notice::Refreshed { active, trash } => {
            tracing::debug!(active, trash, "refreshed");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("larder_client=info,larder=info")),
        )
        .init();

    let cli = Cli::parse();
    let api = ApiClient::new(&cli.server).context("failed to build HTTP client")?;
    let mut session = Session::new(api, cli.password.clone());
    let now = Local::now();

    match cli.command {
        Command::List => {
            session.refresh().await?;
            print_active(session.active(), &now);
        }
        Command::Trash => {
            session.refresh().await?;
            print_trash(session.trash(), &now);
        }
        Command::Add {
            name,
            expiry,
            category,
            notes,
        } => {
            session.refresh().await?;
            let draft = FoodItemDraft {
                name,
                expiry_date: expiry,
                category: Some(Category::from(category)),
                notes,
            };
            let item = session.add(draft, &now).await?;
            println!("Added {} ({})", item.name, item.id);
        }
        Command::Edit {
            id,
            name,
            expiry,
            category,
            notes,
            clear_notes,
        } => {
            session.refresh().await?;
            let patch = FoodItemPatch {
                name,
                expiry_date: expiry,
                category: category.map(Category::from),
                notes: if clear_notes { Some(None) } else { notes.map(Some) },
            };
            let item = session.edit(&ItemId(id), patch, &now).await?;
            println!("Updated {} ({})", item.name, item.id);
        }
        Command::Delete { id } => {
            session.refresh().await?;
            session.delete(&ItemId(id), &now).await?;
            println!("Food item moved to trash");
        }
        Command::Restore { id } => {
            session.refresh().await?;
            session.restore(&ItemId(id)).await?;
            println!("Food item restored");
        }
        Command::Purge { id } => {
            session.refresh().await?;
            session.purge(&ItemId(id)).await?;
            println!("Food item permanently deleted");
        }
        Command::ClearTrash => {
            session.clear_trash().await?;
            println!("Trash cleared");
        }
        Command::Verify => {
            let password = cli
                .password
                .as_deref()
                .context("no password given (use --password or LARDER_ADMIN_PASSWORD)")?;
            let reply = session.api().verify_password(password).await?;
            match (reply.valid, reply.message) {
                (true, _) => println!("Password is valid"),
                (false, Some(message)) => println!("Password not accepted: {message}"),
                (false, None) => println!("Password is invalid"),
            }
        }
        Command::Health => {
            let health = session.api().health().await?;
            println!(
                "{} (backend: {}, admin password configured: {})",
                health.status, health.backend, health.admin_configured
            );
        }
        Command::Watch {
            poll_secs,
            no_auto_delete,
        } => {
            let options = WatchOptions {
                poll_every: Duration::from_secs(poll_secs.max(1)),
                auto_delete: !no_auto_delete,
            };
            watch(&mut session, options, print_notice).await;
        }
    }
    Ok(())
}
