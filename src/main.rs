use clap::{Parser, Subcommand};
use std::{path::PathBuf, time::Duration};
use tracing_subscriber::EnvFilter;

use menucart::core::catalog::{ALL_CATEGORIES_LABEL, CategoryFilter, MENU_CATEGORIES};
use menucart::core::format::{format_price, image_or_placeholder};
use menucart::{JsonFileCatalog, MenuView, PollingFeed, Session, SqliteKvStore};

#[derive(Parser)]
#[command(name = "menucart")]
#[command(about = "Browse a menu catalog and keep a persistent cart")]
struct Cli {
    /// SQLite file holding the cart
    #[arg(long, value_name = "PATH", default_value = "menucart.db")]
    db: PathBuf,

    /// JSON file with the catalog items
    #[arg(long, value_name = "PATH", default_value = "catalog.json")]
    catalog: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the menu, optionally filtered
    Menu {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Add one unit of an item to the cart
    Add {
        #[arg(value_name = "ID")]
        item_id: i64,
    },
    /// Remove one unit of an item from the cart
    Remove {
        #[arg(value_name = "ID")]
        item_id: i64,
    },
    /// Show the cart
    Cart,
    /// Re-print the menu whenever the catalog file changes
    Watch {
        #[command(flatten)]
        filter: FilterArgs,

        /// How often to check the catalog file
        #[arg(long, value_name = "MS", default_value_t = 1000)]
        interval_ms: u64,
    },
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Category to show (Semua for all)
    #[arg(long, default_value = ALL_CATEGORIES_LABEL)]
    category: String,

    /// Search text; overrides the category while set
    #[arg(long, default_value = "")]
    search: String,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_menu(view: &MenuView, filter: &FilterArgs) {
    if view.summary.search_active {
        println!("\n=== Search: \"{}\" ({} found) ===", filter.search, view.summary.visible);
    } else {
        println!("\n=== Menu: {} ===", filter.category);
        println!("Categories: {}, {}", ALL_CATEGORIES_LABEL, MENU_CATEGORIES.join(", "));
    }

    for item in &view.items {
        println!(
            "  [{}] {} ({}) - {}  {}",
            item.id,
            item.name,
            item.category,
            format_price(item.price),
            image_or_placeholder(item.image.as_deref())
        );
    }

    if view.items.is_empty() {
        if view.summary.search_active {
            println!("No menu items found.");
        } else {
            println!("No menu items in this category.");
        }
    }
    if !view.summary.suggestions.is_empty() {
        println!("Popular searches: {}", view.summary.suggestions.join(", "));
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let kv = SqliteKvStore::open(&args.db).await?;
    let mut session = Session::start(JsonFileCatalog::new(&args.catalog), kv.clone()).await?;
    if let Some(err) = session.last_fetch_error() {
        eprintln!("Warning: could not load catalog: {err}");
    }

    match args.command {
        Command::Menu { filter } => {
            session.set_category(CategoryFilter::parse(&filter.category));
            session.set_search_text(filter.search.clone());
            print_menu(&session.menu(), &filter);
        }
        Command::Add { item_id } => {
            let quantity = session.add_to_cart(item_id).await?;
            println!("Item {item_id}: {quantity} in cart ({} total)", session.cart_count());
        }
        Command::Remove { item_id } => {
            let quantity = session.remove_from_cart(item_id).await?;
            println!("Item {item_id}: {quantity} in cart ({} total)", session.cart_count());
        }
        Command::Cart => {
            let lines = session.cart().lines(&session.snapshot());
            println!("\n=== Cart ({} items) ===", session.cart_count());
            for line in &lines.lines {
                println!(
                    "  {} x{} - {}",
                    line.item.name,
                    line.quantity,
                    format_price(line.subtotal())
                );
            }
            for (id, quantity) in &lines.stale {
                println!("  item {id} x{quantity} - no longer on the menu");
            }
            println!("Total: {}", format_price(lines.total_price()));
        }
        Command::Watch {
            filter,
            interval_ms,
        } => {
            session.set_category(CategoryFilter::parse(&filter.category));
            session.set_search_text(filter.search.clone());
            print_menu(&session.menu(), &filter);

            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            let feed = PollingFeed::new(&args.catalog, Duration::from_millis(interval_ms));
            session.watch(&feed, move |snapshot| {
                let _ = tx.send(snapshot.revision());
            })?;

            loop {
                tokio::select! {
                    Some(revision) = rx.recv() => {
                        if revision == session.snapshot().revision() {
                            print_menu(&session.menu(), &filter);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            session.unwatch();
        }
    }

    kv.close().await?;
    Ok(())
}
