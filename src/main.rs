use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use msupply::cli::{Cli, Commands};
use msupply::config::Config;
use msupply::database::{seed_demo_data, Database, DatabaseError};
use msupply::models::User;
use msupply::pages::SupplierInvoicesPage;
use msupply::storage::Storage;
use msupply::tui::{self, components::format_plain_table};

const LIST_COLUMN_WIDTH: usize = 18;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command();

    let config = Config::from_env()?.with_overrides(cli.database.as_deref(), cli.user.as_deref());
    config.validate()?;

    // The TUI owns the terminal, so it only logs to the file
    init_logging(&config, command != Commands::Tui);

    let storage = Storage::new(config.database_path_str()).await?;
    let database = storage.load().await?;

    match command {
        Commands::Seed { force } => {
            if !database.is_empty() && !force {
                println!("Database already holds records; use --force to seed anyway");
                return Ok(());
            }
            let user = seed_demo_data(&database, &config.username)?;
            storage.save(&database).await?;
            println!("Seeded demo data for {}", user.username);
        }

        Commands::List {
            search,
            sort,
            descending,
        } => {
            let user = prepare(&storage, &database, &config).await?;
            let mut page = SupplierInvoicesPage::new(database.clone(), user)?;
            page.table.mount()?;
            page.table.on_search_change(&search)?;
            if let Some(key) = sort {
                page.table.on_column_sort(&key)?;
                if page.table.is_ascending() == descending {
                    page.table.on_column_sort(&key)?;
                }
            }

            print!("{}", format_plain_table(&page.table, LIST_COLUMN_WIDTH));
            println!();
            println!("Total: {} supplier invoices", page.table.visible_rows().len());
        }

        Commands::Tui => {
            info!("Launching TUI interface");
            let user = prepare(&storage, &database, &config).await?;
            if let Err(e) = tui::run_tui(config, &storage, database, user).await {
                error!("TUI failed: {}", e);
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Seed an empty database and resolve the acting user
async fn prepare(storage: &Storage, database: &Database, config: &Config) -> Result<User> {
    if database.is_empty() {
        info!("Empty database, seeding demo data");
        seed_demo_data(database, &config.username)?;
    }
    let user = find_or_create_user(database, &config.username)?;
    storage.save(database).await?;
    Ok(user)
}

fn find_or_create_user(database: &Database, username: &str) -> Result<User, DatabaseError> {
    if let Some(user) = database
        .objects::<User>()
        .find(|user| user.username == username)
    {
        return Ok(user.clone());
    }
    info!("Creating user {}", username);
    database.write(|tx| tx.create(User::new(username)))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("msupply=info"))
}

fn init_logging(config: &Config, to_stderr: bool) {
    let log_file = &config.log_file;
    let directory = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = log_file
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "msupply.log".into());
    let file_appender = tracing_appender::rolling::never(directory, file_name);

    let stderr_layer = to_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(env_filter())
    });

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(env_filter()),
        )
        .init();
}
