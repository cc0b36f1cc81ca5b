use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "msupply")]
#[command(about = "Terminal client for recording and reviewing supplier invoices")]
#[command(version)]
pub struct Cli {
    /// Database file path (overrides MSUPPLY_DB_PATH)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Acting user (overrides MSUPPLY_USER)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Launch the interactive supplier invoices screen
    Tui,

    /// Print the supplier invoices table and exit
    List {
        /// Only rows whose invoice number starts with this term
        #[arg(short, long, default_value = "")]
        search: String,

        /// Column key to sort on (serialNumber, status, entryDate)
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending instead of ascending
        #[arg(long)]
        descending: bool,
    },

    /// Populate the database with demo suppliers and invoices
    Seed {
        /// Seed even when the database already holds records
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Tui)
    }
}
