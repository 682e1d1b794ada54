pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "ticket-cart")]
#[command(about = "Event ticket cart with a mock checkout")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "ticket-cart.toml")]
    pub config: String,

    /// Override the store file from config
    #[arg(long)]
    pub store: Option<String>,

    /// Override the event catalog file from config
    #[arg(long)]
    pub catalog: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List events from the catalog
    Events {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Add tickets for a catalog event
    Add {
        event_id: String,
        #[arg(short, long, default_value = "1")]
        quantity: i64,
    },
    /// Set the ticket quantity for an event (0 removes it)
    Set {
        event_id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Change the ticket quantity by a delta
    Adjust {
        event_id: String,
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// Remove an event from the cart
    Remove { event_id: String },
    /// Empty the cart
    Clear,
    /// Show cart contents and totals
    Show,
    /// Run the mock checkout
    Checkout {
        #[arg(long)]
        holder: String,
        #[arg(long)]
        card_number: String,
        #[arg(long)]
        expiry: String,
        #[arg(long)]
        cvv: String,
        /// Skip the simulated processing delay
        #[arg(long)]
        no_delay: bool,
    },
}
