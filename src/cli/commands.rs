use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cashout")]
#[command(about = "Batch approved cash outs to PayPal Payouts and reconcile their status")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (defaults to config/default.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// List cash outs
    List {
        /// Only sent (true) or pending (false) cash outs
        #[arg(long)]
        sent: Option<String>,

        /// Sort field: sent or created, prefix with '-' for descending
        #[arg(long, allow_hyphen_values = true)]
        order: Option<String>,

        /// Maximum number of rows to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Submit approved cash outs to PayPal in batches
    Submit {
        /// Show the batches that would be sent without calling PayPal
        #[arg(long)]
        dry_run: bool,
    },

    /// Poll outstanding PayPal batches and record their outcome
    Reconcile,

    /// Run submit and reconcile on a fixed interval
    Auto {
        /// Seconds between cycles (defaults to payout.interval_secs)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show statistics
    Stats {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}
