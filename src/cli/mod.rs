pub mod analyze;
pub mod classify;
pub mod config;
pub mod info;

use clap::{Parser, Subcommand};

use penny::Focus;

#[derive(Parser)]
#[command(name = "penny", about = "Analyze bank statement exports: CSV, Excel and PDF.")]
pub struct Cli {
    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a statement and print the report.
    Analyze {
        /// Path to a .csv, .xls, .xlsx or .pdf statement
        file: String,
        /// Three-letter currency code (default: from settings)
        #[arg(long)]
        currency: Option<String>,
        /// Extra income to add to the statement's inflows, e.g. salary paid elsewhere
        #[arg(long, default_value = "0")]
        income: f64,
        /// Only show one part of the report
        #[arg(long, value_enum)]
        focus: Option<Focus>,
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Show size, type and checksum of a statement file.
    Info {
        /// Path to the statement file
        file: String,
    },
    /// Show which category a description falls into.
    Classify {
        /// Transaction description, e.g. 'POS UBER TRIP'
        description: String,
        /// Signed amount, used when no keyword matches
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<f64>,
    },
    /// List the category keyword rules in match order.
    Categories,
    /// Show the settings file and effective settings.
    Config {
        /// Write the effective settings to the settings file
        #[arg(long)]
        init: bool,
    },
}
