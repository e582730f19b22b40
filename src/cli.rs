use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DB_ENV;
use crate::store::SearchKind;
use crate::writer::DEFAULT_COLLECTION;

#[derive(Parser, Debug)]
#[command(name = "core-inventory")]
#[command(version, about = "Clean core sample inventory exports and manage the sample store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Expand a raw inventory export into one row per box
    Clean {
        /// Raw inventory CSV
        input: PathBuf,

        /// Cleaned record CSV to write
        output: PathBuf,

        /// Where rows with neither box nor total go (default: nullboxes.csv next to OUTPUT)
        #[arg(short, long)]
        boxless: Option<PathBuf>,

        /// Where the rows of files that could not be expanded go (default: no_api.csv next to OUTPUT)
        #[arg(short, long)]
        rejected: Option<PathBuf>,
    },

    /// Load a cleaned record file into a fresh store
    Build {
        /// Cleaned record CSV
        cleaned: PathBuf,

        /// Store database path
        #[arg(long, env = DB_ENV)]
        db: Option<PathBuf>,

        /// Collection name given to every loaded file
        #[arg(short, long, default_value = DEFAULT_COLLECTION)]
        collection: String,

        /// Show a full-screen progress display
        #[arg(long)]
        tui: bool,
    },

    /// Find wells with their files and boxes
    Search {
        /// FILE, API, WELL, OPERATOR, LEASE or FORMATION
        #[arg(value_parser = parse_kind)]
        kind: SearchKind,

        /// Exact key, or substring for OPERATOR/LEASE/FORMATION
        value: String,

        /// Store database path
        #[arg(long, env = DB_ENV)]
        db: Option<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create an empty store
    Init {
        /// Store database path
        #[arg(long, env = DB_ENV)]
        db: Option<PathBuf>,
    },

    /// Print the store's CREATE statements
    Schema,
}

fn parse_kind(s: &str) -> Result<SearchKind, String> {
    s.parse().map_err(|e: crate::Error| e.to_string())
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
