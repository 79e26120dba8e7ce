use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "dbstudio", version, about = "Database metadata and MERGE script generation")]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(long, env = "DBSTUDIO_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Log filter directive, overrides the settings file
    #[arg(long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct TableArgs {
    /// Connection name
    #[arg(short, long, default_value = "main")]
    pub connection: String,

    pub schema: String,

    pub table: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List configured connections
    Connections,

    /// Print every table with its enriched columns and key sets
    Structure {
        #[arg(short, long, default_value = "main")]
        connection: String,
    },

    /// Print one table's metadata
    Table(TableArgs),

    /// Print a page of rows
    Rows {
        #[command(flatten)]
        table: TableArgs,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 100)]
        per_page: u32,
    },

    /// Fetch one row by its identity value
    Record {
        #[command(flatten)]
        table: TableArgs,

        id: String,
    },

    /// Generate MERGE scripts for a record tree (JSON)
    Merge {
        #[arg(short, long, default_value = "main")]
        connection: String,

        /// Record tree file; read from stdin when absent
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print only the diff instead of the JSON result
        #[arg(long)]
        diff: bool,
    },
}
