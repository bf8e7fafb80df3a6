use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "recman")]
#[command(about = "Legacy record-manager file decoder and SQL-backed store")]
#[command(version)]
pub struct Cli {
    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print header, key, and record-count summary
    Stat {
        /// Path to a converted store (`.db`), or a legacy file to convert first
        file: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Convert a legacy file into its SQL-backed store
    Create {
        /// Path to the legacy `.DAT` file
        file: String,

        /// Path to write the converted store
        out: String,
    },

    /// Print the raw record bytes at a given position
    Dump {
        /// Path to a converted store (`.db`)
        file: String,

        /// Record position to dump
        #[arg(short, long)]
        position: u32,
    },

    /// Run a single keyed acquire and print the resulting record
    Query {
        /// Path to a converted store (`.db`)
        file: String,

        /// Key number to query
        #[arg(short, long)]
        key: u16,

        /// Comparison to run
        #[arg(long, value_enum, default_value = "equal")]
        op: QueryOp,

        /// Key value to compare against (decimal integer or text)
        #[arg(long)]
        value: Option<String>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum QueryOp {
    First,
    Last,
    Equal,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}
