//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use crate::types::{FileFormat, TableName};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Keep database tables in sync with spreadsheet, CSV and JSON files
#[derive(Parser, Debug)]
#[command(
    name = "tablesync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Keep database tables in sync with data files",
    long_about = "Watch a directory of .xlsx, .csv and .json files and mirror each \
                  file into the table named after it. Tables can be exported back \
                  to any of the three formats.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .tablesync directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration
    #[command(about = "Display active settings")]
    Config,

    /// Watch the data directory
    #[command(about = "Sync every data file and keep watching for changes (Ctrl-C to stop)")]
    Watch {
        /// Directory to watch (overrides data_dir from config)
        #[arg(short, long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Sync a single file
    #[command(about = "Parse one file and replace its table's contents")]
    Sync {
        /// File to sync (.xlsx, .csv or .json)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Target table (defaults to the file name without extension)
        #[arg(short, long, value_name = "NAME")]
        table: Option<TableName>,
    },

    /// Clear a table
    #[command(about = "Delete every row of a table")]
    Clear {
        /// Table to clear
        #[arg(value_name = "TABLE")]
        table: TableName,
    },

    /// Export a table
    #[command(about = "Write a table to an .xlsx, .csv or .json file")]
    Export {
        /// Table to export
        #[arg(value_name = "TABLE")]
        table: TableName,

        /// Output format: xlsx, csv or json
        #[arg(short, long, default_value = "xlsx")]
        format: FileFormat,

        /// Output directory (overrides exports_dir from config)
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Write the file contents to stdout instead of a file
        #[arg(long, conflicts_with = "out")]
        stdout: bool,
    },
}
