//! `cmdhub` command-line front end.
//!
//! # Responsibility
//! - Resolve configuration and start logging.
//! - Map subcommands onto `cmdhub_core::Hub` operations.

mod commands;
mod config;
mod seed;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use cmdhub_core::{GroupKind, GroupSelection, ImportMode, MoveDirection, SortMode};
use config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cmdhub", version)]
#[command(about = "Organize commands, notes and links in ordered tabs")]
struct Cli {
    /// Directory holding the snapshot, session and seed files.
    #[arg(long, env = "CMDHUB_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,
    #[arg(long, env = "CMDHUB_LOG_LEVEL", global = true)]
    log_level: Option<String>,
    #[arg(long, env = "CMDHUB_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage tabs.
    Tabs {
        #[command(subcommand)]
        action: TabsAction,
    },
    /// Manage items inside a tab.
    Items {
        #[command(subcommand)]
        action: ItemsAction,
    },
    /// Export one tab as JSON.
    Export {
        #[arg(long)]
        tab: GroupSelection,
        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import a JSON document into one tab.
    Import {
        #[arg(long)]
        tab: GroupSelection,
        file: PathBuf,
        #[arg(long, default_value = "append")]
        mode: ImportMode,
    },
    /// Whole-database exchange.
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    /// Show the current view; flags update the saved session.
    View {
        /// Tab id or `all`.
        #[arg(long)]
        tab: Option<GroupSelection>,
        #[arg(long)]
        sort: Option<SortMode>,
        /// Forget the saved sort and use the view default.
        #[arg(long, conflicts_with = "sort")]
        default_sort: bool,
    },
    /// Print version, paths and dataset summary.
    Info,
}

#[derive(Subcommand)]
enum TabsAction {
    List,
    Add {
        name: String,
        #[arg(long, default_value = "command")]
        kind: GroupKind,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        kind: Option<GroupKind>,
    },
    Rm {
        id: i64,
    },
    Move {
        id: i64,
        direction: Direction,
    },
}

#[derive(Subcommand)]
enum ItemsAction {
    List {
        /// Tab id or `all`; defaults to the saved session.
        #[arg(long)]
        tab: Option<GroupSelection>,
        #[arg(long)]
        sort: Option<SortMode>,
    },
    Add {
        #[arg(long)]
        tab: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        note: Option<String>,
    },
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        order: Option<i64>,
        #[arg(long)]
        count: Option<i64>,
    },
    Rm {
        id: i64,
    },
    Move {
        id: i64,
        direction: Direction,
    },
    /// Print one line of a command/link item and count the use.
    Activate {
        id: i64,
        #[arg(long, default_value_t = 0)]
        line: usize,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Write the whole database to a dated file.
    Export {
        /// Target directory or file.
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Replace the whole database with an exported file.
    Import { file: PathBuf },
    /// Restore the seed database.
    Reset {
        /// Seed image; defaults to `def.db` in the data directory.
        #[arg(long)]
        seed: Option<PathBuf>,
        #[arg(long)]
        yes: bool,
    },
    /// Promote the newest dated export in a directory to `def.db`.
    PromoteSeed { dir: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Up,
    Down,
}

impl From<Direction> for MoveDirection {
    fn from(value: Direction) -> Self {
        match value {
            Direction::Up => MoveDirection::Up,
            Direction::Down => MoveDirection::Down,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.data_dir, cli.log_dir, cli.log_level)?;
    cmdhub_core::init_logging(&config.log_level, &config.log_dir)?;
    commands::run(cli.command, &config)
}
