//! CLI argument parsing using clap derive

use std::path::PathBuf;

use butler_core::DEFAULT_CONFIG_FILE;
use clap::{Args, Parser, Subcommand};

/// Deck Save Butler - keep game saves in sync between a PC and a Steam Deck
#[derive(Parser, Debug)]
#[command(name = "butler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON, TOML or YAML)
    #[arg(short, long, global = true, env = "BUTLER_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run. Without one, games are synced when `autoSync` is set.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Games to operate on; empty means every configured game
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GameSelection {
    /// Only this game id (repeatable)
    #[arg(short, long = "game", value_name = "ID")]
    pub games: Vec<u64>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Synchronize saves for configured games
    ///
    /// Examples:
    ///   butler sync                 # Every game
    ///   butler sync -g 1 -g 3       # Only games 1 and 3
    ///   butler sync --dry-run       # Show the plan without copying
    Sync {
        #[command(flatten)]
        selection: GameSelection,

        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Output the run report as JSON
        #[arg(long)]
        json: bool,

        /// Number of games synced at once (overrides the config)
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
    },

    /// Show what a sync would do, without changing anything
    Status {
        #[command(flatten)]
        selection: GameSelection,

        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List configured games
    List,

    /// Forget a game's last synced state
    ///
    /// The next sync treats the game as never synced: files present on only
    /// one side are copied instead of deleted.
    Reset {
        /// Game id
        id: u64,
    },
}
