//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Waymark - apply database migrations collected from several locations
#[derive(Parser, Debug)]
#[command(name = "wm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Additional migration location, searched after the configured ones
    #[arg(short = 'l', long = "extra-location", global = true)]
    pub extra_location: Vec<String>,

    /// Scan only the primary location and match history by name
    #[arg(long, global = true)]
    pub disable_lookup: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migrations
    Up(UpArgs),

    /// Revert the most recently applied migrations
    Down(StepArgs),

    /// Revert and re-apply the most recently applied migrations
    Redo(StepArgs),

    /// Show applied migrations, most recent first
    History(ListArgs),

    /// Show pending migrations in apply order
    New(ListArgs),

    /// Move history to a migration without running anything
    Mark(MarkArgs),

    /// Create a new migration script
    Create(CreateArgs),

    /// Convert a history table that predates location tracking
    AdoptLegacy,
}

/// Arguments for the up command
#[derive(Args, Debug)]
pub struct UpArgs {
    /// Number of migrations to apply (default or 0: all)
    pub limit: Option<usize>,
}

/// Arguments for the down and redo commands
#[derive(Args, Debug)]
pub struct StepArgs {
    /// Number of migrations to process
    #[arg(
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..),
        conflicts_with = "all"
    )]
    pub limit: u64,

    /// Process every applied migration
    #[arg(short, long)]
    pub all: bool,
}

impl StepArgs {
    pub fn limit(&self) -> Option<usize> {
        if self.all {
            None
        } else {
            Some(self.limit as usize)
        }
    }
}

/// Arguments for the history and new commands
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Maximum number of migrations to list
    #[arg(
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..),
        conflicts_with = "all"
    )]
    pub limit: u64,

    /// List every migration
    #[arg(short, long)]
    pub all: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: ListOutput,
}

impl ListArgs {
    pub fn limit(&self) -> Option<usize> {
        if self.all {
            None
        } else {
            Some(self.limit as usize)
        }
    }
}

/// List output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutput {
    /// Table format
    Table,
    /// JSON output, one object per migration including its token
    Json,
}

/// Arguments for the mark command
#[derive(Args, Debug)]
pub struct MarkArgs {
    /// Migration token, or a migration name present in a single location
    pub target: String,
}

/// Arguments for the create command
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Short description, e.g. `create_orders`
    pub slug: String,

    /// Location to create the script in (default: primary location)
    #[arg(long)]
    pub location: Option<String>,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
