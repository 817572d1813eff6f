//! Waymark CLI - database migrations collected from several locations

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{adopt_legacy, create, down, history, mark, new, redo, up};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        cli::Commands::Up(args) => up::execute(args, &cli.global),
        cli::Commands::Down(args) => down::execute(args, &cli.global),
        cli::Commands::Redo(args) => redo::execute(args, &cli.global),
        cli::Commands::History(args) => history::execute(args, &cli.global),
        cli::Commands::New(args) => new::execute(args, &cli.global),
        cli::Commands::Mark(args) => mark::execute(args, &cli.global),
        cli::Commands::Create(args) => create::execute(args, &cli.global),
        cli::Commands::AdoptLegacy => adopt_legacy::execute(&cli.global),
    }
}
