//! Tussle CLI - Command-line interface for simulating and inspecting games.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// Tussle - A deterministic tactics board-game engine
#[derive(Parser, Debug)]
#[command(name = "tussle")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate a single game with a scripted decision policy
    Run {
        /// Number of players (1-4)
        #[arg(short, long, default_value = "2")]
        players: usize,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Include the expansion characters, enemies, and upgrades
        #[arg(short, long)]
        expansion: bool,

        /// Use the aggressive ruleset (kill steals, sabotage, no sharing)
        #[arg(short, long)]
        aggressive: bool,

        /// Board layout: standard or compact
        #[arg(short, long, default_value = "standard")]
        layout: cli::LayoutArg,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save the recording to a file
        #[arg(long)]
        save: Option<std::path::PathBuf>,

        /// Suppress turn-by-turn output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Step through a recorded game
    Replay {
        /// Recording file (JSON)
        #[arg(required = true)]
        recording: std::path::PathBuf,

        /// Stop at a specific step (default: end of recording)
        #[arg(short, long)]
        step: Option<usize>,

        /// Print the board after every step, not just the last
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run mass parallel games and check engine invariants
    Soak {
        /// Number of games to run (default: 1000)
        #[arg(short, long, default_value = "1000")]
        games: u64,

        /// Number of players per game (1-4)
        #[arg(short, long, default_value = "2")]
        players: usize,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Show progress bar
        #[arg(long)]
        progress: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Run {
            players,
            seed,
            expansion,
            aggressive,
            layout,
            format,
            save,
            quiet,
        } => cli::run::execute(players, seed, expansion, aggressive, layout, format, save, quiet),

        Commands::Replay {
            recording,
            step,
            verbose,
        } => cli::replay::execute(&recording, step, verbose),

        Commands::Soak {
            games,
            players,
            seed,
            threads,
            progress,
        } => cli::soak::execute(games, players, seed, threads, progress),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
