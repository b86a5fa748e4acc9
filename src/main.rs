use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Find and replace in text files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Find a literal string or /pattern/i in a file
    Find {
        file: PathBuf,
        query: String,
        /// Search backward from the end of the file
        #[arg(long)]
        prev: bool,
        /// List every match instead of the first one
        #[arg(long)]
        all: bool,
    },

    /// Replace matches of a query; supports $1..$9 for patterns
    Replace {
        file: PathBuf,
        query: String,
        replacement: String,
        /// Replace every match instead of the first one
        #[arg(long)]
        all: bool,
        /// Write the result back to the file instead of printing it
        #[arg(long)]
        write: bool,
    },

    /// Count matches of a query
    Count { file: PathBuf, query: String },

    /// Display current configuration
    ShowConfig,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let config = config::AppConfig::load();

    let result = match cli.action {
        Action::Find {
            file,
            query,
            prev,
            all,
        } => commands::find::run(&config, &file, &query, prev, all),
        Action::Replace {
            file,
            query,
            replacement,
            all,
            write,
        } => commands::replace::run(&config, &file, &query, &replacement, all, write),
        Action::Count { file, query } => commands::count::run(&config, &file, &query),
        Action::ShowConfig => {
            commands::show_config::run(&config);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("scout: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
