#[macro_use]
extern crate log;

use anyhow::Error;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use crate::program::Program;

mod program;
mod wallhaven;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search wallpapers interactively and download the chosen one
    Search {
        /// Search terms, joined with spaces
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Download one or more wallpapers by their image URL
    Download {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Browse a user's collections
    Collection {
        /// The collection owner's username
        username: String,
        /// Download every page of the chosen collection without prompting
        #[arg(long)]
        all: bool,
        /// Page to start browsing from
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Render an inline preview for a selector row (invoked by fzf)
    #[command(hide = true)]
    Preview { line: String },
    /// Open the configuration file in your editor
    Edit,
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    // The preview hook shares the terminal with fzf's preview pane; any log
    // line there would be drawn over the rendered image.
    let level = match cli.command {
        Command::Preview { .. } => LevelFilter::Off,
        _ => LevelFilter::Info,
    };
    initialize_logger(level);

    let program = Program::new()?;
    match cli.command {
        Command::Search { query } => program.search(&query.join(" ")),
        Command::Download { urls } => program.download(&urls),
        Command::Collection {
            username,
            all,
            page,
        } => program.collection(&username, all, page),
        Command::Preview { line } => program.preview(&line),
        Command::Edit => program.edit(),
    }
}

/// Initializes the logger with preset filtering.
fn initialize_logger(level: LevelFilter) {
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}
