use std::process::Command;

use anyhow::{Context, Error};
use console::Term;

use crate::wallhaven::browse::{self, PageState};
use crate::wallhaven::download::fetch_and_store;
use crate::wallhaven::io::Config;
use crate::wallhaven::preview;
use crate::wallhaven::sender::RequestSender;

/// The name of the cargo package.
const NAME: &str = env!("CARGO_PKG_NAME");

/// The version of the cargo package.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Handles the flow of each subcommand after the CLI surface has been parsed.
pub(crate) struct Program {
    request_sender: RequestSender,
}

impl Program {
    /// Creates a new instance of the program, making sure a config file exists
    /// before any command runs.
    pub(crate) fn new() -> Result<Self, Error> {
        trace!("Starting {} {}...", NAME, VERSION);

        if !Config::config_exists() {
            info!("Creating config file...");
            Config::create_config()?;
        }

        Ok(Program {
            request_sender: RequestSender::new(),
        })
    }

    /// Runs the interactive paginated search and downloads the chosen image.
    pub(crate) fn search(&self, query: &str) -> Result<(), Error> {
        Term::stdout().set_title(NAME);

        let url = browse::run_interactive_search(&self.request_sender, query, PageState::first())?;
        let saved = fetch_and_store(&self.request_sender, &url, None)?;

        info!("[download] {}", saved.display());
        Ok(())
    }

    /// Downloads every URL given on the command line to the save folder.
    pub(crate) fn download(&self, urls: &[String]) -> Result<(), Error> {
        for url in urls {
            let saved = fetch_and_store(&self.request_sender, url, None)?;
            info!("[download] {}", saved.display());
        }

        Ok(())
    }

    /// Browses one of a user's collections, either interactively or by
    /// downloading every page when `all` is set.
    pub(crate) fn collection(&self, username: &str, all: bool, page: u32) -> Result<(), Error> {
        Term::stdout().set_title(NAME);
        let state = PageState::new(page);

        if all {
            return browse::download_collection(&self.request_sender, username, state);
        }

        let url = browse::run_interactive_collection(&self.request_sender, username, state)?;
        let saved = fetch_and_store(&self.request_sender, &url, None)?;

        info!("[download] {}", saved.display());
        Ok(())
    }

    /// Renders the inline preview for the selector row fzf is highlighting.
    pub(crate) fn preview(&self, line: &str) -> Result<(), Error> {
        preview::render_preview(&self.request_sender, line).map_err(Error::from)
    }

    /// Opens the configuration file in the configured editor.
    pub(crate) fn edit(&self) -> Result<(), Error> {
        let config = Config::get();
        let path = Config::config_path();

        let status = Command::new(config.editor())
            .arg(&path)
            .status()
            .with_context(|| format!("failed to launch editor \"{}\"", config.editor()))?;

        if !status.success() {
            anyhow::bail!("editor \"{}\" exited with {}", config.editor(), status);
        }

        Ok(())
    }
}
