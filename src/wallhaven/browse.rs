use anyhow::{Context, Error, bail};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::wallhaven::download::fetch_and_store;
use crate::wallhaven::selector::show_selection;
use crate::wallhaven::sender::RequestSender;
use crate::wallhaven::sender::entries::{CollectionsResponse, ImageEntry, ImagesResponse};

/// Display string for the synthetic forward-navigation row.
const NEXT_PAGE_LABEL: &str = "Next page -->";

/// Display string for the synthetic backward-navigation row.
const PREV_PAGE_LABEL: &str = "Previous page <--";

/// Marker substrings that distinguish navigation rows from item rows.
///
/// Formatted items are `"{resolution} ({url})"`, so neither marker can occur
/// in a legitimate item line. Downstream parsing (including the preview hook)
/// relies on these exact markers.
const FORWARD_MARKER: &str = "-->";
const BACKWARD_MARKER: &str = "<--";

/// Recovers the parenthesized reference at the end of a formatted line.
static TRAILING_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^()]+)\)$").expect("trailing-reference regex is valid"));

/// One row of the list handed to the selector: either a real image or a
/// synthetic navigation control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectionEntry {
    NavigationForward,
    NavigationBackward,
    Item { resolution: String, url: String },
}

impl SelectionEntry {
    fn from_image(entry: &ImageEntry) -> Self {
        SelectionEntry::Item {
            resolution: entry.resolution.clone(),
            url: entry.image_url.clone(),
        }
    }

    /// The human-readable line shown in the selector.
    pub(crate) fn display(&self) -> String {
        match self {
            SelectionEntry::NavigationForward => NEXT_PAGE_LABEL.to_string(),
            SelectionEntry::NavigationBackward => PREV_PAGE_LABEL.to_string(),
            SelectionEntry::Item { resolution, url } => format!("{resolution} ({url})"),
        }
    }

    /// Parses a line the selector returned back into a structured entry.
    ///
    /// Returns `None` when the line is neither a navigation row nor carries a
    /// recoverable reference.
    pub(crate) fn parse(line: &str) -> Option<Self> {
        if line.contains(FORWARD_MARKER) {
            return Some(SelectionEntry::NavigationForward);
        }
        if line.contains(BACKWARD_MARKER) {
            return Some(SelectionEntry::NavigationBackward);
        }

        let url = TRAILING_REF.captures(line.trim())?.get(1)?.as_str().to_string();
        let resolution = line
            .trim()
            .split(" (")
            .next()
            .unwrap_or_default()
            .to_string();

        Some(SelectionEntry::Item { resolution, url })
    }
}

/// The page counter threaded through one loop invocation.
///
/// Owned by the invocation, never process-wide, so concurrent loops (and
/// tests) cannot interfere with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageState {
    current: u32,
}

impl PageState {
    pub(crate) fn first() -> Self {
        PageState { current: 1 }
    }

    pub(crate) fn new(page: u32) -> Self {
        PageState {
            current: page.max(1),
        }
    }

    pub(crate) fn current(&self) -> u32 {
        self.current
    }

    fn advance(&mut self) {
        self.current += 1;
    }

    fn retreat(&mut self) {
        // The backward row is only offered past page 1, so this cannot
        // underflow in practice.
        self.current = self.current.saturating_sub(1).max(1);
    }
}

/// Builds the ordered list handed to the selector: the forward row first when
/// a next page exists, then the backward row when a previous page exists,
/// then every formatted item.
pub(crate) fn build_selection_list(page: &ImagesResponse) -> Vec<SelectionEntry> {
    let mut entries = Vec::with_capacity(page.data.len() + 2);

    if page.meta.last_page > page.meta.current_page {
        entries.push(SelectionEntry::NavigationForward);
    }
    if page.meta.current_page > 1 {
        entries.push(SelectionEntry::NavigationBackward);
    }

    entries.extend(page.data.iter().map(SelectionEntry::from_image));
    entries
}

/// Runs the paginated search flow and returns the chosen image URL.
pub(crate) fn run_interactive_search(
    sender: &RequestSender,
    query: &str,
    state: PageState,
) -> Result<String, Error> {
    select_from_pages(
        |page| sender.search(query, page),
        state,
        "no images matched this search",
    )
}

/// Resolves a collection interactively, then runs the paginated flow over it.
pub(crate) fn run_interactive_collection(
    sender: &RequestSender,
    username: &str,
    state: PageState,
) -> Result<String, Error> {
    let id = resolve_collection(sender, username)?;

    select_from_pages(
        |page| sender.collection(username, id, page),
        state,
        "this collection has no images",
    )
}

/// Downloads every image on every page of a chosen collection, from the
/// starting page through the last, without interactive selection.
pub(crate) fn download_collection(
    sender: &RequestSender,
    username: &str,
    mut state: PageState,
) -> Result<(), Error> {
    let id = resolve_collection(sender, username)?;

    loop {
        let page = sender.collection(username, id, state.current())?;
        if page.data.is_empty() {
            bail!("this collection has no images");
        }

        let progress = page_progress_bar(&page);
        for image in &page.data {
            fetch_and_store(sender, &image.image_url, None)?;
            progress.inc(1);
            trace!("[download] {}", image.id);
        }
        progress.finish_and_clear();
        info!(
            "Downloaded page {}/{} of collection {}",
            page.meta.current_page, page.meta.last_page, id
        );

        if page.meta.last_page > state.current() {
            state.advance();
        } else {
            return Ok(());
        }
    }
}

/// The shared state machine behind search and collection browsing: fetch a
/// page, offer it with navigation rows, and either move a page or settle on
/// an image URL. The selector closing surfaces as an error from
/// [show_selection] and terminates the loop.
fn select_from_pages<F>(fetch: F, mut state: PageState, empty_message: &str) -> Result<String, Error>
where
    F: Fn(u32) -> Result<ImagesResponse, Error>,
{
    loop {
        let page = fetch(state.current())?;
        if page.data.is_empty() {
            bail!("{empty_message}");
        }

        let lines: Vec<String> = build_selection_list(&page)
            .iter()
            .map(SelectionEntry::display)
            .collect();
        let chosen = show_selection(&lines, true)?;

        match SelectionEntry::parse(&chosen)
            .with_context(|| format!("selector returned an unrecognizable line: \"{chosen}\""))?
        {
            SelectionEntry::NavigationForward => state.advance(),
            SelectionEntry::NavigationBackward => state.retreat(),
            SelectionEntry::Item { url, .. } => return Ok(url),
        }
    }
}

/// Asks the user to pick one of `username`'s collections and returns its id.
///
/// Fails before any page fetch when the user has no collections at all.
fn resolve_collection(sender: &RequestSender, username: &str) -> Result<u32, Error> {
    let lines = collection_lines(&sender.collections(username)?)?;
    let chosen = show_selection(&lines, false)?;

    parse_collection_id(&chosen)
        .with_context(|| format!("selector returned an unrecognizable collection: \"{chosen}\""))
}

/// Formats a user's collections as selector lines, failing up front when
/// there are none to offer.
fn collection_lines(collections: &CollectionsResponse) -> Result<Vec<String>, Error> {
    if collections.data.is_empty() {
        bail!("this user has no collections");
    }

    Ok(collections
        .data
        .iter()
        .map(|c| format!("{} ({})", c.label, c.id))
        .collect())
}

fn parse_collection_id(line: &str) -> Option<u32> {
    TRAILING_REF
        .captures(line.trim())?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

fn page_progress_bar(page: &ImagesResponse) -> ProgressBar {
    let progress = ProgressBar::new(page.data.len() as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner} [{bar:40}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    progress.set_style(style);
    progress.set_message(format!(
        "page {}/{}",
        page.meta.current_page, page.meta.last_page
    ));
    progress
}
