use std::fs::{create_dir_all, write};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::wallhaven::io::Config;
use crate::wallhaven::sender::RequestSender;

/// What went wrong while fetching and persisting an image.
///
/// Fetch failures are transient and worth retrying by hand; write failures
/// point at the local environment, so the two are kept apart.
#[derive(Debug, Error)]
pub(crate) enum DownloadError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Fetches `url` and persists it under `dest_override`, or the configured
/// save folder when no override is given. Returns the path written to.
///
/// The local file is named after the URL's final path segment. Fetches are
/// at-most-once; a failed download is reported, never silently retried.
pub(crate) fn fetch_and_store(
    sender: &RequestSender,
    url: &str,
    dest_override: Option<&Path>,
) -> Result<PathBuf, DownloadError> {
    let dir = match dest_override {
        Some(dir) => dir.to_path_buf(),
        None => Config::get().save_folder().to_path_buf(),
    };
    let path = dir.join(file_name_for(url));

    fetch_to_path(sender, url, &path)?;
    Ok(path)
}

/// Fetches `url` into exactly `path`, creating parent directories as needed.
pub(crate) fn fetch_to_path(
    sender: &RequestSender,
    url: &str,
    path: &Path,
) -> Result<(), DownloadError> {
    let bytes = sender.get_bytes(url).map_err(|source| DownloadError::Fetch {
        url: url.to_string(),
        source,
    })?;

    if let Some(parent) = path.parent() {
        create_dir_all(parent).map_err(|source| DownloadError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    write(path, &bytes).map_err(|source| DownloadError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// The URL's final path segment, used as the local file name.
pub(crate) fn file_name_for(url: &str) -> &str {
    url.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("image")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_the_file_after_the_last_url_segment() {
        assert_eq!(
            file_name_for("https://w.wallhaven.cc/full/ab/wallhaven-abc123.png"),
            "wallhaven-abc123.png"
        );
    }

    #[test]
    fn tolerates_trailing_slashes_and_bare_urls() {
        assert_eq!(file_name_for("https://example.com/dir/"), "dir");
        assert_eq!(file_name_for(""), "image");
    }
}
