use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use thiserror::Error;
use uuid::Uuid;

use crate::wallhaven::browse::SelectionEntry;
use crate::wallhaven::download::{self, DownloadError, fetch_to_path};
use crate::wallhaven::io::Config;
use crate::wallhaven::sender::RequestSender;

pub(crate) mod capability;
pub(crate) mod geometry;

use capability::{EnvSnapshot, TerminalCapability, detect_capability};
use geometry::PreviewGeometry;

/// Why a preview could not be rendered.
#[derive(Debug, Error)]
pub(crate) enum PreviewError {
    #[error("sixel support detected but no converter found (install libsixel or imagemagick)")]
    NoSixelConverter,
    #[error("no supported image preview method found")]
    NoPreviewMethod,
    #[error("could not recover an image URL from \"{0}\"")]
    UnrecognizedLine(String),
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error("failed to execute preview command: {0}")]
    Render(#[source] io::Error),
    #[error("preview command exited with {0}")]
    RenderFailed(ExitStatus),
    #[error("failed to remove temp file {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The external renderer that will draw the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Backend {
    /// kitty's native image protocol; streams the remote URL directly.
    KittyIcat,
    /// libsixel's dedicated encoder; needs a local file.
    Img2Sixel,
    /// ImageMagick emitting sixel output; needs a local file.
    MagickSixel,
    /// chafa cell art; needs a local file.
    Chafa,
}

impl Backend {
    /// Whether this renderer consumes a local file rather than a URL.
    fn needs_local_file(&self) -> bool {
        !matches!(self, Backend::KittyIcat)
    }
}

/// Picks the renderer for a capability tier.
///
/// Pure over the injected binary-availability predicate so dispatch is
/// testable without spawning anything. Within the sixel tier img2sixel wins
/// over ImageMagick; a tier with no usable binary fails loudly rather than
/// silently degrading.
pub(crate) fn choose_backend<F>(
    capability: TerminalCapability,
    available: F,
) -> Result<Backend, PreviewError>
where
    F: Fn(&str) -> bool,
{
    match capability {
        TerminalCapability::NativeProtocol => Ok(Backend::KittyIcat),
        TerminalCapability::Sixel => {
            if available("img2sixel") {
                Ok(Backend::Img2Sixel)
            } else if available("magick") {
                Ok(Backend::MagickSixel)
            } else {
                Err(PreviewError::NoSixelConverter)
            }
        }
        TerminalCapability::CellArt => {
            if available("chafa") {
                Ok(Backend::Chafa)
            } else {
                Err(PreviewError::NoPreviewMethod)
            }
        }
        TerminalCapability::None => Err(PreviewError::NoPreviewMethod),
    }
}

/// Renders the inline preview for one selector row.
///
/// Navigation rows are a deliberate no-op: fzf invokes the hook on them too,
/// and success keeps the pane blank instead of erroring on every keystroke.
pub(crate) fn render_preview(sender: &RequestSender, line: &str) -> Result<(), PreviewError> {
    let url = match SelectionEntry::parse(line) {
        Some(SelectionEntry::Item { url, .. }) => url,
        Some(_) => return Ok(()),
        None => return Err(PreviewError::UnrecognizedLine(line.to_string())),
    };

    let env = EnvSnapshot::capture();
    let capability = detect_capability(&env);
    let geometry = PreviewGeometry::resolve(&env);

    // Backend availability is settled before anything is downloaded.
    let backend = choose_backend(capability, |binary| which::which(binary).is_ok())?;

    let temp = if backend.needs_local_file() {
        let path = unique_temp_path(Config::get().temp_folder(), &url);
        fetch_to_path(sender, &url, &path)?;
        Some(path)
    } else {
        None
    };

    let mut command = build_command(backend, &url, temp.as_deref(), &geometry);
    run_with_cleanup(&mut command, temp.as_deref())
}

fn build_command(
    backend: Backend,
    url: &str,
    file: Option<&Path>,
    geometry: &PreviewGeometry,
) -> Command {
    // File-consuming backends are only built after the temp download, so the
    // path is always present for them.
    let file = file.map(Path::to_path_buf).unwrap_or_default();

    match backend {
        Backend::KittyIcat => {
            let mut command = Command::new("kitty");
            command
                .arg("icat")
                .arg("--clear")
                .arg("--transfer-mode=memory")
                .arg("--unicode-placeholder")
                .arg("--stdin=no")
                .arg(format!(
                    "--place={}x{}@0x0",
                    geometry.cell_width, geometry.cell_height
                ))
                .arg("--scale-up")
                .arg(url);
            command
        }
        Backend::Img2Sixel => {
            let mut command = Command::new("img2sixel");
            command
                .arg("-w")
                .arg(geometry.pixel_width.to_string())
                .arg(file);
            command
        }
        Backend::MagickSixel => {
            let mut command = Command::new("magick");
            command
                .arg(file)
                .arg("-resize")
                .arg(format!(
                    "{}x{}>",
                    geometry.pixel_width, geometry.pixel_height
                ))
                .arg("-quality")
                .arg("100")
                .arg("sixel:-");
            command
        }
        Backend::Chafa => {
            let mut command = Command::new("chafa");
            command
                .arg(file)
                .arg(format!(
                    "--size={}x{}",
                    geometry.cell_width, geometry.cell_height
                ))
                .arg("--clear");
            command
        }
    }
}

/// Runs the renderer with the terminal as its stdout/stderr, then removes the
/// temp artifact no matter how the command fared. A render failure takes
/// precedence in the returned error; a cleanup failure is only surfaced once
/// the render itself has succeeded.
fn run_with_cleanup(command: &mut Command, temp: Option<&Path>) -> Result<(), PreviewError> {
    let render = command.status();

    let cleanup = match temp {
        Some(path) => fs::remove_file(path).map_err(|source| PreviewError::Cleanup {
            path: path.to_path_buf(),
            source,
        }),
        None => Ok(()),
    };

    let status = render.map_err(PreviewError::Render)?;
    if !status.success() {
        return Err(PreviewError::RenderFailed(status));
    }

    cleanup
}

/// A temp path named after the image but suffixed with a fresh token, so two
/// previews of the same URL running at once never race on one file.
fn unique_temp_path(dir: &Path, url: &str) -> PathBuf {
    let name = download::file_name_for(url);
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (name, None),
    };

    let token = Uuid::new_v4().simple();
    let file_name = match ext {
        Some(ext) => format!("{stem}-{token}.{ext}"),
        None => format!("{stem}-{token}"),
    };

    dir.join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none_available(_: &str) -> bool {
        false
    }

    #[test]
    fn native_protocol_streams_without_probing_binaries() {
        assert_eq!(
            choose_backend(TerminalCapability::NativeProtocol, none_available).unwrap(),
            Backend::KittyIcat
        );
        assert!(!Backend::KittyIcat.needs_local_file());
    }

    #[test]
    fn sixel_prefers_img2sixel_over_magick() {
        let backend =
            choose_backend(TerminalCapability::Sixel, |b| b == "img2sixel" || b == "magick");
        assert_eq!(backend.unwrap(), Backend::Img2Sixel);

        let backend = choose_backend(TerminalCapability::Sixel, |b| b == "magick");
        assert_eq!(backend.unwrap(), Backend::MagickSixel);
    }

    #[test]
    fn sixel_with_no_converter_fails_before_any_download() {
        // The error carries the install hint, and no temp file is ever
        // requested because dispatch happens first.
        let err = choose_backend(TerminalCapability::Sixel, none_available).unwrap_err();
        assert!(matches!(err, PreviewError::NoSixelConverter));
    }

    #[test]
    fn cell_art_without_chafa_is_a_hard_error() {
        let err = choose_backend(TerminalCapability::CellArt, none_available).unwrap_err();
        assert!(matches!(err, PreviewError::NoPreviewMethod));
    }

    #[test]
    fn navigation_rows_are_a_no_op() {
        let sender = RequestSender::new();
        assert!(render_preview(&sender, "Next page -->").is_ok());
        assert!(render_preview(&sender, "Previous page <--").is_ok());
    }

    #[test]
    fn unrecognizable_lines_error_instead_of_rendering() {
        let sender = RequestSender::new();
        let err = render_preview(&sender, "not a selector line").unwrap_err();
        assert!(matches!(err, PreviewError::UnrecognizedLine(_)));
    }

    #[test]
    fn temp_paths_are_unique_per_invocation_and_keep_the_extension() {
        let dir = Path::new("/tmp/wallgrab");
        let url = "https://w.wallhaven.cc/full/ab/wallhaven-abc123.png";

        let first = unique_temp_path(dir, url);
        let second = unique_temp_path(dir, url);

        assert_ne!(first, second);
        assert_eq!(first.extension().unwrap(), "png");
        assert!(
            first
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("wallhaven-abc123-")
        );
    }

    #[cfg(unix)]
    #[test]
    fn temp_file_is_removed_even_when_the_renderer_fails() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("artifact.png");
        fs::write(&temp, b"bytes").unwrap();

        let err = run_with_cleanup(&mut Command::new("false"), Some(&temp)).unwrap_err();

        assert!(matches!(err, PreviewError::RenderFailed(_)));
        assert!(!temp.exists());
    }

    #[cfg(unix)]
    #[test]
    fn successful_render_still_removes_the_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("artifact.png");
        fs::write(&temp, b"bytes").unwrap();

        run_with_cleanup(&mut Command::new("true"), Some(&temp)).unwrap();

        assert!(!temp.exists());
    }

    #[cfg(unix)]
    #[test]
    fn cleanup_failure_surfaces_once_the_render_succeeded() {
        let missing = Path::new("/nonexistent/wallgrab/artifact.png");

        let err = run_with_cleanup(&mut Command::new("true"), Some(missing)).unwrap_err();

        assert!(matches!(err, PreviewError::Cleanup { .. }));
    }
}
