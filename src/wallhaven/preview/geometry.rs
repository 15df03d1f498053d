use std::process::Command;

use console::Term;

use crate::wallhaven::preview::capability::EnvSnapshot;

/// Pane size used when every query strategy fails.
const DEFAULT_PANE: (u16, u16) = (80, 24);

/// Rows fzf keeps for its own interface chrome.
const FZF_CHROME_ROWS: u16 = 3;

/// Pixels per cell for terminals we don't recognize.
const DEFAULT_CELL_PIXELS: (u32, u32) = (9, 18);

/// iTerm2 draws slightly smaller cells.
const ITERM_CELL_PIXELS: (u32, u32) = (8, 16);

/// The preview pane's size in both cells and pixels, derived once per
/// invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PreviewGeometry {
    pub(crate) cell_width: u16,
    pub(crate) cell_height: u16,
    pub(crate) pixel_width: u32,
    pub(crate) pixel_height: u32,
}

impl PreviewGeometry {
    pub(crate) fn resolve(env: &EnvSnapshot) -> Self {
        let (cell_width, cell_height) = resolve_pane_size(env);
        let (pixel_width, pixel_height) =
            cells_to_pixels(cell_width, cell_height, env.term_program.as_deref());

        PreviewGeometry {
            cell_width,
            cell_height,
            pixel_width,
            pixel_height,
        }
    }
}

/// Determines the preview pane's size in cells, falling through strategies:
/// the controlling terminal, `tput`, fzf's own pane hints, then 80x24.
///
/// A strategy that yields non-numeric output counts as failed and falls
/// through; zero-sized geometry is never produced.
pub(crate) fn resolve_pane_size(env: &EnvSnapshot) -> (u16, u16) {
    if let Some((rows, cols)) = Term::stdout().size_checked() {
        return pane_from_terminal(cols, rows);
    }

    if let Some((cols, rows)) = tput_size() {
        return pane_from_terminal(cols, rows);
    }

    if let Some(pane) = hinted_pane_size(env) {
        return pane;
    }

    DEFAULT_PANE
}

/// fzf's default layout: the preview takes half the width, and three rows go
/// to the finder's own interface.
fn pane_from_terminal(cols: u16, rows: u16) -> (u16, u16) {
    (cols / 2, rows.saturating_sub(FZF_CHROME_ROWS))
}

fn tput_size() -> Option<(u16, u16)> {
    let cols = tput_number("cols")?;
    let rows = tput_number("lines")?;
    Some((cols, rows))
}

fn tput_number(arg: &str) -> Option<u16> {
    let output = Command::new("tput").arg(arg).output().ok()?;
    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout).trim().parse().ok()
}

/// The pane size fzf advertises to its preview command, when both hints are
/// present and numeric.
fn hinted_pane_size(env: &EnvSnapshot) -> Option<(u16, u16)> {
    let cols = env.fzf_preview_columns.as_deref()?.trim().parse().ok()?;
    let rows = env.fzf_preview_lines.as_deref()?.trim().parse().ok()?;
    Some((cols, rows))
}

/// Converts cell dimensions to pixels using a per-terminal-program ratio,
/// then scales by 0.95 to leave visual padding.
pub(crate) fn cells_to_pixels(
    cell_width: u16,
    cell_height: u16,
    term_program: Option<&str>,
) -> (u32, u32) {
    let (per_cell_w, per_cell_h) = match term_program {
        Some("iTerm.app") => ITERM_CELL_PIXELS,
        _ => DEFAULT_CELL_PIXELS,
    };

    let width = u32::from(cell_width) * per_cell_w * 95 / 100;
    let height = u32::from(cell_height) * per_cell_h * 95 / 100;
    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ratio_applies_padding() {
        // 80 * 9 = 720, 24 * 18 = 432, both scaled by 0.95.
        assert_eq!(cells_to_pixels(80, 24, None), (684, 410));
    }

    #[test]
    fn iterm_uses_its_smaller_cell_ratio() {
        assert_eq!(cells_to_pixels(80, 24, Some("iTerm.app")), (608, 364));
        // Unrecognized programs get the default ratio.
        assert_eq!(
            cells_to_pixels(80, 24, Some("WezTerm")),
            cells_to_pixels(80, 24, None)
        );
    }

    #[test]
    fn pixel_output_is_monotonic_in_both_cell_dimensions() {
        let mut last_w = 0;
        let mut last_h = 0;
        for cells in 0..200u16 {
            let (w, h) = cells_to_pixels(cells, cells, None);
            assert!(w >= last_w && h >= last_h);
            last_w = w;
            last_h = h;
        }
    }

    #[test]
    fn fzf_hints_are_used_when_numeric() {
        let env = EnvSnapshot {
            fzf_preview_columns: Some("91".to_string()),
            fzf_preview_lines: Some("38".to_string()),
            ..EnvSnapshot::default()
        };

        assert_eq!(hinted_pane_size(&env), Some((91, 38)));
    }

    #[test]
    fn non_numeric_hints_fail_instead_of_degrading_to_zero() {
        let env = EnvSnapshot {
            fzf_preview_columns: Some("wide".to_string()),
            fzf_preview_lines: Some("38".to_string()),
            ..EnvSnapshot::default()
        };

        assert_eq!(hinted_pane_size(&env), None);
    }

    #[test]
    fn terminal_size_maps_to_half_width_minus_chrome() {
        assert_eq!(pane_from_terminal(200, 50), (100, 47));
        // Tiny terminals saturate rather than underflow.
        assert_eq!(pane_from_terminal(10, 2), (5, 0));
    }
}
