use std::env;

/// The terminal's graphics tier, strongest first.
///
/// Computed once per preview invocation from environment state, never
/// persisted. Detection itself never yields `None`; cell art is the universal
/// floor, and the variant exists so the dispatcher can fail loudly on an
/// impossible tier instead of silently drawing nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TerminalCapability {
    NativeProtocol,
    Sixel,
    CellArt,
    None,
}

/// Terminal identifiers known to speak sixel.
const SIXEL_TERMS: &[&str] = &[
    "xterm-256color",
    "mlterm",
    "yaft-256color",
    "foot",
    "contour",
    "tmux-256color",
];

/// The environment signals the detector and geometry resolver read, captured
/// once per invocation so the rest of the pipeline is a pure function of it.
#[derive(Debug, Clone, Default)]
pub(crate) struct EnvSnapshot {
    /// `KITTY_WINDOW_ID`, present only inside kitty.
    pub(crate) kitty_window_id: Option<String>,
    /// The declared terminal type (`TERM`).
    pub(crate) term: Option<String>,
    /// `TERM_PROGRAM`, used for the pixel-per-cell ratio table.
    pub(crate) term_program: Option<String>,
    /// Explicit sixel override (`SIXEL_SUPPORT=1`).
    pub(crate) sixel_override: Option<String>,
    /// Preview pane width advertised by fzf (`FZF_PREVIEW_COLUMNS`).
    pub(crate) fzf_preview_columns: Option<String>,
    /// Preview pane height advertised by fzf (`FZF_PREVIEW_LINES`).
    pub(crate) fzf_preview_lines: Option<String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        EnvSnapshot {
            kitty_window_id: env::var("KITTY_WINDOW_ID").ok(),
            term: env::var("TERM").ok(),
            term_program: env::var("TERM_PROGRAM").ok(),
            sixel_override: env::var("SIXEL_SUPPORT").ok(),
            fzf_preview_columns: env::var("FZF_PREVIEW_COLUMNS").ok(),
            fzf_preview_lines: env::var("FZF_PREVIEW_LINES").ok(),
        }
    }
}

/// Classifies the terminal's graphics capability.
///
/// Pure function of the snapshot: no I/O, no network. The kitty window id
/// wins over every sixel signal; absence of all signals lands on cell art.
pub(crate) fn detect_capability(env: &EnvSnapshot) -> TerminalCapability {
    if env
        .kitty_window_id
        .as_deref()
        .is_some_and(|id| !id.is_empty())
    {
        return TerminalCapability::NativeProtocol;
    }

    let term = env.term.as_deref().unwrap_or_default();
    if SIXEL_TERMS.iter().any(|t| term.contains(t))
        || env.sixel_override.as_deref() == Some("1")
    {
        return TerminalCapability::Sixel;
    }

    TerminalCapability::CellArt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_signals_at_all_falls_back_to_cell_art() {
        assert_eq!(
            detect_capability(&EnvSnapshot::default()),
            TerminalCapability::CellArt
        );
    }

    #[test]
    fn kitty_window_id_wins_even_with_sixel_signals_present() {
        let env = EnvSnapshot {
            kitty_window_id: Some("7".to_string()),
            term: Some("foot".to_string()),
            sixel_override: Some("1".to_string()),
            ..EnvSnapshot::default()
        };

        assert_eq!(detect_capability(&env), TerminalCapability::NativeProtocol);
    }

    #[test]
    fn empty_kitty_window_id_does_not_count() {
        let env = EnvSnapshot {
            kitty_window_id: Some(String::new()),
            ..EnvSnapshot::default()
        };

        assert_eq!(detect_capability(&env), TerminalCapability::CellArt);
    }

    #[test]
    fn sixel_terminals_are_recognized_by_substring() {
        for term in ["foot", "screen.mlterm", "contour-latest"] {
            let env = EnvSnapshot {
                term: Some(term.to_string()),
                ..EnvSnapshot::default()
            };
            assert_eq!(detect_capability(&env), TerminalCapability::Sixel, "{term}");
        }
    }

    #[test]
    fn explicit_override_forces_sixel() {
        let env = EnvSnapshot {
            term: Some("dumb".to_string()),
            sixel_override: Some("1".to_string()),
            ..EnvSnapshot::default()
        };

        assert_eq!(detect_capability(&env), TerminalCapability::Sixel);
    }

    #[test]
    fn detection_is_stable_for_the_same_snapshot() {
        let env = EnvSnapshot {
            term: Some("xterm-256color".to_string()),
            ..EnvSnapshot::default()
        };

        assert_eq!(detect_capability(&env), detect_capability(&env));
    }
}
