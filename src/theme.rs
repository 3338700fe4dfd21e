//! Theme settings for the TUI.
//!
//! Three modes: a dark palette, a light palette, and "terminal", which
//! inherits whatever colors the terminal emulator is configured with.

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
    Terminal,
}

impl ThemeMode {
    pub fn label(&self) -> &'static str {
        match self {
            ThemeMode::Dark => "Dark",
            ThemeMode::Light => "Light",
            ThemeMode::Terminal => "Terminal",
        }
    }

    /// Next mode in rotation, used by the settings screen.
    pub fn cycle(&self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Terminal,
            ThemeMode::Terminal => ThemeMode::Dark,
        }
    }

    pub fn colors(&self) -> ThemeColors {
        match self {
            ThemeMode::Dark => ThemeColors::dark(),
            ThemeMode::Light => ThemeColors::light(),
            ThemeMode::Terminal => ThemeColors::terminal(),
        }
    }
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Resolved color palette for UI elements.
#[derive(Debug, Clone, Copy)]
pub struct ThemeColors {
    pub fg: Color,
    pub fg_dim: Color,
    pub accent: Color,
    pub title: Color,
    pub favorite: Color,
    pub border: Color,
    pub border_focus: Color,
    pub error: Color,
    pub success: Color,
    pub selection_bg: Color,
}

impl ThemeColors {
    pub fn dark() -> Self {
        Self {
            fg: Color::White,
            fg_dim: Color::DarkGray,
            accent: Color::Cyan,
            title: Color::Magenta,
            favorite: Color::Yellow,
            border: Color::DarkGray,
            border_focus: Color::Cyan,
            error: Color::Red,
            success: Color::Green,
            selection_bg: Color::DarkGray,
        }
    }

    pub fn light() -> Self {
        Self {
            fg: Color::Black,
            fg_dim: Color::Gray,
            accent: Color::Blue,
            title: Color::Rgb(128, 0, 128),
            favorite: Color::Rgb(184, 134, 11),
            border: Color::Gray,
            border_focus: Color::Blue,
            error: Color::Rgb(178, 34, 34),
            success: Color::Rgb(0, 100, 0),
            selection_bg: Color::Rgb(210, 210, 210),
        }
    }

    pub fn terminal() -> Self {
        Self {
            fg: Color::Reset,
            fg_dim: Color::DarkGray,
            accent: Color::Cyan,
            title: Color::Magenta,
            favorite: Color::Yellow,
            border: Color::Reset,
            border_focus: Color::Cyan,
            error: Color::Red,
            success: Color::Green,
            selection_bg: Color::DarkGray,
        }
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.fg)
    }

    pub fn text_dim(&self) -> Style {
        Style::default().fg(self.fg_dim)
    }

    pub fn text_accent(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn text_error(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn text_success(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn block(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn block_focus(&self) -> Style {
        Style::default().fg(self.border_focus)
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .bg(self.selection_bg)
            .add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_visits_every_mode() {
        let start = ThemeMode::Dark;
        let mut mode = start;
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(mode);
            mode = mode.cycle();
        }
        assert_eq!(mode, start);
        assert_eq!(seen.len(), 3);
        assert!(seen.contains(&ThemeMode::Light));
        assert!(seen.contains(&ThemeMode::Terminal));
    }

    #[test]
    fn serializes_as_lowercase_string() {
        let s = toml::to_string(&ConfigProbe { theme: ThemeMode::Light }).unwrap();
        assert!(s.contains("theme = \"light\""));
    }

    #[derive(Serialize)]
    struct ConfigProbe {
        theme: ThemeMode,
    }
}
