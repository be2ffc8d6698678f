//! Color palette and preset styles for the screening form.

use ratatui::style::{Color, Modifier, Style};

use crate::domain::Label;

/// Medical theme color palette.
pub struct MedicalTheme;

impl MedicalTheme {
    /// Deep teal (#0D9488)
    pub const PRIMARY: Color = Color::Rgb(13, 148, 136);
    /// #2DD4BF
    pub const PRIMARY_LIGHT: Color = Color::Rgb(45, 212, 191);
    /// #0F766E
    pub const PRIMARY_DARK: Color = Color::Rgb(15, 118, 110);

    /// Light slate for borders (#94A3B8)
    pub const BORDER: Color = Color::Rgb(148, 163, 184);

    /// Amber (#FBBF24)
    pub const WARNING: Color = Color::Rgb(251, 191, 36);
    /// Rose (#F43F5E)
    pub const DANGER: Color = Color::Rgb(244, 63, 94);

    /// #0F172A
    pub const BG_DARK: Color = Color::Rgb(15, 23, 42);

    pub const TEXT_PRIMARY: Color = Color::Rgb(248, 250, 252);
    pub const TEXT_SECONDARY: Color = Color::Rgb(148, 163, 184);
    pub const TEXT_MUTED: Color = Color::Rgb(100, 116, 139);

    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    #[must_use]
    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::DANGER)
    }

    /// Value being typed into the selected control.
    #[must_use]
    pub fn editing() -> Style {
        Style::default()
            .fg(Self::BG_DARK)
            .bg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn focused() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn cursor() -> Style {
        Style::default().fg(Self::PRIMARY_LIGHT)
    }

    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    #[must_use]
    pub fn header() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .bg(Self::PRIMARY_DARK)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Style for a predicted class.
    #[must_use]
    pub fn label(label: Label) -> Style {
        let (r, g, b) = label.color();
        Style::default()
            .fg(Color::Rgb(r, g, b))
            .add_modifier(Modifier::BOLD)
    }

    /// Gauge style for a positive-class probability.
    #[must_use]
    pub fn probability(p: f64) -> Style {
        if p > 0.5 {
            Self::danger()
        } else if p >= 0.3 {
            Self::warning()
        } else {
            Self::label(Label::NoFibrosis)
        }
    }
}
