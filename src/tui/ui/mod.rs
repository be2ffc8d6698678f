//! UI module: View components for the TUI.

pub mod questionnaire;
pub mod result;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::MedicalTheme;

/// Result interpretation and disclaimer, shown under every screen.
pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![
            Span::styled("Reading the result: ", MedicalTheme::text_secondary()),
            Span::styled(
                "1 means a liver fibrosis state is indicated; 0 means no liver fibrosis at present. \
                 The probability (0-1) is how likely liver fibrosis is.",
                MedicalTheme::text_muted(),
            ),
        ]),
        Line::from(Span::styled(
            "DISCLAIMER: This tool gives an indicative estimate and does not replace professional medical evaluation.",
            MedicalTheme::text_muted(),
        )),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
