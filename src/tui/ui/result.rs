//! Prediction result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::domain::{Label, PredictionResult};
use crate::tui::styles::MedicalTheme;

/// A computed prediction and the BMI it was made with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultState {
    pub result: PredictionResult,
    pub bmi: f64,
}

/// Render the result screen.
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" Prediction Result ", MedicalTheme::header()),
        Span::styled(
            format!(" │ BMI used: {:.2}", state.bmi),
            MedicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(header, chunks[0]);

    render_content(f, chunks[1], &state.result);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("[Any key] ", MedicalTheme::key_hint()),
        Span::styled("Back to questionnaire ", MedicalTheme::key_desc()),
        Span::styled("[Ctrl+Q] ", MedicalTheme::key_hint()),
        Span::styled("Quit", MedicalTheme::key_desc()),
    ]))
    .block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(footer, chunks[2]);
}

fn render_content(f: &mut Frame, area: Rect, result: &PredictionResult) {
    let label_style = MedicalTheme::label(result.label);
    let block = Block::default()
        .title(Span::styled(" Liver Fibrosis ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Label
            Constraint::Length(3), // Probability
            Constraint::Min(0),    // Padding
        ])
        .margin(1)
        .split(inner);

    let icon = match result.label {
        Label::NoFibrosis => "OK",
        Label::Fibrosis => "!",
    };
    let label = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{icon} Prediction: {}", result.label),
            label_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            result.label.description(),
            MedicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(label, chunks[0]);

    match result.probability {
        Some(p) => {
            let gauge = Gauge::default()
                .block(
                    Block::default()
                        .title(Span::styled(" Probability ", MedicalTheme::text_secondary()))
                        .borders(Borders::ALL)
                        .border_style(MedicalTheme::border()),
                )
                .gauge_style(MedicalTheme::probability(p))
                .ratio(p.clamp(0.0, 1.0))
                .label(result.probability_text());
            f.render_widget(gauge, chunks[1]);
        }
        None => {
            let text = Paragraph::new(Line::from(vec![
                Span::styled("Probability: ", MedicalTheme::text_secondary()),
                Span::styled(result.probability_text(), MedicalTheme::text_muted()),
                Span::styled(
                    " (this model reports labels only)",
                    MedicalTheme::text_muted(),
                ),
            ]))
            .alignment(Alignment::Center);
            f.render_widget(text, chunks[1]);
        }
    }
}
