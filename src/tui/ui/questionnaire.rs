//! Questionnaire form: sixteen bounded controls plus live BMI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::category::{english_gloss, EDUCATION_LABELS};
use crate::domain::{Answer, Answers, Control, Question, QUESTIONS};
use crate::tui::styles::MedicalTheme;

/// Longest accepted edit buffer; more digits than any control can use.
const MAX_EDIT_LEN: usize = 12;

/// Form state: committed answers plus the text being typed into the selected control.
pub struct QuestionnaireState {
    pub answers: Answers,
    pub selected: usize,
    pub edit_buffer: String,
    pub error_message: Option<String>,
}

impl Default for QuestionnaireState {
    fn default() -> Self {
        Self {
            answers: Answers::defaults(),
            selected: 0,
            edit_buffer: String::new(),
            error_message: None,
        }
    }
}

impl QuestionnaireState {
    #[must_use]
    pub fn selected_question(&self) -> &'static Question {
        &QUESTIONS[self.selected]
    }

    /// Move to the next control, committing any typed value first.
    pub fn next_field(&mut self) {
        if self.commit_edit() {
            self.selected = (self.selected + 1) % QUESTIONS.len();
        }
    }

    /// Move to the previous control, committing any typed value first.
    pub fn prev_field(&mut self) {
        if self.commit_edit() {
            self.selected = (self.selected + QUESTIONS.len() - 1) % QUESTIONS.len();
        }
    }

    /// Step the selected control forward or back (wraps for choices).
    pub fn nudge(&mut self, forward: bool) {
        if self.commit_edit() {
            self.answers.nudge(self.selected_question().id, forward);
        }
    }

    /// Type a character into the selected numeric control.
    pub fn input_char(&mut self, c: char) {
        if !matches!(self.selected_question().control, Control::Numeric(_)) {
            return;
        }
        if (c.is_ascii_digit() || c == '.' || c == '-') && self.edit_buffer.len() < MAX_EDIT_LEN {
            self.edit_buffer.push(c);
            self.error_message = None;
        }
    }

    pub fn delete_char(&mut self) {
        self.edit_buffer.pop();
    }

    pub fn clear_field(&mut self) {
        self.edit_buffer.zeroize();
    }

    /// Parse the edit buffer into the selected control, clamped to its bounds.
    ///
    /// Returns false (and sets the error message) if the text is not a number.
    pub fn commit_edit(&mut self) -> bool {
        if self.edit_buffer.is_empty() {
            return true;
        }
        let question = self.selected_question();
        match self.edit_buffer.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                self.answers.set_numeric(question.id, value);
                self.edit_buffer.zeroize();
                self.error_message = None;
                true
            }
            _ => {
                self.error_message = Some(format!("{}: Invalid number", question.label));
                false
            }
        }
    }

    /// Wipe the edit buffer and restore every control to its default.
    pub fn clear_sensitive(&mut self) {
        self.edit_buffer.zeroize();
        self.answers = Answers::defaults();
        self.error_message = None;
        self.selected = 0;
    }

    /// Text shown in a control's box.
    fn display_value(&self, index: usize) -> String {
        let question = &QUESTIONS[index];
        match (question.control, self.answers.get(question.id)) {
            (Control::Numeric(spec), Answer::Numeric(v)) => {
                if question.unit.is_empty() {
                    spec.format(v)
                } else {
                    format!("{} {}", spec.format(v), question.unit)
                }
            }
            (Control::Choice(_), Answer::Choice(_)) => {
                let label = self.answers.choice_label(question.id).unwrap_or_default();
                format!("< {label} >")
            }
            _ => String::new(),
        }
    }
}

/// Render the questionnaire.
pub fn render_questionnaire(f: &mut Frame, area: Rect, state: &QuestionnaireState, model: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_header(f, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(chunks[1]);

    render_fields(f, body[0], state);
    render_side_panel(f, body[1], state, model);
    render_footer(f, chunks[2], state);
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" Liver Fibrosis Risk ", MedicalTheme::header()),
        Span::styled(
            " │ Enter your measurements, then press Enter to predict",
            MedicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_fields(f: &mut Frame, area: Rect, state: &QuestionnaireState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = QUESTIONS.len().div_ceil(2);
    render_field_column(f, columns[0], state, 0..mid);
    render_field_column(f, columns[1], state, mid..QUESTIONS.len());
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    state: &QuestionnaireState,
    range: std::ops::Range<usize>,
) {
    let constraints: Vec<Constraint> = range
        .clone()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (slot, index) in range.enumerate() {
        let question = &QUESTIONS[index];
        let is_selected = index == state.selected;

        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", question.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        if is_selected && !state.edit_buffer.is_empty() {
            spans.push(Span::styled(state.edit_buffer.as_str(), MedicalTheme::editing()));
            spans.push(Span::styled("▌", MedicalTheme::cursor()));
        } else {
            spans.push(Span::styled(state.display_value(index), MedicalTheme::text()));
            if is_selected {
                spans.push(Span::styled(" ▌", MedicalTheme::cursor()));
            }
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[slot]);
    }
}

fn render_side_panel(f: &mut Frame, area: Rect, state: &QuestionnaireState, model: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // BMI
            Constraint::Length(4), // Selected choice gloss
            Constraint::Min(0),    // Education legend
        ])
        .margin(1)
        .split(area);

    let bmi_line = match state.answers.bmi() {
        Ok(bmi) => Line::from(vec![
            Span::styled("Your BMI: ", MedicalTheme::text_secondary()),
            Span::styled(format!("{bmi:.2}"), MedicalTheme::subtitle()),
        ]),
        Err(e) => Line::from(Span::styled(e.to_string(), MedicalTheme::warning())),
    };
    let bmi = Paragraph::new(vec![bmi_line])
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(Span::styled(" BMI ", MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        );
    f.render_widget(bmi, chunks[0]);

    let question = state.selected_question();
    let gloss = match question.control {
        Control::Choice(_) => state
            .answers
            .choice_label(question.id)
            .map(english_gloss)
            .unwrap_or_default()
            .to_string(),
        Control::Numeric(spec) => format!(
            "{} to {} {} (step {})",
            spec.format(spec.min),
            spec.format(spec.max),
            question.unit,
            spec.step
        ),
    };
    let hint = Paragraph::new(Line::from(Span::styled(gloss, MedicalTheme::text_muted())))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" {} ", question.label),
                    MedicalTheme::text_secondary(),
                ))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        );
    f.render_widget(hint, chunks[1]);

    let mut legend: Vec<Line> = EDUCATION_LABELS
        .iter()
        .enumerate()
        .map(|(code, label)| {
            Line::from(vec![
                Span::styled(format!("{code} "), MedicalTheme::key_hint()),
                Span::styled(*label, MedicalTheme::text()),
                Span::styled(format!(" {}", english_gloss(label)), MedicalTheme::text_muted()),
            ])
        })
        .collect();
    legend.push(Line::from(""));
    legend.push(Line::from(Span::styled(
        "GED: General Educational Development certificate. AA: Associate of Arts degree.",
        MedicalTheme::text_muted(),
    )));
    legend.push(Line::from(""));
    legend.push(Line::from(vec![
        Span::styled("Model: ", MedicalTheme::text_secondary()),
        Span::styled(model, MedicalTheme::text_muted()),
    ]));

    let legend = Paragraph::new(legend).wrap(Wrap { trim: true }).block(
        Block::default()
            .title(Span::styled(" Education levels ", MedicalTheme::text_secondary()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(legend, chunks[2]);
}

fn render_footer(f: &mut Frame, area: Rect, state: &QuestionnaireState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[←→] ", MedicalTheme::key_hint()),
            Span::styled("Adjust ", MedicalTheme::key_desc()),
            Span::styled("[0-9.] ", MedicalTheme::key_hint()),
            Span::styled("Type ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Predict ", MedicalTheme::key_desc()),
            Span::styled("[Ctrl+R] ", MedicalTheme::key_hint()),
            Span::styled("Reset ", MedicalTheme::key_desc()),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
