//! Main TUI application state machine.
//!
//! Two screens: the questionnaire ("awaiting input") and the result
//! ("result computed and displayed"). Enter on the questionnaire runs one
//! prediction; any key on the result returns to the questionnaire.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::{load_classifier, LoadedModel};
use crate::application::PredictionService;
use crate::config::Settings;
use crate::ports::Classifier;

use super::ui::{
    questionnaire::{render_questionnaire, QuestionnaireState},
    render_disclaimer,
    result::{render_result, ResultState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Questionnaire,
    Result,
}

/// Main application state
pub struct App<C: Classifier> {
    screen: Screen,
    should_quit: bool,
    service: PredictionService<C>,
    /// Cached once; the model never changes after startup.
    model_description: String,
    form: QuestionnaireState,
    result: Option<ResultState>,
}

impl App<LoadedModel> {
    /// Load and verify the configured model, then build the application.
    ///
    /// # Errors
    /// Returns error if the model path is missing, the verifying key is
    /// unusable, or the model fails verification or parsing.
    pub fn new(settings: &Settings) -> Result<Self> {
        let model_path = settings.model_path.as_path();
        if !model_path.exists() {
            return Err(anyhow!(
                "Model path not found at {:?}. Set FIBRORISK_MODEL_PATH to a directory containing model.json.",
                model_path
            ));
        }

        let policy = settings
            .verification_policy()
            .map_err(|e| anyhow!("Invalid model verifying key: {}", e))?;

        // Refuse to start if the model cannot be loaded or verified.
        let model = load_classifier(model_path, &policy)
            .map_err(|e| anyhow!("Failed to load model from {:?}: {}", model_path, e))?;

        Ok(Self::with_service(PredictionService::new(Arc::new(model))))
    }
}

impl<C: Classifier> App<C> {
    /// Create application with an injected prediction service.
    pub fn with_service(service: PredictionService<C>) -> Self {
        Self {
            screen: Screen::Questionnaire,
            should_quit: false,
            model_description: service.model_description(),
            service,
            form: QuestionnaireState::default(),
            result: None,
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(4)])
                    .split(f.area());

                match (self.screen, &self.result) {
                    (Screen::Result, Some(result)) => render_result(f, chunks[0], result),
                    _ => render_questionnaire(f, chunks[0], &self.form, &self.model_description),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    // Windows reports releases too.
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        self.form.clear_sensitive();
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key, KeyCode::Char('q') | KeyCode::Char('c'))
        {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Questionnaire => self.handle_questionnaire_key(key, modifiers),
            Screen::Result => {
                self.result = None;
                self.screen = Screen::Questionnaire;
            }
        }
    }

    fn handle_questionnaire_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        match key {
            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.form.clear_sensitive();
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Esc => self.form.clear_field(),
            KeyCode::Up | KeyCode::BackTab => self.form.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form.next_field(),
            KeyCode::Left => self.form.nudge(false),
            KeyCode::Right => self.form.nudge(true),
            KeyCode::Char(c) => self.form.input_char(c),
            KeyCode::Backspace => self.form.delete_char(),
            KeyCode::Delete => self.form.clear_field(),
            KeyCode::Enter => self.submit(),
            _ => {}
        }
    }

    /// Run one prediction from the current answers.
    ///
    /// On failure the questionnaire stays up with the error shown.
    fn submit(&mut self) {
        if !self.form.commit_edit() {
            return;
        }

        let input = match self.form.answers.to_raw_input() {
            Ok(input) => input,
            Err(e) => {
                self.form.error_message = Some(e.to_string());
                return;
            }
        };
        let bmi = self.form.answers.bmi().unwrap_or(f64::NAN);

        match self.service.predict(&input) {
            Ok(result) => {
                self.form.error_message = None;
                self.result = Some(ResultState { result, bmi });
                self.screen = Screen::Result;
            }
            Err(e) => {
                tracing::error!("Prediction failed: {}", e);
                self.form.error_message = Some(e.to_string());
            }
        }
    }
}
