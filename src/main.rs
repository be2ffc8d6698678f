//! Fibrorisk: liver fibrosis risk screening.
//!
//! Main entry point for the terminal application.

use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fibrorisk::adapters::sanitize::SanitizingMakeWriter;
use fibrorisk::config::Settings;
use fibrorisk::tui::App;

fn main() -> Result<()> {
    let settings = Settings::from_env();

    // Writing logs to the terminal would corrupt the TUI (alternate screen):
    // interactive sessions log to a file, everything else to stdout.
    let interactive = std::io::stdout().is_terminal();
    let (writer, _guard) = if settings.log_mode.use_file(interactive) {
        if let Some(parent) = settings.log_file.parent() {
            // Best-effort: a missing directory surfaces as the open error below.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&settings.log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::with_limit(
            writer,
            settings.sanitize_max_bytes,
        )))
        .init();

    tracing::info!("Starting Fibrorisk...");

    let mut app = match App::new(&settings) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("{e:#}");
            return Err(e);
        }
    };
    app.run()?;

    tracing::info!("Fibrorisk shutdown complete.");
    Ok(())
}
