//! Blockfall - a falling-block puzzle in the terminal
//!
//! Thin shell around the engine: renders snapshots, turns keys into commands
//! and feeds wall-clock time to the engine's virtual clock.

mod input;
mod ui;

use anyhow::Context;
use blockfall::game::{Command, Game};
use blockfall::settings::Settings;
use blockfall::snapshot::Snapshot;
use crossterm::{
    event::{
        self, Event, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use input::{Action, InputHandler};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io::{self, stdout},
    path::PathBuf,
    time::{Duration, Instant},
};

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

/// Get the blockfall temp directory, creating it if needed
fn blockfall_temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("blockfall");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn main() -> anyhow::Result<()> {
    // Generate session ID for this instance
    let session_id: u32 = rand::random();

    let log_dir = blockfall_temp_dir();
    let log_file = format!("{:08x}.log", session_id);

    // Setup tracing to log file, the terminal belongs to the UI
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("blockfall=debug".parse()?),
        )
        .with_ansi(false)
        .init();

    tracing::info!(
        "Blockfall starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let settings = Settings::load();

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let release_events = supports_keyboard_enhancement().unwrap_or(false);
    execute!(stdout(), EnterAlternateScreen).context("failed to enter alternate screen")?;
    if release_events {
        execute!(
            stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    tracing::debug!("Key release events: {}", release_events);

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run app and capture result
    let result = run_app(&mut terminal, &settings, release_events);

    // Restore terminal
    if release_events {
        let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    match &result {
        Ok(snapshot) => {
            println!("\nThanks for playing Blockfall!");
            println!("Score: {} | Lines: {}", snapshot.points, snapshot.lines);
        }
        Err(e) => tracing::error!("Exited with error: {:#}", e),
    }

    result.map(|_| ())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: &Settings,
    release_events: bool,
) -> anyhow::Result<Snapshot> {
    let mut game = Game::new(settings.timing(), settings.seed());
    let mut input = InputHandler::from_settings(settings, release_events);
    let show_ghost = settings.gameplay.show_ghost;
    let mut last_tick = Instant::now();

    loop {
        // Render
        let snapshot = game.snapshot();
        terminal
            .draw(|frame| ui::render_game(frame, &snapshot, show_ghost))
            .context("failed to draw frame")?;

        // Handle input
        let mut actions = Vec::new();
        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => {
                        actions.extend(input.key_down(key, Instant::now()));
                    }
                    KeyEventKind::Release => actions.extend(input.key_up(key)),
                }
            }
        }

        // Catch the engine clock up with wall time before applying input
        let now = Instant::now();
        actions.extend(input.update(now));
        game.advance(now.duration_since(last_tick));
        last_tick = now;

        for action in actions {
            match action {
                Action::Quit => return Ok(game.snapshot()),
                Action::TogglePause if game.phase().is_paused() => {
                    game.handle(Command::Resume);
                }
                Action::TogglePause => {
                    // Held directions end with the pause
                    for owed in input.clear() {
                        if let Action::Game(command) = owed {
                            game.handle(command);
                        }
                    }
                    game.handle(Command::Pause);
                }
                Action::Game(command) => game.handle(command),
            }
        }
    }
}
