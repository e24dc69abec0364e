mod app;
mod config;
mod error;
mod export;
mod filter;
mod format;
mod index;
mod input;
mod live;
mod logging;
mod pager;
mod session;
mod sources;
mod theme;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use app::AppState;
use config::{Config, PageSize};
use error::ViewerError;
use filter::Filter;
use format::LineFormatter;
use session::{Message, SessionOptions, Transition, ViewerSession};
use sources::{FileTail, LineEvent, LineSource, LineStream};
use theme::Theme;

const TICK: Duration = Duration::from_millis(16);

const AFTER_HELP: &str = "\
Examples:
  cml app.log
  cml app.log --filter ERROR
  cml app.log --search timeout --pagesize 30
  cml app.log --live --filter WARN
  cml app.log --filter ERROR --export errors.txt

Controls:
  Enter, Space, j, Down  Next page
  PgDn                   Next page
  k, Up, PgUp            Previous page
  g, Home / G, End       First / last page
  Ctrl+S, /              Search (Enter applies, Esc cancels)
  w                      Toggle line wrap
  ?                      Help
  q, Ctrl+C              Quit";

/// Paged terminal viewer for large log files
#[derive(Parser, Debug)]
#[command(name = "cml")]
#[command(version)]
#[command(about = "Page through large log files with level filtering, search and live tail")]
#[command(after_help = AFTER_HELP)]
pub struct Args {
    /// Log file to view
    pub file: PathBuf,

    /// Only show lines containing this level (e.g. ERROR, WARN)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Only show lines containing this text (case-insensitive)
    #[arg(short, long)]
    pub search: Option<String>,

    /// Lines per page; values below 1 fall back to the default
    #[arg(short, long, allow_negative_numbers = true)]
    pub pagesize: Option<i64>,

    /// Write the lines on screen to this file on quit
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// Follow the file and show new lines as they are written
    #[arg(short, long)]
    pub live: bool,

    /// Color theme (default, kawaii, cyber, dracula, monochrome)
    #[arg(long)]
    pub theme: Option<String>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Defaults, config file, environment, then CLI flags
    let mut config = Config::load(args.config.as_deref())?;
    if let Err(e) = logging::init(&config.log_file) {
        eprintln!("warning: logging disabled: {}", e);
    }
    apply_cli_overrides(&mut config, &args);
    info!(config = ?config, "configuration loaded");

    let formatter = LineFormatter::new(
        Theme::by_name(&config.theme),
        config.level_colors,
        config.timestamp_format.clone(),
    );
    let session = ViewerSession::open(SessionOptions {
        path: args.file.clone(),
        filter: Filter::new(args.filter.clone(), args.search.clone()),
        page_size: config.page_size,
        live: args.live,
        formatter,
    })?;

    // Start tailing before the UI so no appended line is missed
    let mut live_stream = if session.is_live() {
        Some(start_tail(&session, &config).await)
    } else {
        None
    };

    let source_name = session
        .path()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| session.path().display().to_string());
    let mut state = AppState::new(session, source_name);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic);
    }));

    let result = run_event_loop(&mut terminal, &mut state, &config, &mut live_stream).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Stops the tail task
    drop(live_stream);
    result?;

    if let Some(err) = state.session.take_error() {
        return Err(err.into());
    }

    if let Some(path) = &args.export {
        let count = export::export_lines(state.session.held_lines(), path)?;
        println!("Exported {} lines to {}", count, path.display());
    }

    Ok(())
}

/// CLI flags win over every other config source.
///
/// Runs after logging is up so clamping warnings reach the log file.
fn apply_cli_overrides(config: &mut Config, args: &Args) {
    if let Some(size) = args.pagesize {
        config.page_size = PageSize::new(size);
    }
    if let Some(theme) = &args.theme {
        config.theme = theme.clone();
    }
}

/// Tail the session's file from where its index ends
async fn start_tail(session: &ViewerSession, config: &Config) -> LineStream {
    let from = session.live_resume_offset();
    let tail = FileTail::new(
        session.path().to_path_buf(),
        from,
        config.poll_interval,
        config.channel_buffer,
    );
    info!(source = %tail.name(), from, "starting live tail");
    tail.stream().await
}

/// Next event from the live stream, or never when there is none
async fn next_line_event(stream: &mut Option<LineStream>) -> Option<LineEvent> {
    match stream {
        Some(stream) => stream.recv().await,
        None => std::future::pending().await,
    }
}

fn line_message(event: Option<LineEvent>) -> Message {
    match event {
        Some(LineEvent::Line(line)) => Message::LineArrived(line),
        Some(LineEvent::Error(msg)) => Message::Error(ViewerError::Stream(msg)),
        None => Message::Error(ViewerError::StreamClosed),
    }
}

fn handle_terminal_event(state: &mut AppState, event: Event) -> Transition {
    match event {
        // Only handle key press events (not release)
        Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key(state, key),
        Event::Mouse(mouse) => input::handle_mouse(state, mouse),
        Event::Resize(width, height) => state.dispatch(Message::Resize { width, height }),
        _ => Transition::Continue,
    }
}

async fn run_event_loop<'a>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState<'a>,
    config: &Config,
    live_stream: &mut Option<LineStream>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            ui::draw(frame, state);
        })?;

        let transition = tokio::select! {
            _ = tokio::time::sleep(TICK) => {
                // Poll for events with no blocking
                if event::poll(Duration::ZERO)? {
                    handle_terminal_event(state, event::read()?)
                } else {
                    Transition::Continue
                }
            }

            event = next_line_event(live_stream) => state.dispatch(line_message(event)),
        };

        match transition {
            Transition::Continue => {}
            Transition::RestartLive { .. } => {
                *live_stream = None;
                *live_stream = Some(start_tail(&state.session, config).await);
            }
            Transition::StopLive => {
                *live_stream = None;
            }
            Transition::Close => break,
        }

        if state.should_quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_does_not_error() {
        let err = Args::try_parse_from(["cml", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert!(err.to_string().contains("Controls:"));
    }

    #[test]
    fn test_file_is_required() {
        let err = Args::try_parse_from(["cml"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["cml", "app.log"]);
        assert_eq!(args.file, PathBuf::from("app.log"));
        assert_eq!(args.filter, None);
        assert_eq!(args.search, None);
        assert_eq!(args.pagesize, None);
        assert_eq!(args.export, None);
        assert!(!args.live);
        assert_eq!(args.theme, None);
        assert_eq!(args.config, None);
    }

    #[test]
    fn test_all_flags() {
        let args = Args::parse_from([
            "cml",
            "app.log",
            "--filter",
            "ERROR",
            "--search",
            "db",
            "--pagesize",
            "30",
            "--export",
            "out.txt",
            "--live",
            "--theme",
            "dracula",
        ]);
        assert_eq!(args.filter.as_deref(), Some("ERROR"));
        assert_eq!(args.search.as_deref(), Some("db"));
        assert_eq!(args.pagesize, Some(30));
        assert_eq!(args.export, Some(PathBuf::from("out.txt")));
        assert!(args.live);
        assert_eq!(args.theme.as_deref(), Some("dracula"));
    }

    #[test]
    fn test_negative_pagesize_is_accepted() {
        let args = Args::parse_from(["cml", "app.log", "--pagesize", "-5"]);
        assert_eq!(args.pagesize, Some(-5));
        assert_eq!(PageSize::new(-5).get(), config::DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut config = Config::default();
        config.theme = "kawaii".to_string();

        let args = Args::parse_from(["cml", "app.log", "--pagesize", "0", "--theme", "cyber"]);
        apply_cli_overrides(&mut config, &args);
        assert_eq!(config.page_size.get(), config::DEFAULT_PAGE_SIZE);
        assert_eq!(config.theme, "cyber");

        let mut untouched = Config::default();
        untouched.page_size = PageSize::new(40);
        apply_cli_overrides(&mut untouched, &Args::parse_from(["cml", "app.log"]));
        assert_eq!(untouched.page_size.get(), 40);
        assert_eq!(untouched.theme, "default");
    }

    #[test]
    fn test_line_message_mapping() {
        let line = sources::RawLine::at(0, "x");
        assert!(matches!(
            line_message(Some(LineEvent::Line(line))),
            Message::LineArrived(_)
        ));
        assert!(matches!(
            line_message(Some(LineEvent::Error("gone".to_string()))),
            Message::Error(ViewerError::Stream(_))
        ));
        assert!(matches!(line_message(None), Message::Error(ViewerError::StreamClosed)));
    }
}
