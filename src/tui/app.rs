use super::editor;
use super::session::{Command, End, Outcome, Phase, ReviewSession, SessionEvent};
use super::ui::draw_ui;
use crate::config::ReviewSettings;
use crate::core::llm::MessageGenerator;
use crate::git::VcsBridge;

use anyhow::{Result, anyhow};
use colored::Colorize;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::{Stream, StreamExt};
use log::debug;
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use std::io;
use std::panic;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::Interval;

type Tui = Terminal<CrosstermBackend<io::Stdout>>;
type Generation = oneshot::Receiver<Result<String>>;

/// Why `drive` handed control back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Finished,
    OpenEditor,
}

/// Run one review session end to end.
///
/// Returns the session outcome; a session that ends in `Terminal(Failed)` is
/// reported as an error.
pub async fn run_review<B: VcsBridge>(
    bridge: B,
    generator: Arc<dyn MessageGenerator>,
    settings: &ReviewSettings,
) -> Result<Outcome> {
    let mut session = ReviewSession::new(bridge, settings);
    let mut generation = session.start().map(|diff| spawn_generation(generator, diff));

    if !session.is_terminal() {
        let mut terminal = setup_terminal()?;
        let result = main_loop(&mut terminal, &mut session, &mut generation).await;
        restore_terminal(&mut terminal)?;
        result?;
    }

    report(&mut session)
}

/// Issue the generation request as a background task with one-shot delivery
fn spawn_generation(generator: Arc<dyn MessageGenerator>, diff: String) -> Generation {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = generator.generate(&diff).await;
        if tx.send(result).is_err() {
            debug!("Generation finished after the session ended");
        }
    });
    rx
}

async fn next_generation(generation: &mut Option<Generation>) -> Result<String> {
    match generation {
        Some(rx) => rx
            .await
            .unwrap_or_else(|_| Err(anyhow!("Generation task ended without a result"))),
        None => std::future::pending().await,
    }
}

fn setup_terminal() -> Result<Tui> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info: &panic::PanicHookInfo| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        default_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn main_loop<B: VcsBridge>(
    terminal: &mut Tui,
    session: &mut ReviewSession<'_, B>,
    generation: &mut Option<Generation>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(session.settings().tick_rate);

    loop {
        let mut events = EventStream::new();
        let exit = drive(terminal, session, generation, &mut ticker, &mut events).await?;
        if exit == Exit::Finished {
            return Ok(());
        }

        // The event reader would compete with the editor for stdin.
        drop(events);
        restore_terminal(terminal)?;
        let edited = editor::edit_externally(&session.draft_text());
        enable_raw_mode()?;
        execute!(terminal.backend_mut(), EnterAlternateScreen)?;
        terminal.clear()?;
        session.apply_external_edit(edited);
    }
}

/// Feed events to the session and redraw until it ends or asks for the editor
async fn drive<Bk, S, B>(
    terminal: &mut Terminal<Bk>,
    session: &mut ReviewSession<'_, B>,
    generation: &mut Option<Generation>,
    ticker: &mut Interval,
    events: &mut S,
) -> Result<Exit>
where
    Bk: Backend,
    S: Stream<Item = io::Result<Event>> + Unpin,
    B: VcsBridge,
{
    loop {
        if session.is_dirty() {
            terminal.draw(|f| draw_ui(f, session))?;
            session.set_dirty(false);
        }

        if session.is_terminal() {
            return Ok(Exit::Finished);
        }

        // Generation is polled first so a result that is ready alongside
        // queued key presses is handled before them.
        let event = tokio::select! {
            biased;
            result = next_generation(generation) => {
                *generation = None;
                SessionEvent::Generated(result)
            }
            _ = ticker.tick() => SessionEvent::Tick,
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => SessionEvent::Key(key),
                Some(Ok(Event::Resize(width, height))) => SessionEvent::Resize { width, height },
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => return Err(anyhow!("Terminal event stream closed")),
            },
        };

        if session.handle(event) == Command::OpenEditor {
            return Ok(Exit::OpenEditor);
        }
    }
}

fn report<B: VcsBridge>(session: &mut ReviewSession<'_, B>) -> Result<Outcome> {
    match session.phase() {
        Phase::Terminal(End::Accepted) => {
            println!("{}", "Commit accepted!".green().bold());
            println!("{}", session.draft_text());
        }
        Phase::Terminal(End::Canceled) => {
            println!("{}", "Commit canceled!".yellow().bold());
        }
        Phase::Terminal(End::Failed) => {
            return Err(session
                .take_error()
                .map_or_else(|| anyhow!("Review session failed"), anyhow::Error::new));
        }
        phase => return Err(anyhow!("Review session stopped while {phase:?}")),
    }
    Ok(session.outcome())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::BridgeError;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use futures::stream;
    use ratatui::backend::TestBackend;
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingBridge {
        commits: Cell<usize>,
    }

    impl VcsBridge for CountingBridge {
        fn fetch_diff(&self) -> Result<String, BridgeError> {
            Ok(String::new())
        }

        fn commit(&self, _message: &str) -> Result<(), BridgeError> {
            self.commits.set(self.commits.get() + 1);
            Ok(())
        }

        fn fetch_log(&self) -> Result<String, BridgeError> {
            Ok("commit 1".to_string())
        }
    }

    fn key_event(code: KeyCode) -> io::Result<Event> {
        Ok(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn ctrl_event(c: char) -> io::Result<Event> {
        Ok(Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)))
    }

    fn ready(result: Result<String>) -> Option<Generation> {
        let (tx, rx) = oneshot::channel();
        assert!(tx.send(result).is_ok());
        Some(rx)
    }

    #[tokio::test]
    async fn test_ready_failure_beats_queued_keys() -> Result<()> {
        let settings = ReviewSettings::default();
        let mut session = ReviewSession::new(CountingBridge::default(), &settings);
        assert_eq!(session.start(), Some(String::new()));

        let mut terminal = Terminal::new(TestBackend::new(60, 16))?;
        let mut generation = ready(Err(anyhow!("rate limited")));
        let mut ticker = tokio::time::interval(settings.tick_rate);
        let mut events = stream::iter(vec![key_event(KeyCode::Esc), key_event(KeyCode::Enter)]);

        let exit = drive(
            &mut terminal,
            &mut session,
            &mut generation,
            &mut ticker,
            &mut events,
        )
        .await?;

        assert_eq!(exit, Exit::Finished);
        assert_eq!(session.phase(), Phase::Terminal(End::Failed));
        assert_eq!(session.outcome(), Outcome::None);
        assert_eq!(session.bridge().commits.get(), 0);
        assert!(generation.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_ready_draft_then_queued_keys_commit() -> Result<()> {
        let settings = ReviewSettings::default();
        let mut session = ReviewSession::new(CountingBridge::default(), &settings);
        session.start();

        let mut terminal = Terminal::new(TestBackend::new(60, 16))?;
        let mut generation = ready(Ok("fix: a\n\nbody".to_string()));
        let mut ticker = tokio::time::interval(settings.tick_rate);
        let mut events = stream::iter(vec![key_event(KeyCode::Enter)]);

        let exit = drive(
            &mut terminal,
            &mut session,
            &mut generation,
            &mut ticker,
            &mut events,
        )
        .await?;

        assert_eq!(exit, Exit::Finished);
        assert_eq!(session.outcome(), Outcome::Committed);
        assert_eq!(session.bridge().commits.get(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_editor_key_hands_control_back() -> Result<()> {
        let settings = ReviewSettings::default();
        let mut session = ReviewSession::new(CountingBridge::default(), &settings);
        session.start();

        let mut terminal = Terminal::new(TestBackend::new(60, 16))?;
        let mut generation = ready(Ok("fix: a".to_string()));
        let mut ticker = tokio::time::interval(settings.tick_rate);
        let mut events = stream::iter(vec![ctrl_event('e')]);

        let exit = drive(
            &mut terminal,
            &mut session,
            &mut generation,
            &mut ticker,
            &mut events,
        )
        .await?;

        assert_eq!(exit, Exit::OpenEditor);
        assert_eq!(session.phase(), Phase::Reviewing);
        Ok(())
    }
}
