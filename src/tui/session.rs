//! Review session controller
//!
//! `ReviewSession` is the state machine behind the commit review screen:
//!
//! ```text
//! Loading -> Reviewing <-> Editing
//!    |          |
//!    +----------+--> Terminal(Accepted | Canceled | Failed)
//! ```
//!
//! The event loop feeds it one `SessionEvent` at a time and acts on the
//! returned `Command`. Version-control calls are made synchronously from
//! inside `handle`.

use super::keys::{self, Action};
use super::spinner::SpinnerState;
use crate::config::ReviewSettings;
use crate::core::message::{line_count, normalize_draft};
use crate::git::{BridgeError, VcsBridge};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, warn};
use thiserror::Error;
use tui_textarea::{CursorMove, TextArea};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    Accepted,
    Canceled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Reviewing,
    Editing,
    Terminal(End),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    None,
    Committed,
    Canceled,
}

/// What the instructional pane currently says
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Waiting,
    Review,
    Editing,
    Accepted,
    Canceled,
    Failed,
    EditorFailed,
}

impl Pane {
    pub const fn headline(self) -> &'static str {
        match self {
            Self::Waiting => "Waiting for response...",
            Self::Review => "Accept, cancel or edit the commit",
            Self::Editing => "Editing the commit...",
            Self::Accepted => "Commit accepted!",
            Self::Canceled => "Commit canceled!",
            Self::Failed => "Commit failed",
            Self::EditorFailed => "Editor failed, draft kept",
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("API Error: {0}")]
    Generation(String),
    #[error("Git Error: {0}")]
    Bridge(#[from] BridgeError),
    #[error("Editor Error: {0}")]
    Editor(String),
}

#[derive(Debug)]
pub enum SessionEvent {
    Key(KeyEvent),
    Resize { width: u16, height: u16 },
    Tick,
    Generated(anyhow::Result<String>),
}

/// Follow-up work the event loop performs after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    None,
    OpenEditor,
    Quit,
}

pub struct ReviewSession<'a, B: VcsBridge> {
    bridge: B,
    settings: &'a ReviewSettings,
    phase: Phase,
    draft: TextArea<'static>,
    draft_height: u16,
    pane: Pane,
    spinner: SpinnerState,
    last_error: Option<SessionError>,
    outcome: Outcome,
    dirty: bool,
}

fn draft_from(text: &str) -> TextArea<'static> {
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    if lines.is_empty() {
        TextArea::default()
    } else {
        TextArea::new(lines)
    }
}

fn height_for(text: &str) -> u16 {
    u16::try_from(line_count(text)).unwrap_or(u16::MAX)
}

impl<'a, B: VcsBridge> ReviewSession<'a, B> {
    pub fn new(bridge: B, settings: &'a ReviewSettings) -> Self {
        Self {
            bridge,
            settings,
            phase: Phase::Loading,
            draft: TextArea::default(),
            draft_height: settings.draft_height,
            pane: Pane::Waiting,
            spinner: SpinnerState::new(),
            last_error: None,
            outcome: Outcome::None,
            dirty: true,
        }
    }

    /// Fetch the staged diff the generation request is built from.
    ///
    /// Returns `None` when the session cannot proceed; the session is then
    /// already in `Terminal(Failed)`.
    pub fn start(&mut self) -> Option<String> {
        if self.phase != Phase::Loading {
            return None;
        }
        match self.bridge.fetch_diff() {
            Ok(diff) => Some(diff),
            Err(e) => {
                self.fail(e.into());
                None
            }
        }
    }

    pub fn handle(&mut self, event: SessionEvent) -> Command {
        if self.is_terminal() {
            debug!("Ignoring event after session end: {event:?}");
            return Command::Quit;
        }

        let command = match event {
            SessionEvent::Tick => {
                if self.phase == Phase::Loading {
                    self.spinner.tick();
                    self.dirty = true;
                }
                Command::None
            }
            SessionEvent::Resize { width, height } => {
                debug!("Terminal resized to {width}x{height}");
                self.dirty = true;
                Command::None
            }
            SessionEvent::Generated(result) => {
                self.on_generated(result);
                Command::None
            }
            SessionEvent::Key(key) => self.on_key(key),
        };

        if self.is_terminal() {
            Command::Quit
        } else {
            command
        }
    }

    fn on_generated(&mut self, result: anyhow::Result<String>) {
        if self.phase != Phase::Loading {
            return;
        }
        match result {
            Ok(text) => {
                let draft = normalize_draft(&text);
                debug!("Generated draft with {} lines", line_count(&draft));
                self.draft = draft_from(&draft);
                self.set_phase(Phase::Reviewing, Pane::Review);
            }
            Err(e) => self.fail(SessionError::Generation(format!("{e:#}"))),
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Command {
        let action = keys::action_for(&key);

        match self.phase {
            Phase::Loading => {
                if action == Some(Action::Cancel) {
                    self.cancel();
                }
                Command::None
            }
            Phase::Reviewing => match action {
                Some(Action::Cancel) => {
                    self.cancel();
                    Command::None
                }
                Some(Action::Accept) => {
                    self.accept();
                    Command::None
                }
                Some(Action::ToggleEdit) => {
                    self.begin_editing();
                    Command::None
                }
                Some(Action::OpenEditor) => Command::OpenEditor,
                None => {
                    self.scroll(key);
                    Command::None
                }
            },
            Phase::Editing => match action {
                Some(Action::Cancel) => {
                    self.set_phase(Phase::Reviewing, Pane::Review);
                    Command::None
                }
                Some(Action::Accept) => {
                    if self.has_room() {
                        self.draft.insert_newline();
                        self.dirty = true;
                    }
                    Command::None
                }
                Some(Action::OpenEditor) => Command::OpenEditor,
                Some(Action::ToggleEdit) | None => {
                    self.edit(key);
                    Command::None
                }
            },
            Phase::Terminal(_) => Command::Quit,
        }
    }

    fn scroll(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.draft.scroll((-1, 0)),
            KeyCode::Down => self.draft.scroll((1, 0)),
            _ => return,
        }
        self.dirty = true;
    }

    fn edit(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Left if ctrl => self.draft.move_cursor(CursorMove::WordBack),
            KeyCode::Right if ctrl => self.draft.move_cursor(CursorMove::WordForward),
            _ => {
                let before = self.draft_len();
                if self.draft.input(key) {
                    self.refuse_overflow(before);
                }
            }
        }
        self.dirty = true;
    }

    /// Roll back the last edit when it grew the draft past the limit.
    ///
    /// Any key the text area turns into an insertion (characters, tabs,
    /// ctrl+m, yank) goes through here.
    fn refuse_overflow(&mut self, before: usize) {
        let after = self.draft_len();
        if after > before && after > self.settings.char_limit {
            debug!(
                "Draft would reach {after} of {} characters, edit undone",
                self.settings.char_limit
            );
            self.draft.undo();
        }
    }

    fn has_room(&self) -> bool {
        self.draft_len() < self.settings.char_limit
    }

    fn draft_len(&self) -> usize {
        let lines = self.draft.lines();
        let chars: usize = lines.iter().map(|line| line.chars().count()).sum();
        chars + lines.len().saturating_sub(1)
    }

    fn begin_editing(&mut self) {
        self.draft.move_cursor(CursorMove::Top);
        self.draft.move_cursor(CursorMove::Head);
        self.set_phase(Phase::Editing, Pane::Editing);
    }

    fn accept(&mut self) {
        let message = self.draft_text();
        debug!("Committing draft of {} bytes", message.len());

        if let Err(e) = self.bridge.commit(&message) {
            self.fail(e.into());
            return;
        }

        match self.bridge.fetch_log() {
            Ok(log) => {
                let log = log.trim_end();
                self.draft = draft_from(log);
                self.draft_height = height_for(log);
                self.outcome = Outcome::Committed;
                self.set_phase(Phase::Terminal(End::Accepted), Pane::Accepted);
            }
            Err(e) => self.fail(e.into()),
        }
    }

    fn cancel(&mut self) {
        self.draft = TextArea::default();
        self.outcome = Outcome::Canceled;
        self.set_phase(Phase::Terminal(End::Canceled), Pane::Canceled);
    }

    fn fail(&mut self, error: SessionError) {
        warn!("Review session failed: {error}");
        let text = error.to_string();
        self.draft = draft_from(&text);
        self.draft_height = height_for(&text).max(2);
        self.last_error = Some(error);
        self.set_phase(Phase::Terminal(End::Failed), Pane::Failed);
    }

    fn set_phase(&mut self, phase: Phase, pane: Pane) {
        debug!("Review phase {:?} -> {phase:?}", self.phase);
        self.phase = phase;
        self.pane = pane;
        self.dirty = true;
    }

    /// Replace the draft with text edited outside the terminal UI.
    ///
    /// An editor failure keeps the draft and is reported in the pane only.
    pub fn apply_external_edit(&mut self, result: anyhow::Result<String>) {
        if !matches!(self.phase, Phase::Reviewing | Phase::Editing) {
            return;
        }
        match result {
            Ok(text) => {
                self.draft = draft_from(&text);
                self.last_error = None;
                self.set_phase(Phase::Reviewing, Pane::Review);
            }
            Err(e) => {
                self.last_error = Some(SessionError::Editor(format!("{e:#}")));
                self.set_phase(Phase::Reviewing, Pane::EditorFailed);
            }
        }
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Terminal(_))
    }

    /// Whether the draft buffer holds input focus
    pub const fn editing(&self) -> bool {
        matches!(self.phase, Phase::Editing)
    }

    pub const fn pane(&self) -> Pane {
        self.pane
    }

    pub fn draft_text(&self) -> String {
        self.draft.lines().join("\n")
    }

    pub const fn draft(&self) -> &TextArea<'static> {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut TextArea<'static> {
        &mut self.draft
    }

    pub const fn draft_height(&self) -> u16 {
        self.draft_height
    }

    pub const fn spinner(&self) -> &SpinnerState {
        &self.spinner
    }

    pub const fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<SessionError> {
        self.last_error.take()
    }

    pub const fn settings(&self) -> &ReviewSettings {
        self.settings
    }

    pub const fn bridge(&self) -> &B {
        &self.bridge
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }
}
