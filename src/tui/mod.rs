//! TUI module
//!
//! The interactive review of a generated commit message: the session state
//! machine, its key bindings, rendering and the event loop driving it.

mod app;
pub mod editor;
pub mod keys;
pub mod session;
pub mod spinner;
pub mod ui;

pub use app::run_review;
pub use session::{
    Command, End, Outcome, Pane, Phase, ReviewSession, SessionError, SessionEvent,
};
